// tests/services_tests.rs

mod common;

use common::TestInstance;
use gitea_settings::config::LogLevel;
use gitea_settings::services::cache::CacheAdapter;
use gitea_settings::services::log::{load_persistence_log, LogModeConfig};
use gitea_settings::{load_services, ConfigError, ConfigWarning};
use rstest::rstest;
use std::path::PathBuf;

const TOKEN: &str = "[security]\nINTERNAL_TOKEN = fixed-token\n\n";

fn instance(ini: &str) -> TestInstance {
    TestInstance::with_config(&format!("{TOKEN}{ini}"))
}

#[test]
fn test_default_services() {
    let (_, services) = instance("").load().unwrap();

    assert!(services.mailer.is_none());
    assert_eq!(services.cache.adapter, CacheAdapter::Memory);
    assert_eq!(services.cache.interval, 60);
    assert_eq!(services.session.provider, "memory");
    assert_eq!(services.session.cookie_name, "i_like_gitea");
    assert!(services.log.use_console());
    assert_eq!(services.webhook.queue_length, 1000);
    assert!(services.service.enable_openid_signin);
    assert!(services.warnings.is_empty());
}

#[test]
fn test_mailer_from_parsed() {
    let (_, services) = instance(
        "[mailer]\nENABLED = true\nHOST = smtp.example.com:587\nFROM = \"Gitea Server\" <gitea@example.com>\n",
    )
    .load()
    .unwrap();

    let mailer = services.mailer.expect("mailer enabled");
    assert_eq!(mailer.from_name, "Gitea Server");
    assert_eq!(mailer.from_email, "gitea@example.com");
    assert_eq!(mailer.host, "smtp.example.com:587");
    assert!(!mailer.send_as_plain_text);
}

#[test]
fn test_mailer_from_quoted_name_with_comma() {
    let (_, services) = instance("[mailer]\nENABLED = true\nFROM = \"Doe, Jo\" <jo@example.com>\n")
        .load()
        .unwrap();

    let mailer = services.mailer.expect("mailer enabled");
    assert_eq!(mailer.from_name, "Doe, Jo");
    assert_eq!(mailer.from_email, "jo@example.com");
}

#[test]
fn test_mailer_from_defaults_to_user() {
    let (_, services) = instance("[mailer]\nENABLED = true\nUSER = noreply@example.com\n")
        .load()
        .unwrap();
    let mailer = services.mailer.unwrap();
    assert_eq!(mailer.from_email, "noreply@example.com");
    assert!(mailer.from_name.is_empty());
}

#[test]
fn test_invalid_mailer_from_is_fatal() {
    let err = instance("[mailer]\nENABLED = true\nFROM = not an address\n").load().unwrap_err();
    assert!(matches!(err, ConfigError::InvalidMailAddress { ref address, .. } if address == "not an address"));
}

#[test]
fn test_deprecated_html_alternative() {
    let (_, services) = instance("[mailer]\nENABLED = true\nFROM = gitea@example.com\nENABLE_HTML_ALTERNATIVE = false\n")
        .load()
        .unwrap();
    assert!(services.mailer.unwrap().send_as_plain_text);
    assert!(services.warnings.contains(&ConfigWarning::DeprecatedHtmlAlternative));
}

#[test]
fn test_sendmail_args_split() {
    let (_, services) = instance(
        "[mailer]\nENABLED = true\nFROM = gitea@example.com\nUSE_SENDMAIL = true\nSENDMAIL_ARGS = -F \"Gitea Server\" -i\n",
    )
    .load()
    .unwrap();
    assert_eq!(services.mailer.unwrap().sendmail_args, vec!["-F", "Gitea Server", "-i"]);
}

#[test]
fn test_mail_flags_without_mailer_warn() {
    let (_, services) = instance("[service]\nREGISTER_EMAIL_CONFIRM = true\nENABLE_NOTIFY_MAIL = true\n")
        .load()
        .unwrap();

    assert!(!services.service.register_email_confirm);
    assert!(!services.service.enable_notify_mail);
    assert!(services.warnings.contains(&ConfigWarning::RegisterMailWithoutMailer));
    assert!(services.warnings.contains(&ConfigWarning::NotifyMailWithoutMailer));
}

#[test]
fn test_mail_flags_with_mailer() {
    let (_, services) = instance(
        "[service]\nREGISTER_EMAIL_CONFIRM = true\nENABLE_NOTIFY_MAIL = true\n\n[mailer]\nENABLED = true\nFROM = gitea@example.com\n",
    )
    .load()
    .unwrap();
    assert!(services.service.register_email_confirm);
    assert!(services.service.enable_notify_mail);
}

#[rstest]
#[case("memory", CacheAdapter::Memory)]
#[case("redis", CacheAdapter::Redis)]
#[case("memcache", CacheAdapter::Memcache)]
fn test_cache_adapters(#[case] name: &str, #[case] expected: CacheAdapter) {
    let (_, services) = instance(&format!("[cache]\nADAPTER = {name}\nHOST = \"127.0.0.1:6379\"\n"))
        .load()
        .unwrap();
    assert_eq!(services.cache.adapter, expected);
    if expected != CacheAdapter::Memory {
        assert_eq!(services.cache.conn, "127.0.0.1:6379");
    }
}

#[test]
fn test_unknown_cache_adapter_is_fatal() {
    let err = instance("[cache]\nADAPTER = couchbase\n").load().unwrap_err();
    assert!(matches!(err, ConfigError::UnknownCacheAdapter { ref adapter } if adapter == "couchbase"));
}

#[test]
fn test_unknown_session_provider_falls_back() {
    let (_, services) = instance("[session]\nPROVIDER = couchbase\n").load().unwrap();
    assert_eq!(services.session.provider, "memory");
    assert!(services.warnings.contains(&ConfigWarning::UnknownSessionProvider {
        provider: "couchbase".into()
    }));
}

#[test]
fn test_file_session_path_absolute() {
    let instance = instance("[session]\nPROVIDER = file\nPROVIDER_CONFIG = data/sessions\n");
    let (_, services) = instance.load().unwrap();
    assert_eq!(
        PathBuf::from(&services.session.provider_config),
        instance.work_path().join("data/sessions")
    );
}

#[test]
fn test_session_cookie_path_is_sub_url() {
    let (_, services) = instance("[server]\nROOT_URL = https://example.com/git/\n").load().unwrap();
    assert_eq!(services.session.cookie_path, "/git");
}

#[test]
fn test_unknown_mode_level_is_fatal() {
    let err = instance("[log]\nMODE = console\n\n[log.console]\nLEVEL = loud\n").load().unwrap_err();
    assert!(matches!(err, ConfigError::UnknownLogLevel { ref level } if level == "loud"));
}

#[test]
fn test_mode_level_case_insensitive() {
    let (_, services) = instance("[log]\nMODE = console\n\n[log.console]\nLEVEL = warn\n").load().unwrap();
    assert_eq!(services.log.modes[0].level, LogLevel::Warn);
}

#[test]
fn test_unknown_log_mode_skipped() {
    let (_, services) = instance("[log]\nMODE = console, syslog\n").load().unwrap();
    assert_eq!(services.log.modes.len(), 1);
    assert!(services.warnings.contains(&ConfigWarning::UnknownLogMode { mode: "syslog".into() }));
}

#[test]
fn test_file_log_payload() {
    let instance = instance("[log]\nMODE = file\nLEVEL = Debug\n");
    let (settings, services) = instance.load().unwrap();

    let mode = &services.log.modes[0];
    assert_eq!(mode.name(), "file");
    let payload = mode.payload();
    let log_dir = instance.work_path().join("log");
    assert_eq!(payload["level"], LogLevel::Debug.numeric());
    assert_eq!(payload["filename"], log_dir.join("gitea.log").to_string_lossy().into_owned());
    assert_eq!(payload["maxsize"], 1u64 << 28);
    assert_eq!(payload["rotate"], true);
    assert_eq!(payload["maxdays"], 7);
    assert!(log_dir.is_dir());

    let persistence = &services.log.persistence;
    match &persistence.modes[0].config {
        LogModeConfig::File { filename, .. } => assert_eq!(filename, &log_dir.join("xorm.log")),
        other => panic!("unexpected sink: {other:?}"),
    }
    assert_eq!(persistence.level, Some(LogLevel::Debug));
    assert_eq!(load_persistence_log(&settings, true).unwrap().modes.len(), 1);
}

#[test]
fn test_persistence_log_without_console() {
    let (settings, _) = instance("[log]\nMODE = console\n").load().unwrap();
    let persistence = load_persistence_log(&settings, true).unwrap();
    assert!(persistence.is_discarded());
    assert_eq!(persistence.level, None);
}

#[test]
fn test_smtp_payload_exposes_credentials() {
    let (_, services) = instance(
        "[log]\nMODE = smtp\n\n[log.smtp]\nUSER = ops@example.com\nPASSWD = s3cret\nRECEIVERS = a@example.com, b@example.com\n",
    )
    .load()
    .unwrap();

    let payload = services.log.modes[0].payload();
    assert_eq!(payload["password"], "s3cret");
    assert_eq!(payload["sendTos"], serde_json::json!(["a@example.com", "b@example.com"]));
    let dump = serde_json::to_string(&services.log).unwrap();
    assert!(!dump.contains("s3cret"));
}

#[test]
fn test_openid_patterns() {
    let (_, services) = instance("[openid]\nWHITELISTED_URIS = ^https://id\\.example\\.com/ ^https://login\\.example\\.org/\n")
        .load()
        .unwrap();
    assert_eq!(services.service.openid_whitelist.len(), 2);
    assert!(services.service.openid_uri_allowed("https://id.example.com/alice"));
    assert!(!services.service.openid_uri_allowed("https://evil.example.net/"));
}

#[test]
fn test_invalid_openid_pattern_is_fatal() {
    let err = instance("[openid]\nBLACKLISTED_URIS = (unclosed\n").load().unwrap_err();
    assert!(matches!(err, ConfigError::InvalidRegex { ref list, .. } if list == "openid.BLACKLISTED_URIS"));
}

#[test]
fn test_openid_disabled_by_install_lock() {
    let (_, services) = TestInstance::with_config("[security]\nINSTALL_LOCK = true\nINTERNAL_TOKEN = t\n")
        .load()
        .unwrap();
    assert!(!services.service.enable_openid_signin);
    assert!(!services.service.enable_openid_signup);
}
