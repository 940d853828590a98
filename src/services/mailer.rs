// src/services/mailer.rs

use crate::config::{ConfigWarning, Settings};
use crate::error::{ConfigError, Result};
use crate::services::service::ServiceSettings;
use crate::utils::{parse_address, SecureString};
use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone, Serialize)]
pub struct MailerSettings {
    pub queue_length: usize,
    pub name: String,
    pub from: String,
    pub from_name: String,
    pub from_email: String,
    pub send_as_plain_text: bool,

    pub host: String,
    pub user: String,
    pub passwd: SecureString,
    pub disable_helo: bool,
    pub helo_hostname: String,
    pub skip_verify: bool,
    pub use_certificate: bool,
    pub cert_file: String,
    pub key_file: String,
    pub is_tls_enabled: bool,

    pub use_sendmail: bool,
    pub sendmail_path: String,
    pub sendmail_args: Vec<String>,
}

/// Reads `[mailer]`; `None` unless `ENABLED` is set.
pub fn load_mailer(settings: &Settings, warnings: &mut Vec<ConfigWarning>) -> Result<Option<MailerSettings>> {
    let sec = settings.source().section("mailer");
    if !sec.key("ENABLED").must_bool(false) {
        return Ok(None);
    }

    let user = sec.key("USER").string();
    let from = sec.key("FROM").must_string(&user);

    let mut send_as_plain_text = sec.key("SEND_AS_PLAIN_TEXT").must_bool(false);
    if sec.has_key("ENABLE_HTML_ALTERNATIVE") {
        ConfigWarning::DeprecatedHtmlAlternative.emit(warnings);
        send_as_plain_text = !sec.key("ENABLE_HTML_ALTERNATIVE").must_bool(false);
    }

    let mailbox = parse_address(&from).map_err(|reason| ConfigError::InvalidMailAddress {
        address: from.clone(),
        reason,
    })?;

    let use_sendmail = sec.key("USE_SENDMAIL").must_bool(false);
    let mut sendmail_args = Vec::new();
    if use_sendmail {
        match shell_words::split(&sec.key("SENDMAIL_ARGS").string()) {
            Ok(args) => sendmail_args = args,
            Err(e) => ConfigWarning::SendmailArgs { message: e.to_string() }.emit(warnings),
        }
    }

    let mailer = MailerSettings {
        queue_length: sec.key("SEND_BUFFER_LEN").must_int(100),
        name: sec.key("NAME").must_string(&settings.app_name),
        from_name: mailbox.name,
        from_email: mailbox.address,
        from,
        send_as_plain_text,
        host: sec.key("HOST").string(),
        user,
        passwd: SecureString::new(sec.key("PASSWD").string()),
        disable_helo: sec.key("DISABLE_HELO").must_bool(false),
        helo_hostname: sec.key("HELO_HOSTNAME").string(),
        skip_verify: sec.key("SKIP_VERIFY").must_bool(false),
        use_certificate: sec.key("USE_CERTIFICATE").must_bool(false),
        cert_file: sec.key("CERT_FILE").string(),
        key_file: sec.key("KEY_FILE").string(),
        is_tls_enabled: sec.key("IS_TLS_ENABLED").must_bool(false),
        use_sendmail,
        sendmail_path: sec.key("SENDMAIL_PATH").must_string("sendmail"),
        sendmail_args,
    };
    info!(mailer.from = %mailer.from_email, mailer.sendmail = mailer.use_sendmail, "Mail Service Enabled");
    Ok(Some(mailer))
}

/// Turns on registration confirmation mails when both the flag and the mailer are on.
pub fn apply_register_mail(
    settings: &Settings,
    service: &mut ServiceSettings,
    mailer: Option<&MailerSettings>,
    warnings: &mut Vec<ConfigWarning>,
) {
    if !settings.source().section("service").key("REGISTER_EMAIL_CONFIRM").must_bool(false) {
        return;
    }
    if mailer.is_none() {
        ConfigWarning::RegisterMailWithoutMailer.emit(warnings);
        return;
    }
    service.register_email_confirm = true;
    info!("Register Mail Service Enabled");
}

/// Turns on notification mails when both the flag and the mailer are on.
pub fn apply_notify_mail(
    settings: &Settings,
    service: &mut ServiceSettings,
    mailer: Option<&MailerSettings>,
    warnings: &mut Vec<ConfigWarning>,
) {
    if !settings.source().section("service").key("ENABLE_NOTIFY_MAIL").must_bool(false) {
        return;
    }
    if mailer.is_none() {
        ConfigWarning::NotifyMailWithoutMailer.emit(warnings);
        return;
    }
    service.enable_notify_mail = true;
    info!("Notify Mail Service Enabled");
}
