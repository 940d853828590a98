// tests/server_tests.rs

mod common;

use common::TestInstance;
use gitea_settings::config::server::{default_root_url, normalize_root_url, Scheme, DEFAULT_SSH_CIPHERS, DEFAULT_SSH_MACS};
use gitea_settings::config::source::ConfigSource;
use gitea_settings::ConfigError;
use proptest::prelude::*;
use rstest::rstest;

#[rstest]
#[case("http", "3000", "http://localhost:3000/")]
#[case("http", "80", "http://localhost/")]
#[case("https", "443", "https://localhost/")]
#[case("https", "3000", "https://localhost:3000/")]
#[case("fcgi", "80", "fcgi://localhost:80/")]
#[case("unix", "3000", "unix://localhost:3000/")]
fn test_default_root_url_per_protocol(#[case] protocol: &str, #[case] port: &str, #[case] expected: &str) {
    let instance = TestInstance::with_config(&format!("[server]\nPROTOCOL = {protocol}\nHTTP_PORT = {port}\n"));
    let settings = instance.load_core().unwrap();

    assert_eq!(settings.server.protocol, Scheme::from_config(protocol));
    assert_eq!(settings.server.root_url, expected);
    assert_eq!(default_root_url(settings.server.protocol, "localhost", port), expected);
}

#[rstest]
#[case("http", "http://localhost:3000/")]
#[case("unix", "http://unix/")]
#[case("fcgi", "fcgi://localhost:3000/")]
fn test_local_url_per_protocol(#[case] protocol: &str, #[case] expected: &str) {
    let instance = TestInstance::with_config(&format!("[server]\nPROTOCOL = {protocol}\n"));
    let settings = instance.load_core().unwrap();
    assert_eq!(settings.server.local_url, expected);
}

proptest! {
    #[test]
    fn prop_root_url_has_single_trailing_slash(base in "[a-z:/.]{0,20}", slashes in 0usize..5) {
        let url = format!("{base}{}", "/".repeat(slashes));
        let normalized = normalize_root_url(&url);
        prop_assert!(normalized.ends_with('/'));
        prop_assert!(!normalized.ends_with("//"));
        prop_assert_eq!(normalized, normalize_root_url(&base));
    }
}

#[test]
fn test_root_url_trailing_slashes_collapsed() {
    let instance = TestInstance::with_config("[server]\nROOT_URL = https://git.example.com///\n");
    let settings = instance.load_core().unwrap();
    assert_eq!(settings.server.root_url, "https://git.example.com/");
}

#[test]
fn test_domain_follows_root_url_host() {
    let instance = TestInstance::with_config("[server]\nDOMAIN = localhost\nROOT_URL = https://git.example.com/\n");
    let settings = instance.load_core().unwrap();
    assert_eq!(settings.server.domain, "git.example.com");
}

#[test]
fn test_domain_keeps_root_url_host_case() {
    let instance =
        TestInstance::with_config("[server]\nDOMAIN = Git.Example.COM\nROOT_URL = http://Git.Example.COM:3000/\n");
    let settings = instance.load_core().unwrap();
    assert_eq!(settings.server.domain, "Git.Example.COM");
}

#[test]
fn test_domain_kept_for_ip_root_url() {
    let instance = TestInstance::with_config("[server]\nDOMAIN = code.local\nROOT_URL = http://192.168.1.10:3000/\n");
    let settings = instance.load_core().unwrap();
    assert_eq!(settings.server.domain, "code.local");
}

#[rstest]
#[case("https://example.com/", "", 0)]
#[case("https://example.com/git", "/git", 1)]
#[case("https://example.com/git/sub/", "/git/sub", 2)]
fn test_sub_url_and_depth(#[case] root_url: &str, #[case] sub_url: &str, #[case] depth: usize) {
    let instance = TestInstance::with_config(&format!("[server]\nROOT_URL = {root_url}\n"));
    let settings = instance.load_core().unwrap();
    assert_eq!(settings.server.sub_url, sub_url);
    assert_eq!(settings.server.sub_url_depth, depth);
}

#[test]
fn test_unix_socket_permission_parsed_as_octal() {
    let instance = TestInstance::with_config("[server]\nPROTOCOL = unix\nUNIX_SOCKET_PERMISSION = 666\n");
    let settings = instance.load_core().unwrap();
    assert_eq!(settings.server.unix_socket_permission, 438);
}

#[rstest]
#[case("778")]
#[case("1000")]
#[case("rw-rw-rw-")]
fn test_unix_socket_permission_rejected(#[case] permission: &str) {
    let instance =
        TestInstance::with_config(&format!("[server]\nPROTOCOL = unix\nUNIX_SOCKET_PERMISSION = {permission}\n"));
    let err = instance.load_core().unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "UNIX_SOCKET_PERMISSION"));
}

#[test]
fn test_unix_socket_permission_ignored_for_http() {
    let instance = TestInstance::with_config("[server]\nUNIX_SOCKET_PERMISSION = 9999\n");
    let settings = instance.load_core().unwrap();
    assert_eq!(settings.server.unix_socket_permission, 0o666);
}

#[test]
fn test_lfs_secret_generated_and_persisted() {
    let instance = TestInstance::with_config("[server]\nLFS_START_SERVER = true\n");
    let settings = instance.load_core().unwrap();

    let secret = settings.lfs.jwt_secret.expose_secret().to_string();
    assert_eq!(settings.lfs.jwt_secret_bytes().map(|b| b.len()), Some(32));
    assert!(settings.lfs.content_path.is_dir());

    let saved = ConfigSource::from_file(&instance.custom_conf()).unwrap();
    assert_eq!(saved.section("server").key("LFS_JWT_SECRET").string(), secret);
    assert!(saved.section("server").key("LFS_START_SERVER").must_bool(false));

    let reloaded = instance.load_core().unwrap();
    assert_eq!(reloaded.lfs.jwt_secret.expose_secret(), secret);
}

#[test]
fn test_lfs_secret_untouched_when_server_disabled() {
    let instance = TestInstance::with_config("[security]\nINTERNAL_TOKEN = fixed\n");
    let settings = instance.load_core().unwrap();
    assert!(settings.lfs.jwt_secret.is_empty());
    assert!(!instance.read_config().contains("LFS_JWT_SECRET"));
}

#[test]
fn test_lets_encrypt_requires_tos() {
    let instance = TestInstance::with_config("[server]\nENABLE_LETSENCRYPT = true\n");
    let settings = instance.load_core().unwrap();
    assert!(!settings.server.lets_encrypt.enabled);
    assert!(settings
        .warnings
        .iter()
        .any(|w| matches!(w, gitea_settings::ConfigWarning::LetsEncryptTosNotAccepted)));
}

#[test]
fn test_ssh_defaults_follow_server() {
    let instance = TestInstance::with_config("[server]\nDOMAIN = git.example.com\nSSH_PORT = 2222\n");
    let settings = instance.load_core().unwrap();
    let ssh = &settings.ssh;

    assert!(!ssh.disabled);
    assert!(!ssh.start_builtin_server);
    assert_eq!(ssh.domain, "git.example.com");
    assert_eq!(ssh.port, 2222);
    assert_eq!(ssh.listen_port, 2222);
    assert_eq!(ssh.builtin_server_user, "git");
    assert_eq!(ssh.server_ciphers, DEFAULT_SSH_CIPHERS);
    assert_eq!(ssh.server_macs, DEFAULT_SSH_MACS);
    assert_eq!(ssh.root_path, instance.work_path().join("home/.ssh"));
    assert!(ssh.root_path.is_dir());
    assert!(instance.work_path().join("tmp").is_dir());
}

#[test]
fn test_ssh_explicit_domain_and_listen_port() {
    let instance = TestInstance::with_config(
        "[server]\nDOMAIN = git.example.com\nSSH_DOMAIN = ssh.example.com\nSSH_PORT = 22\nSSH_LISTEN_PORT = 2022\n",
    );
    let ssh = instance.load_core().unwrap().ssh;
    assert_eq!(ssh.domain, "ssh.example.com");
    assert_eq!(ssh.port, 22);
    assert_eq!(ssh.listen_port, 2022);
}

#[test]
fn test_disable_ssh_forces_builtin_server_off() {
    let instance = TestInstance::with_config("[server]\nDISABLE_SSH = true\nSTART_SSH_SERVER = true\n");
    let ssh = instance.load_core().unwrap().ssh;

    assert!(ssh.disabled);
    assert!(!ssh.start_builtin_server);
    assert!(!instance.work_path().join("home/.ssh").exists());
}

#[test]
fn test_builtin_ssh_server_skips_key_directories() {
    let instance = TestInstance::with_config("[server]\nSTART_SSH_SERVER = true\n");
    let ssh = instance.load_core().unwrap().ssh;

    assert!(ssh.start_builtin_server);
    assert!(!ssh.root_path.exists());
}

#[test]
fn test_ssh_algorithm_overrides() {
    let instance = TestInstance::with_config(
        "[server]\nSSH_SERVER_CIPHERS = aes256-ctr, chacha20-poly1305@openssh.com\nSSH_SERVER_KEY_EXCHANGES = curve25519-sha256@libssh.org\nSSH_SERVER_MACS = hmac-sha2-256\n",
    );
    let ssh = instance.load_core().unwrap().ssh;

    assert_eq!(ssh.server_ciphers, vec!["aes256-ctr", "chacha20-poly1305@openssh.com"]);
    assert_eq!(ssh.server_key_exchanges, vec!["curve25519-sha256@libssh.org"]);
    assert_eq!(ssh.server_macs, vec!["hmac-sha2-256"]);
}

#[test]
fn test_minimum_key_sizes_exclude_disabled_algorithms() {
    let instance = TestInstance::with_config(
        "[server]\nMINIMUM_KEY_SIZE_CHECK = true\n\n[ssh.minimum_key_sizes]\nED25519 = 256\nRSA = 2048\nDSA = -1\n",
    );
    let ssh = instance.load_core().unwrap().ssh;

    assert!(ssh.minimum_key_size_check);
    assert_eq!(ssh.minimum_key_sizes.get("ed25519"), Some(&256));
    assert_eq!(ssh.minimum_key_sizes.get("rsa"), Some(&2048));
    assert!(!ssh.minimum_key_sizes.contains_key("dsa"));
}
