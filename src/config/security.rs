use crate::config::app::ConfigWarning;
use crate::config::loader::persist_generated_secret;
use crate::config::source::ConfigSource;
use crate::error::Result;
use crate::utils::crypto::new_internal_token;
use crate::utils::SecureString;
use serde::Serialize;
use std::path::Path;
use tracing::info;

pub const DEFAULT_SECRET_KEY: &str = "!#@FDEWREWR&*(";

#[derive(Debug, Clone, Serialize)]
pub struct SecuritySettings {
    pub install_lock: bool,
    pub secret_key: SecureString,
    pub login_remember_days: u32,
    pub cookie_username: String,
    pub cookie_remember_name: String,
    pub reverse_proxy_auth_user: String,
    pub reverse_proxy_auth_email: String,
    pub min_password_length: usize,
    pub import_local_paths: bool,
    pub disable_git_hooks: bool,
    /// Token internal callers (hooks, serv) present to the web API.
    pub internal_token: SecureString,
}

/// Reads `[security]`, generating and persisting `INTERNAL_TOKEN` when it is empty.
pub fn load_security(
    source: &ConfigSource,
    custom_conf: &Path,
    warnings: &mut Vec<ConfigWarning>,
) -> Result<SecuritySettings> {
    let sec = source.section("security");

    let mut internal_token = sec.key("INTERNAL_TOKEN").string();
    if internal_token.is_empty() {
        internal_token = new_internal_token();
        persist_generated_secret(custom_conf, "security", "INTERNAL_TOKEN", &internal_token, warnings)?;
        info!(config.path = %custom_conf.display(), "Generated internal token");
    }

    Ok(SecuritySettings {
        install_lock: sec.key("INSTALL_LOCK").must_bool(false),
        secret_key: SecureString::new(sec.key("SECRET_KEY").must_string(DEFAULT_SECRET_KEY)),
        login_remember_days: sec.key("LOGIN_REMEMBER_DAYS").must_int(7),
        cookie_username: sec.key("COOKIE_USERNAME").must_string("gitea_awesome"),
        cookie_remember_name: sec.key("COOKIE_REMEMBER_NAME").must_string("gitea_incredible"),
        reverse_proxy_auth_user: sec
            .key("REVERSE_PROXY_AUTHENTICATION_USER")
            .must_string("X-WEBAUTH-USER"),
        reverse_proxy_auth_email: sec
            .key("REVERSE_PROXY_AUTHENTICATION_EMAIL")
            .must_string("X-WEBAUTH-EMAIL"),
        min_password_length: sec.key("MIN_PASSWORD_LENGTH").must_int(6),
        import_local_paths: sec.key("IMPORT_LOCAL_PATHS").must_bool(false),
        disable_git_hooks: sec.key("DISABLE_GIT_HOOKS").must_bool(false),
        internal_token: SecureString::new(internal_token),
    })
}
