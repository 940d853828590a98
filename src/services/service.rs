// src/services/service.rs

use crate::config::{ConfigSource, Settings};
use crate::error::{ConfigError, Result};
use regex::Regex;
use serde::{Serialize, Serializer};

pub const IMAGE_CAPTCHA: &str = "image";
pub const RECAPTCHA: &str = "recaptcha";

fn serialize_patterns<S: Serializer>(patterns: &[Regex], serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_seq(patterns.iter().map(Regex::as_str))
}

/// Account, registration and OpenID behaviour from `[service]` and `[openid]`.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceSettings {
    pub active_code_live_minutes: u32,
    pub reset_passwd_code_live_minutes: u32,
    /// Set only when the mailer is enabled too.
    pub register_email_confirm: bool,
    pub email_domain_whitelist: Vec<String>,
    pub disable_registration: bool,
    pub allow_only_external_registration: bool,
    pub show_registration_button: bool,
    pub require_signin_view: bool,
    /// Set only when the mailer is enabled too.
    pub enable_notify_mail: bool,
    pub enable_reverse_proxy_auth: bool,
    pub enable_reverse_proxy_auto_register: bool,
    pub enable_reverse_proxy_email: bool,
    pub enable_captcha: bool,
    pub captcha_type: String,
    pub recaptcha_secret: String,
    pub recaptcha_sitekey: String,
    pub default_keep_email_private: bool,
    pub default_allow_create_organization: bool,
    pub enable_timetracking: bool,
    pub default_enable_timetracking: bool,
    pub default_enable_dependencies: bool,
    pub default_allow_only_contributors_to_track_time: bool,
    pub no_reply_address: String,
    pub enable_user_heatmap: bool,
    pub enable_openid_signin: bool,
    pub enable_openid_signup: bool,
    #[serde(serialize_with = "serialize_patterns")]
    pub openid_whitelist: Vec<Regex>,
    #[serde(serialize_with = "serialize_patterns")]
    pub openid_blacklist: Vec<Regex>,
}

impl ServiceSettings {
    /// True when `uri` may be used for OpenID sign-in.
    pub fn openid_uri_allowed(&self, uri: &str) -> bool {
        if !self.openid_whitelist.is_empty() {
            return self.openid_whitelist.iter().any(|re| re.is_match(uri));
        }
        !self.openid_blacklist.iter().any(|re| re.is_match(uri))
    }
}

/// Compiles a space separated list of URI patterns.
fn compile_patterns(source: &ConfigSource, key: &str) -> Result<Vec<Regex>> {
    source
        .section("openid")
        .key(key)
        .strings(' ')
        .into_iter()
        .filter(|pattern| !pattern.is_empty())
        .map(|pattern| {
            Regex::new(&pattern).map_err(|e| ConfigError::InvalidRegex {
                list: format!("openid.{key}"),
                pattern,
                source: e,
            })
        })
        .collect()
}

pub fn load_service(settings: &Settings) -> Result<ServiceSettings> {
    let source = settings.source();
    let sec = source.section("service");

    let disable_registration = sec.key("DISABLE_REGISTRATION").must_bool(false);
    let allow_only_external_registration = sec.key("ALLOW_ONLY_EXTERNAL_REGISTRATION").must_bool(false);
    let enable_timetracking = sec.key("ENABLE_TIMETRACKING").must_bool(true);

    let openid = source.section("openid");
    let enable_openid_signin = openid
        .key("ENABLE_OPENID_SIGNIN")
        .must_bool(!settings.security.install_lock);
    let enable_openid_signup = openid
        .key("ENABLE_OPENID_SIGNUP")
        .must_bool(!disable_registration && enable_openid_signin);

    Ok(ServiceSettings {
        active_code_live_minutes: sec.key("ACTIVE_CODE_LIVE_MINUTES").must_int(180),
        reset_passwd_code_live_minutes: sec.key("RESET_PASSWD_CODE_LIVE_MINUTES").must_int(180),
        register_email_confirm: false,
        email_domain_whitelist: sec.key("EMAIL_DOMAIN_WHITELIST").strings(','),
        disable_registration,
        allow_only_external_registration,
        show_registration_button: sec
            .key("SHOW_REGISTRATION_BUTTON")
            .must_bool(!(disable_registration || allow_only_external_registration)),
        require_signin_view: sec.key("REQUIRE_SIGNIN_VIEW").must_bool(false),
        enable_notify_mail: false,
        enable_reverse_proxy_auth: sec.key("ENABLE_REVERSE_PROXY_AUTHENTICATION").must_bool(false),
        enable_reverse_proxy_auto_register: sec
            .key("ENABLE_REVERSE_PROXY_AUTO_REGISTRATION")
            .must_bool(false),
        enable_reverse_proxy_email: sec.key("ENABLE_REVERSE_PROXY_EMAIL").must_bool(false),
        enable_captcha: sec.key("ENABLE_CAPTCHA").must_bool(false),
        captcha_type: sec.key("CAPTCHA_TYPE").must_string(IMAGE_CAPTCHA),
        recaptcha_secret: sec.key("RECAPTCHA_SECRET").string(),
        recaptcha_sitekey: sec.key("RECAPTCHA_SITEKEY").string(),
        default_keep_email_private: sec.key("DEFAULT_KEEP_EMAIL_PRIVATE").must_bool(false),
        default_allow_create_organization: sec.key("DEFAULT_ALLOW_CREATE_ORGANIZATION").must_bool(true),
        enable_timetracking,
        default_enable_timetracking: enable_timetracking
            && sec.key("DEFAULT_ENABLE_TIMETRACKING").must_bool(true),
        default_enable_dependencies: sec.key("DEFAULT_ENABLE_DEPENDENCIES").must_bool(true),
        default_allow_only_contributors_to_track_time: sec
            .key("DEFAULT_ALLOW_ONLY_CONTRIBUTORS_TO_TRACK_TIME")
            .must_bool(true),
        no_reply_address: sec.key("NO_REPLY_ADDRESS").must_string("noreply.example.org"),
        enable_user_heatmap: sec.key("ENABLE_USER_HEATMAP").must_bool(true),
        enable_openid_signin,
        enable_openid_signup,
        openid_whitelist: compile_patterns(source, "WHITELISTED_URIS")?,
        openid_blacklist: compile_patterns(source, "BLACKLISTED_URIS")?,
    })
}
