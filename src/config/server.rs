//! `[server]` section: HTTP front-end, built-in SSH and LFS.

use crate::config::app::ConfigWarning;
use crate::config::environment::{resolve_against, AppPaths};
use crate::config::loader::persist_generated_secret;
use crate::config::source::ConfigSource;
use crate::config::validation::ConfigValidator;
use crate::error::{ConfigError, Result};
use crate::utils::crypto::{decode_lfs_jwt_secret, new_lfs_jwt_secret};
use crate::utils::SecureString;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

pub const DEFAULT_SSH_CIPHERS: &[&str] = &[
    "aes128-ctr",
    "aes192-ctr",
    "aes256-ctr",
    "aes128-gcm@openssh.com",
    "arcfour256",
    "arcfour128",
];

pub const DEFAULT_SSH_KEY_EXCHANGES: &[&str] = &[
    "diffie-hellman-group1-sha1",
    "diffie-hellman-group14-sha1",
    "ecdh-sha2-nistp256",
    "ecdh-sha2-nistp384",
    "ecdh-sha2-nistp521",
    "curve25519-sha256@libssh.org",
];

pub const DEFAULT_SSH_MACS: &[&str] = &[
    "hmac-sha2-256-etm@openssh.com",
    "hmac-sha2-256",
    "hmac-sha1",
    "hmac-sha1-96",
];

/// Protocol the web front-end speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    Http,
    Https,
    Fcgi,
    Unix,
}

impl Scheme {
    /// Unknown protocols fall back to `http`.
    pub fn from_config(value: &str) -> Self {
        match value {
            "https" => Self::Https,
            "fcgi" => Self::Fcgi,
            "unix" => Self::Unix,
            _ => Self::Http,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
            Self::Fcgi => "fcgi",
            Self::Unix => "unix",
        }
    }

    /// Port that may be left out of a URL for this scheme.
    pub fn well_known_port(&self) -> Option<&'static str> {
        match self {
            Self::Http => Some("80"),
            Self::Https => Some("443"),
            Self::Fcgi | Self::Unix => None,
        }
    }
}

/// Page served at `/` for signed-out visitors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LandingPage {
    Home,
    Explore,
    Organizations,
}

impl LandingPage {
    pub fn from_config(value: &str) -> Self {
        match value {
            "explore" => Self::Explore,
            "organizations" => Self::Organizations,
            _ => Self::Home,
        }
    }

    pub fn url(&self) -> &'static str {
        match self {
            Self::Home => "/",
            Self::Explore => "/explore",
            Self::Organizations => "/explore/organizations",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LetsEncryptSettings {
    pub enabled: bool,
    pub accept_tos: bool,
    pub directory: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerSettings {
    pub protocol: Scheme,
    pub domain: String,
    pub http_addr: String,
    pub http_port: String,
    /// Public URL, always ending with exactly one `/`.
    pub root_url: String,
    /// Path the application is mounted under, e.g. `/git`; empty at the root.
    pub sub_url: String,
    /// Number of `/` in `sub_url`.
    pub sub_url_depth: usize,
    pub local_url: String,
    pub cert_file: String,
    pub key_file: String,
    pub unix_socket_permission: u32,
    pub lets_encrypt: LetsEncryptSettings,
    pub redirect_other_port: bool,
    pub port_to_redirect: String,
    pub offline_mode: bool,
    pub disable_router_log: bool,
    pub static_root_path: PathBuf,
    pub app_data_path: PathBuf,
    pub enable_gzip: bool,
    pub enable_pprof: bool,
    pub pprof_data_path: PathBuf,
    pub landing_page: LandingPage,
}

/// `scheme://domain[:port]/`, leaving out the well-known port of the scheme.
pub fn default_root_url(protocol: Scheme, domain: &str, port: &str) -> String {
    let mut url = format!("{}://{}", protocol.as_str(), domain);
    if protocol.well_known_port() != Some(port) {
        url.push(':');
        url.push_str(port);
    }
    url.push('/');
    url
}

/// Collapses any number of trailing slashes into exactly one.
pub fn normalize_root_url(url: &str) -> String {
    format!("{}/", url.trim_end_matches('/'))
}

/// URL the service uses to reach itself.
pub fn default_local_url(protocol: Scheme, http_addr: &str, http_port: &str, root_url: &str) -> String {
    match protocol {
        Scheme::Unix => "http://unix/".to_string(),
        Scheme::Fcgi => root_url.to_string(),
        Scheme::Http | Scheme::Https => {
            let host = if http_addr == "0.0.0.0" { "localhost" } else { http_addr };
            format!("{}://{}:{}/", protocol.as_str(), host, http_port)
        }
    }
}

/// The `host[:port]` part of a URL exactly as written, without user info.
/// Empty when the URL has no authority.
pub(crate) fn url_authority(url: &str) -> &str {
    let rest = match url.find("://") {
        Some(i) => &url[i + 3..],
        None => match url.strip_prefix("//") {
            Some(rest) => rest,
            None => return "",
        },
    };
    let end = rest.find(|c| matches!(c, '/' | '?' | '#')).unwrap_or(rest.len());
    let authority = &rest[..end];
    match authority.rfind('@') {
        Some(at) => &authority[at + 1..],
        None => authority,
    }
}

/// Host of an authority with the port and IPv6 brackets removed. Case is kept.
fn hostname(authority: &str) -> &str {
    let mut host = authority;
    if let Some(colon) = host.rfind(':') {
        let port = &host[colon + 1..];
        if port.chars().all(|c| c.is_ascii_digit()) {
            host = &host[..colon];
        }
    }
    host.strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host)
}

/// Sub-URL, its depth and host name of a normalized root URL.
fn split_root_url(root_url: &str) -> Result<(String, usize, String)> {
    let parsed = Url::parse(root_url)
        .map_err(|e| ConfigError::invalid_value("server", "ROOT_URL", root_url, e.to_string()))?;
    let sub_url = parsed.path().trim_end_matches('/').to_string();
    let depth = sub_url.matches('/').count();
    Ok((sub_url, depth, hostname(url_authority(root_url)).to_string()))
}

pub fn load_server(
    source: &ConfigSource,
    paths: &AppPaths,
    warnings: &mut Vec<ConfigWarning>,
) -> Result<ServerSettings> {
    let sec = source.section("server");
    let work = &paths.work_path;

    let protocol = Scheme::from_config(&sec.key("PROTOCOL").string());
    let (cert_file, key_file) = if protocol == Scheme::Https {
        (sec.key("CERT_FILE").string(), sec.key("KEY_FILE").string())
    } else {
        (String::new(), String::new())
    };
    let unix_socket_permission = if protocol == Scheme::Unix {
        ConfigValidator::parse_unix_socket_permission(&sec.key("UNIX_SOCKET_PERMISSION").must_string("666"))?
    } else {
        0o666
    };

    let accept_tos = sec.key("LETSENCRYPT_ACCEPTTOS").must_bool(false);
    let mut lets_encrypt_enabled = sec.key("ENABLE_LETSENCRYPT").must_bool(false);
    if lets_encrypt_enabled && !accept_tos {
        ConfigWarning::LetsEncryptTosNotAccepted.emit(warnings);
        lets_encrypt_enabled = false;
    }
    let lets_encrypt = LetsEncryptSettings {
        enabled: lets_encrypt_enabled,
        accept_tos,
        directory: sec.key("LETSENCRYPT_DIRECTORY").must_string("https"),
        email: sec.key("LETSENCRYPT_EMAIL").must_string(""),
    };

    let mut domain = sec.key("DOMAIN").must_string("localhost");
    let http_addr = sec.key("HTTP_ADDR").must_string("0.0.0.0");
    let http_port = sec.key("HTTP_PORT").must_string("3000");

    let root_url = normalize_root_url(
        &sec.key("ROOT_URL")
            .must_string(&default_root_url(protocol, &domain, &http_port)),
    );
    let (sub_url, sub_url_depth, host) = split_root_url(&root_url)?;
    if host != domain && host.parse::<IpAddr>().is_err() {
        debug!(server.domain = %domain, root_url.host = %host, "Domain follows ROOT_URL host");
        domain = host;
    }

    let local_url = sec
        .key("LOCAL_ROOT_URL")
        .must_string(&default_local_url(protocol, &http_addr, &http_port, &root_url));

    let app_data_path = PathBuf::from(
        sec.key("APP_DATA_PATH")
            .must_string(&work.join("data").to_string_lossy()),
    );
    let pprof_data_path = resolve_against(
        work,
        sec.key("PPROF_DATA_PATH")
            .must_string(&work.join("data/tmp/pprof").to_string_lossy()),
    );

    Ok(ServerSettings {
        protocol,
        domain,
        http_addr,
        http_port,
        root_url,
        sub_url,
        sub_url_depth,
        local_url,
        cert_file,
        key_file,
        unix_socket_permission,
        lets_encrypt,
        redirect_other_port: sec.key("REDIRECT_OTHER_PORT").must_bool(false),
        port_to_redirect: sec.key("PORT_TO_REDIRECT").must_string("80"),
        offline_mode: sec.key("OFFLINE_MODE").must_bool(false),
        disable_router_log: sec.key("DISABLE_ROUTER_LOG").must_bool(false),
        static_root_path: PathBuf::from(sec.key("STATIC_ROOT_PATH").must_string(&work.to_string_lossy())),
        app_data_path,
        enable_gzip: sec.key("ENABLE_GZIP").must_bool(false),
        enable_pprof: sec.key("ENABLE_PPROF").must_bool(false),
        pprof_data_path,
        landing_page: LandingPage::from_config(&sec.key("LANDING_PAGE").must_string("home")),
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SshSettings {
    pub disabled: bool,
    pub start_builtin_server: bool,
    pub builtin_server_user: String,
    pub domain: String,
    pub port: u16,
    pub listen_host: String,
    pub listen_port: u16,
    pub root_path: PathBuf,
    pub server_ciphers: Vec<String>,
    pub server_key_exchanges: Vec<String>,
    pub server_macs: Vec<String>,
    pub key_test_path: PathBuf,
    pub keygen_path: String,
    pub authorized_keys_backup: bool,
    pub minimum_key_size_check: bool,
    /// Lower-cased algorithm name to minimum key length in bits.
    pub minimum_key_sizes: BTreeMap<String, i64>,
    pub create_authorized_keys_file: bool,
    pub expose_anonymous: bool,
}

fn create_dir(path: &Path, mode: u32) -> Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(mode);
    }
    #[cfg(not(unix))]
    let _ = mode;
    builder
        .create(path)
        .map_err(|e| ConfigError::io("create directory", path, e))
}

pub fn load_ssh(
    source: &ConfigSource,
    server: &ServerSettings,
    home_dir: &Path,
    temp_dir: &Path,
    run_user: &str,
) -> Result<SshSettings> {
    let sec = source.section("server");

    let disabled = sec.key("DISABLE_SSH").must_bool(false);
    let start_builtin_server = !disabled && sec.key("START_SSH_SERVER").must_bool(false);
    let port = sec.key("SSH_PORT").must_int(22u16);
    let root_path = PathBuf::from(
        sec.key("SSH_ROOT_PATH")
            .must_string(&home_dir.join(".ssh").to_string_lossy()),
    );
    let key_test_path = PathBuf::from(
        sec.key("SSH_KEY_TEST_PATH")
            .must_string(&temp_dir.to_string_lossy()),
    );

    if !disabled && !start_builtin_server {
        create_dir(&root_path, 0o700)?;
        create_dir(&key_test_path, 0o644)?;
    }

    let minimum_key_sizes = source
        .section("ssh.minimum_key_sizes")
        .entries()
        .filter_map(|(algorithm, value)| {
            let bits = value.trim().parse::<i64>().unwrap_or(0);
            (bits != -1).then(|| (algorithm.to_lowercase(), bits))
        })
        .collect();

    Ok(SshSettings {
        disabled,
        start_builtin_server,
        builtin_server_user: sec.key("BUILTIN_SSH_SERVER_USER").must_string(run_user),
        domain: sec.key("SSH_DOMAIN").must_string(&server.domain),
        port,
        listen_host: sec.key("SSH_LISTEN_HOST").string(),
        listen_port: sec.key("SSH_LISTEN_PORT").must_int(port),
        root_path,
        server_ciphers: sec.key("SSH_SERVER_CIPHERS").must_strings(',', DEFAULT_SSH_CIPHERS),
        server_key_exchanges: sec.key("SSH_SERVER_KEY_EXCHANGES").must_strings(',', DEFAULT_SSH_KEY_EXCHANGES),
        server_macs: sec.key("SSH_SERVER_MACS").must_strings(',', DEFAULT_SSH_MACS),
        key_test_path,
        keygen_path: sec.key("SSH_KEYGEN_PATH").must_string("ssh-keygen"),
        authorized_keys_backup: sec.key("SSH_AUTHORIZED_KEYS_BACKUP").must_bool(true),
        minimum_key_size_check: sec.key("MINIMUM_KEY_SIZE_CHECK").must_bool(false),
        minimum_key_sizes,
        create_authorized_keys_file: sec.key("SSH_CREATE_AUTHORIZED_KEYS_FILE").must_bool(true),
        expose_anonymous: sec.key("SSH_EXPOSE_ANONYMOUS").must_bool(false),
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct LfsSettings {
    pub start_server: bool,
    pub content_path: PathBuf,
    /// Base64url (unpadded) encoding of the 32 byte JWT signing key.
    pub jwt_secret: SecureString,
    #[serde(serialize_with = "crate::utils::duration::serialize")]
    pub http_auth_expiry: Duration,
}

impl LfsSettings {
    /// Raw signing key, when a valid secret is configured.
    pub fn jwt_secret_bytes(&self) -> Option<Vec<u8>> {
        decode_lfs_jwt_secret(self.jwt_secret.expose_secret())
    }
}

pub fn load_lfs(
    source: &ConfigSource,
    server: &ServerSettings,
    paths: &AppPaths,
    warnings: &mut Vec<ConfigWarning>,
) -> Result<LfsSettings> {
    let sec = source.section("server");

    let start_server = sec.key("LFS_START_SERVER").must_bool(false);
    let content_path = resolve_against(
        &paths.work_path,
        sec.key("LFS_CONTENT_PATH")
            .must_string(&server.app_data_path.join("lfs").to_string_lossy()),
    );
    let http_auth_expiry = sec
        .key("LFS_HTTP_AUTH_EXPIRY")
        .must_duration(Duration::from_secs(20 * 60));
    let mut jwt_secret = sec.key("LFS_JWT_SECRET").string();

    if start_server {
        create_dir(&content_path, 0o700)?;

        if decode_lfs_jwt_secret(&jwt_secret).is_none() {
            jwt_secret = new_lfs_jwt_secret();
            persist_generated_secret(&paths.custom_conf, "server", "LFS_JWT_SECRET", &jwt_secret, warnings)?;
            info!(config.path = %paths.custom_conf.display(), "Generated LFS JWT secret");
        }
    }

    Ok(LfsSettings {
        start_server,
        content_path,
        jwt_secret: SecureString::new(jwt_secret),
        http_auth_expiry,
    })
}
