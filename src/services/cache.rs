// src/services/cache.rs

use crate::config::environment::resolve_against;
use crate::config::{ConfigWarning, Settings};
use crate::error::{ConfigError, Result};
use serde::Serialize;
use std::time::Duration;
use tracing::info;

pub const CACHE_ADAPTERS: &[&str] = &["memory", "redis", "memcache"];
pub const SESSION_PROVIDERS: &[&str] = &["memory", "file", "redis", "mysql"];
pub const CSRF_COOKIE_NAME: &str = "_csrf";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheAdapter {
    Memory,
    Redis,
    Memcache,
}

impl CacheAdapter {
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "memory" => Ok(Self::Memory),
            "redis" => Ok(Self::Redis),
            "memcache" => Ok(Self::Memcache),
            other => Err(ConfigError::UnknownCacheAdapter {
                adapter: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheSettings {
    pub adapter: CacheAdapter,
    /// GC interval of the memory adapter, in seconds.
    pub interval: u64,
    /// Connection string of the redis and memcache adapters.
    pub conn: String,
    #[serde(serialize_with = "crate::utils::duration::serialize")]
    pub ttl: Duration,
}

pub fn load_cache(settings: &Settings) -> Result<CacheSettings> {
    let sec = settings.source().section("cache");
    let adapter = CacheAdapter::from_name(sec.key("ADAPTER").must_string("memory").trim())?;

    let (interval, conn) = match adapter {
        CacheAdapter::Memory => (sec.key("INTERVAL").must_int(60), String::new()),
        CacheAdapter::Redis | CacheAdapter::Memcache => {
            (0, sec.key("HOST").string().trim_matches(|c| c == '"' || c == ' ').to_string())
        }
    };

    let cache = CacheSettings {
        adapter,
        interval,
        conn,
        ttl: sec.key("ITEM_TTL").must_duration(Duration::from_secs(16 * 3600)),
    };
    info!(cache.adapter = ?cache.adapter, "Cache Service Enabled");
    Ok(cache)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSettings {
    pub provider: String,
    pub provider_config: String,
    pub cookie_name: String,
    /// Sub-URL of the application.
    pub cookie_path: String,
    pub secure: bool,
    /// Seconds.
    pub gc_interval: u64,
    /// Seconds.
    pub max_lifetime: u64,
    pub csrf_cookie_name: String,
}

/// Unknown providers fall back to `memory` with a warning.
pub fn load_session(settings: &Settings, warnings: &mut Vec<ConfigWarning>) -> Result<SessionSettings> {
    let sec = settings.source().section("session");

    let configured = sec.key("PROVIDER").must_string("memory");
    let provider = if SESSION_PROVIDERS.contains(&configured.as_str()) {
        configured
    } else {
        ConfigWarning::UnknownSessionProvider { provider: configured }.emit(warnings);
        "memory".to_string()
    };

    let mut provider_config = sec
        .key("PROVIDER_CONFIG")
        .must_string(&settings.server.app_data_path.join("sessions").to_string_lossy())
        .trim_matches(|c| c == '"' || c == ' ')
        .to_string();
    if provider == "file" {
        provider_config = resolve_against(&settings.paths.work_path, &provider_config)
            .to_string_lossy()
            .into_owned();
    }

    let session = SessionSettings {
        provider,
        provider_config,
        cookie_name: sec.key("COOKIE_NAME").must_string("i_like_gitea"),
        cookie_path: settings.server.sub_url.clone(),
        secure: sec.key("COOKIE_SECURE").must_bool(false),
        gc_interval: sec.key("GC_INTERVAL_TIME").must_int(86_400),
        max_lifetime: sec.key("SESSION_LIFE_TIME").must_int(86_400),
        csrf_cookie_name: CSRF_COOKIE_NAME.to_string(),
    };
    info!(session.provider = %session.provider, "Session Service Enabled");
    Ok(session)
}
