use crate::config::Settings;
use serde::Serialize;

pub const WEBHOOK_TYPES: &[&str] = &["gitea", "gogs", "slack", "discord", "dingtalk"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebhookSettings {
    pub queue_length: usize,
    /// Seconds.
    pub deliver_timeout: u64,
    pub skip_tls_verify: bool,
    pub types: Vec<String>,
    pub paging_num: usize,
}

pub fn load_webhook(settings: &Settings) -> WebhookSettings {
    let sec = settings.source().section("webhook");
    WebhookSettings {
        queue_length: sec.key("QUEUE_LENGTH").must_int(1000),
        deliver_timeout: sec.key("DELIVER_TIMEOUT").must_int(5),
        skip_tls_verify: sec.key("SKIP_TLS_VERIFY").must_bool(false),
        types: WEBHOOK_TYPES.iter().map(|t| t.to_string()).collect(),
        paging_num: sec.key("PAGING_NUM").must_int(10),
    }
}
