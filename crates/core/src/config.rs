use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub scan_defaults: ScanDefaultsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScanDefaultsConfig {
    #[serde(default = "default_max_pages")]
    pub default_max_pages: usize,
    #[serde(default = "default_max_depth")]
    pub default_max_depth: u32,
    #[serde(default = "default_workers")]
    pub default_workers: usize,
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
    #[serde(default = "default_timeout_secs")]
    pub default_timeout_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub default_request_timeout_secs: u64,
    #[serde(default = "default_queue_timeout_secs")]
    pub queue_timeout_secs: u64,
    #[serde(default = "default_grace_period_secs")]
    pub grace_period_secs: u64,
    #[serde(default = "default_min_delay_ms")]
    pub min_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_max_pages() -> usize {
    50
}
fn default_max_depth() -> u32 {
    3
}
fn default_workers() -> usize {
    5
}
fn default_max_workers() -> usize {
    10
}
fn default_timeout_secs() -> u64 {
    100
}
fn default_request_timeout_secs() -> u64 {
    15
}
fn default_queue_timeout_secs() -> u64 {
    2
}
fn default_grace_period_secs() -> u64 {
    5
}
fn default_min_delay_ms() -> u64 {
    500
}
fn default_max_delay_ms() -> u64 {
    2000
}
