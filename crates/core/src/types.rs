use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Parameters a caller supplied for one scan, resolved to concrete bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    pub scan_id: String,
    pub seed_url: String,
    pub base_host: String,
    pub max_pages: usize,
    pub max_depth: u32,
    pub num_workers: usize,
    pub global_deadline: Duration,
    pub request_deadline: Duration,
    pub queue_timeout: Duration,
    pub grace_period: Duration,
    pub min_delay: Duration,
    pub max_delay: Duration,
    pub detailed: bool,
    pub include_links: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceType {
    Html,
    Css,
    Javascript,
    Image,
    Video,
    Audio,
    Archive,
    Document,
    Executable,
    Data,
    Config,
    Font,
    Unknown,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Html => "html",
            ResourceType::Css => "css",
            ResourceType::Javascript => "javascript",
            ResourceType::Image => "image",
            ResourceType::Video => "video",
            ResourceType::Audio => "audio",
            ResourceType::Archive => "archive",
            ResourceType::Document => "document",
            ResourceType::Executable => "executable",
            ResourceType::Data => "data",
            ResourceType::Config => "config",
            ResourceType::Font => "font",
            ResourceType::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusCategory {
    Informational,
    Success,
    Redirect,
    ClientError,
    ServerError,
    Unknown,
}

impl StatusCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusCategory::Informational => "informational",
            StatusCategory::Success => "success",
            StatusCategory::Redirect => "redirect",
            StatusCategory::ClientError => "client_error",
            StatusCategory::ServerError => "server_error",
            StatusCategory::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    Internal,
    External,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceElement {
    A,
    Link,
    Script,
    Img,
    Iframe,
}

impl SourceElement {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceElement::A => "a",
            SourceElement::Link => "link",
            SourceElement::Script => "script",
            SourceElement::Img => "img",
            SourceElement::Iframe => "iframe",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Timeout,
    Transport,
    HttpError,
}

/// One page-citing discovery, before it is folded into the scan-wide aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedLink {
    pub url: String,
    pub kind: LinkKind,
    pub resource_type: ResourceType,
    pub source_element: SourceElement,
    pub anchor_text: Option<String>,
}

/// Immutable record of one URL fetch attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResult {
    pub success: bool,
    pub url: String,
    pub depth: u32,
    pub status_code: u16,
    pub content_type: Option<String>,
    pub page_type: ResourceType,
    pub title: Option<String>,
    pub page_size_bytes: usize,
    pub processing_time: f64,
    pub device_id: String,
    pub worker_id: usize,
    pub error: Option<String>,
    pub error_kind: Option<ErrorKind>,
    pub redirect_chain: Vec<String>,
    pub timeout_exceeded: bool,
    pub links: Vec<ExtractedLink>,
}

/// A distinct link aggregated across the whole scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkRecord {
    pub url: String,
    pub kind: LinkKind,
    pub resource_type: ResourceType,
    pub source_element: SourceElement,
    pub anchor_text: Option<String>,
    pub first_seen_at: chrono::DateTime<chrono::Utc>,
    pub found_on: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkerStats {
    pub worker_id: usize,
    pub device: String,
    pub pages_processed: usize,
    pub links_found: usize,
    pub errors: usize,
    pub timeout_errors: usize,
    pub total_bytes: u64,
    pub total_time: f64,
}

impl WorkerStats {
    pub fn error_rate(&self) -> f64 {
        let denom = (self.pages_processed + self.errors).max(1) as f64;
        self.errors as f64 / denom * 100.0
    }

    pub fn timeout_rate(&self) -> f64 {
        let denom = (self.pages_processed + self.timeout_errors).max(1) as f64;
        self.timeout_errors as f64 / denom * 100.0
    }

    pub fn avg_processing_time(&self) -> f64 {
        if self.pages_processed == 0 {
            0.0
        } else {
            self.total_time / self.pages_processed as f64
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionStatus {
    Completed,
    QueueEmpty,
    MaxPagesReached,
    TimeoutExceeded,
    UserCancelled,
}

impl CompletionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompletionStatus::Completed => "completed",
            CompletionStatus::QueueEmpty => "queue_empty",
            CompletionStatus::MaxPagesReached => "max_pages_reached",
            CompletionStatus::TimeoutExceeded => "timeout_exceeded",
            CompletionStatus::UserCancelled => "user_cancelled",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceProfile {
    pub id: &'static str,
    pub name: &'static str,
    pub user_agent: &'static str,
    pub accept_language: &'static str,
    pub platform: &'static str,
}

/// A point-in-time read of a running scan, as served by the progress endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanProgress {
    pub total: usize,
    pub max: usize,
    pub queue_size: usize,
    pub visited: usize,
    pub unique_links: usize,
    pub elapsed_time: f64,
    pub remaining_time: f64,
    pub percentage: f64,
    pub timed_out: bool,
    pub is_paused: bool,
    pub shutdown_requested: bool,
}
