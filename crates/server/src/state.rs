use std::sync::Arc;

use dashmap::DashMap;
use webcrawl_controller::Controller;
use webcrawl_core::AppConfig;

/// Process-wide scan registry: `scan_id -> Controller`. Entries are inserted
/// when a scan starts and removed once it completes, so the control/progress
/// endpoints can only ever reach a live scan.
#[derive(Clone)]
pub struct AppState {
    pub active_scans: Arc<DashMap<String, Arc<Controller>>>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            active_scans: Arc::new(DashMap::new()),
            config: Arc::new(config),
        }
    }
}
