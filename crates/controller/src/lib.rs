pub mod aggregator;
pub mod stats;

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{watch, Mutex, Semaphore};
use tracing::{debug, info, warn};
use url::Url;

use webcrawl_core::device::device_for_worker;
use webcrawl_core::types::{CompletionStatus, LinkKind, PageResult, ResourceType, ScanConfig, WorkerStats};
use webcrawl_fetcher::Fetcher;
use webcrawl_frontier::Frontier;

use crate::aggregator::LinkAggregator;
use crate::stats::{compile_report, ReportInputs, ScanReport};

const MONITOR_INTERVAL: Duration = Duration::from_millis(250);

struct SharedState {
    results: Mutex<Vec<PageResult>>,
    worker_stats: Mutex<Vec<WorkerStats>>,
    aggregator: Mutex<LinkAggregator>,
}

/// Owns every piece of state shared across a single scan's workers: the
/// frontier, the result/link aggregators, the page-slot budget, and the
/// pause/stop signals. One `Controller` per scan.
pub struct Controller {
    config: ScanConfig,
    frontier: Arc<Frontier>,
    state: SharedState,
    page_slots: Semaphore,
    busy: AtomicUsize,
    stop: AtomicBool,
    user_cancelled: AtomicBool,
    timed_out: AtomicBool,
    pause_tx: watch::Sender<bool>,
    pause_rx: watch::Receiver<bool>,
    start: Instant,
}

impl Controller {
    pub async fn new(config: ScanConfig) -> anyhow::Result<Arc<Self>> {
        let seed = Url::parse(&config.seed_url)
            .map_err(|e| anyhow::anyhow!("invalid seed url {}: {e}", config.seed_url))?;

        let frontier = Frontier::new();
        let max_pages = config.max_pages;
        let (pause_tx, pause_rx) = watch::channel(true);

        let controller = Arc::new(Self {
            config,
            frontier: Arc::new(frontier),
            state: SharedState {
                results: Mutex::new(Vec::new()),
                worker_stats: Mutex::new(Vec::new()),
                aggregator: Mutex::new(LinkAggregator::new()),
            },
            page_slots: Semaphore::new(max_pages),
            busy: AtomicUsize::new(0),
            stop: AtomicBool::new(false),
            user_cancelled: AtomicBool::new(false),
            timed_out: AtomicBool::new(false),
            pause_tx,
            pause_rx,
            start: Instant::now(),
        });

        controller.frontier.push(seed, 0).await;

        Ok(controller)
    }

    pub fn scan_id(&self) -> &str {
        &self.config.scan_id
    }

    /// Runs the scan to completion: spawns the worker pool, the termination
    /// monitor, and the global-deadline timer, then compiles the final
    /// report once every worker has joined (or the grace period elapses).
    pub async fn run(self: Arc<Self>) -> ScanReport {
        info!(
            scan_id = %self.config.scan_id,
            seed = %self.config.seed_url,
            workers = self.config.num_workers,
            max_pages = self.config.max_pages,
            "scan starting"
        );

        {
            let mut stats = self.state.worker_stats.lock().await;
            for worker_id in 0..self.config.num_workers {
                stats.push(WorkerStats {
                    worker_id,
                    device: device_for_worker(worker_id).id.to_string(),
                    ..Default::default()
                });
            }
        }

        let monitor = tokio::spawn(Self::monitor_loop(self.clone()));
        let deadline = tokio::spawn(Self::deadline_loop(self.clone()));

        let mut worker_handles = Vec::with_capacity(self.config.num_workers);
        for worker_id in 0..self.config.num_workers {
            let controller = self.clone();
            worker_handles.push(tokio::spawn(async move {
                controller.worker_loop(worker_id).await
            }));
        }

        let join_all = futures_join_all(worker_handles);
        if tokio::time::timeout(self.config.grace_period, join_all)
            .await
            .is_err()
        {
            warn!(scan_id = %self.config.scan_id, "grace period elapsed, aborting stragglers");
        }

        self.stop.store(true, Ordering::SeqCst);
        monitor.abort();
        deadline.abort();

        let completion_status = self.completion_status().await;
        let results = self.state.results.lock().await;
        let worker_stats = self.state.worker_stats.lock().await;
        let aggregator = self.state.aggregator.lock().await;

        info!(
            scan_id = %self.config.scan_id,
            pages = results.len(),
            status = completion_status.as_str(),
            "scan finished"
        );

        compile_report(ReportInputs {
            config: &self.config,
            results: &results,
            aggregator: &aggregator,
            worker_stats: &worker_stats,
            elapsed: self.start.elapsed(),
            timed_out: self.timed_out.load(Ordering::SeqCst),
            shutdown_requested: self.user_cancelled.load(Ordering::SeqCst),
            completion_status,
            visited_count: self.frontier.visited_count(),
        })
    }

    pub fn pause(&self) {
        let _ = self.pause_tx.send(false);
    }

    pub fn resume(&self) {
        let _ = self.pause_tx.send(true);
    }

    pub fn stop(&self) {
        self.user_cancelled.store(true, Ordering::SeqCst);
        self.stop.store(true, Ordering::SeqCst);
        let _ = self.pause_tx.send(true);
    }

    pub async fn progress(&self) -> webcrawl_core::types::ScanProgress {
        let total = self.state.results.lock().await.len();
        let queue_size = self.frontier.len().await;
        let unique_links = self.state.aggregator.lock().await.len();
        let elapsed = self.start.elapsed().as_secs_f64();
        let max = self.config.max_pages;
        let remaining = (self.config.global_deadline.as_secs_f64() - elapsed).max(0.0);

        webcrawl_core::types::ScanProgress {
            total,
            max,
            queue_size,
            visited: self.frontier.visited_count(),
            unique_links,
            elapsed_time: elapsed,
            remaining_time: remaining,
            percentage: if max > 0 {
                (total as f64 / max as f64 * 100.0).min(100.0)
            } else {
                0.0
            },
            timed_out: self.timed_out.load(Ordering::SeqCst),
            is_paused: !*self.pause_rx.borrow(),
            shutdown_requested: self.user_cancelled.load(Ordering::SeqCst),
        }
    }

    async fn worker_loop(self: Arc<Self>, worker_id: usize) {
        let fetcher = match Fetcher::new(worker_id, self.config.min_delay, self.config.max_delay) {
            Ok(f) => f,
            Err(e) => {
                warn!(worker_id, error = %e, "failed to build fetcher, worker exiting");
                return;
            }
        };

        info!(worker_id, "worker started");
        let mut pause_rx = self.pause_rx.clone();

        loop {
            if self.stop.load(Ordering::SeqCst) {
                break;
            }

            while !*pause_rx.borrow() {
                if self.stop.load(Ordering::SeqCst) {
                    break;
                }
                if pause_rx.changed().await.is_err() {
                    break;
                }
            }
            if self.stop.load(Ordering::SeqCst) {
                break;
            }

            if self.start.elapsed() >= self.config.global_deadline {
                self.timed_out.store(true, Ordering::SeqCst);
                self.stop.store(true, Ordering::SeqCst);
                break;
            }

            let permit = match self.page_slots.try_acquire() {
                Ok(p) => p,
                Err(_) => break,
            };

            let entry = match self.frontier.pop_wait(self.config.queue_timeout).await {
                Some(e) => e,
                None => {
                    drop(permit);
                    if self.stop.load(Ordering::SeqCst) {
                        break;
                    }
                    continue;
                }
            };

            self.busy.fetch_add(1, Ordering::SeqCst);

            let result = fetcher
                .process(&entry.url, entry.depth, self.config.request_deadline)
                .await;
            permit.forget();

            self.commit_result(worker_id, &entry.url, result).await;

            self.busy.fetch_sub(1, Ordering::SeqCst);
        }

        info!(worker_id, "worker exited");
    }

    async fn commit_result(&self, worker_id: usize, url: &Url, result: PageResult) {
        let now = chrono::Utc::now();
        let source_url = result.url.clone();
        let depth = result.depth;
        let success = result.success;
        let links = result.links.clone();

        {
            let mut stats = self.state.worker_stats.lock().await;
            if let Some(stat) = stats.get_mut(worker_id) {
                stat.pages_processed += 1;
                stat.links_found += links.len();
                stat.total_bytes += result.page_size_bytes as u64;
                stat.total_time += result.processing_time;
                if !success {
                    stat.errors += 1;
                }
                if result.timeout_exceeded {
                    stat.timeout_errors += 1;
                }
            }
        }

        {
            let mut results = self.state.results.lock().await;
            results.push(result);
        }

        if success && depth < self.config.max_depth {
            let results_len = self.state.results.lock().await.len();
            let mut aggregator = self.state.aggregator.lock().await;
            for link in &links {
                aggregator.add(link, &source_url, now);
                if link.kind == LinkKind::Internal
                    && link.resource_type == ResourceType::Html
                    && results_len < self.config.max_pages
                {
                    if let Ok(absolute) = Url::parse(&link.url) {
                        self.frontier.push(absolute, depth + 1).await;
                    }
                }
            }
        } else {
            let mut aggregator = self.state.aggregator.lock().await;
            for link in &links {
                aggregator.add(link, &source_url, now);
            }
        }

        debug!(worker_id, url = %url, "result committed");
    }

    async fn monitor_loop(self: Arc<Self>) {
        loop {
            tokio::time::sleep(MONITOR_INTERVAL).await;

            if self.stop.load(Ordering::SeqCst) {
                return;
            }

            if self.user_cancelled.load(Ordering::SeqCst) || self.timed_out.load(Ordering::SeqCst) {
                self.stop.store(true, Ordering::SeqCst);
                return;
            }

            if self.state.results.lock().await.len() >= self.config.max_pages {
                self.stop.store(true, Ordering::SeqCst);
                return;
            }

            if self.frontier.is_empty().await && self.busy.load(Ordering::SeqCst) == 0 {
                self.stop.store(true, Ordering::SeqCst);
                return;
            }
        }
    }

    async fn deadline_loop(self: Arc<Self>) {
        tokio::time::sleep(self.config.global_deadline).await;
        self.timed_out.store(true, Ordering::SeqCst);
        self.stop.store(true, Ordering::SeqCst);
    }

    async fn completion_status(&self) -> CompletionStatus {
        if self.user_cancelled.load(Ordering::SeqCst) {
            CompletionStatus::UserCancelled
        } else if self.timed_out.load(Ordering::SeqCst) {
            CompletionStatus::TimeoutExceeded
        } else if self.state.results.lock().await.len() >= self.config.max_pages {
            CompletionStatus::MaxPagesReached
        } else if self.frontier.is_empty().await {
            CompletionStatus::QueueEmpty
        } else {
            CompletionStatus::Completed
        }
    }
}

async fn futures_join_all(handles: Vec<tokio::task::JoinHandle<()>>) {
    for handle in handles {
        let _ = handle.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn base_config(scan_id: &str, seed_url: String, base_host: String) -> ScanConfig {
        ScanConfig {
            scan_id: scan_id.to_string(),
            seed_url,
            base_host,
            max_pages: 20,
            max_depth: 3,
            num_workers: 3,
            global_deadline: Duration::from_secs(10),
            request_deadline: Duration::from_secs(5),
            queue_timeout: Duration::from_millis(200),
            grace_period: Duration::from_secs(2),
            min_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
            detailed: false,
            include_links: true,
        }
    }

    #[tokio::test]
    async fn small_site_terminates_with_queue_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path_regex("^/$"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "<html><body><a href=\"/about\">about</a></body></html>",
            ).insert_header("content-type", "text/html"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path_regex("^/about$"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<html><body>no more links</body></html>")
                    .insert_header("content-type", "text/html"),
            )
            .mount(&server)
            .await;

        let host = Url::parse(&server.uri()).unwrap().host_str().unwrap().to_string();
        let config = base_config("s1", server.uri(), host);
        let controller = Controller::new(config).await.unwrap();
        let report = controller.run().await;

        assert_eq!(report.scan_summary.completion_status, "queue_empty");
        assert_eq!(report.scan_summary.total_pages, 2);
    }

    #[tokio::test]
    async fn max_pages_cap_is_respected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "<html><body><a href=\"/a\">a</a><a href=\"/b\">b</a><a href=\"/c\">c</a></body></html>",
            ).insert_header("content-type", "text/html"))
            .mount(&server)
            .await;

        let host = Url::parse(&server.uri()).unwrap().host_str().unwrap().to_string();
        let mut config = base_config("s2", server.uri(), host);
        config.max_pages = 5;
        let controller = Controller::new(config).await.unwrap();
        let report = controller.run().await;

        assert!(report.scan_summary.total_pages <= 5);
    }
}
