use std::collections::VecDeque;
use std::sync::Arc;

use dashmap::DashSet;
use tokio::sync::{Mutex, Notify};
use tokio::time::{timeout, Duration};
use tracing::debug;
use url::Url;

/// One not-yet-fetched unit of work.
#[derive(Debug, Clone)]
pub struct FrontierEntry {
    pub url: Url,
    pub depth: u32,
}

/// FIFO work queue plus the visited-set it shares the atomic check-and-insert
/// with. A URL is marked visited in the same step it is enqueued, so two
/// workers discovering the same link concurrently can never both enqueue it.
pub struct Frontier {
    queue: Mutex<VecDeque<FrontierEntry>>,
    visited: DashSet<String>,
    notify: Notify,
}

impl Default for Frontier {
    fn default() -> Self {
        Self::new()
    }
}

impl Frontier {
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            visited: DashSet::new(),
            notify: Notify::new(),
        }
    }

    /// Atomically check-and-insert `url` into the visited set; if it was not
    /// already present, enqueue it at `depth` and return `true`.
    pub async fn push(&self, url: Url, depth: u32) -> bool {
        let key = url.as_str().to_string();
        if !self.visited.insert(key) {
            return false;
        }
        self.queue
            .lock()
            .await
            .push_back(FrontierEntry { url, depth });
        self.notify.notify_one();
        true
    }

    /// Pops the next entry, waiting up to `wait` if the queue is currently
    /// empty. Returns `None` on timeout.
    pub async fn pop_wait(&self, wait: Duration) -> Option<FrontierEntry> {
        loop {
            {
                let mut queue = self.queue.lock().await;
                if let Some(entry) = queue.pop_front() {
                    return Some(entry);
                }
            }
            if timeout(wait, self.notify.notified()).await.is_err() {
                return None;
            }
        }
    }

    pub async fn len(&self) -> usize {
        self.queue.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.queue.lock().await.is_empty()
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }
}

pub fn shared() -> Arc<Frontier> {
    Arc::new(Frontier::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[tokio::test]
    async fn push_dedups_same_url() {
        let f = Frontier::new();
        assert!(f.push(u("https://example.com/"), 0).await);
        assert!(!f.push(u("https://example.com/"), 0).await);
        assert_eq!(f.len().await, 1);
        assert_eq!(f.visited_count(), 1);
    }

    #[tokio::test]
    async fn pop_wait_returns_fifo_order() {
        let f = Frontier::new();
        f.push(u("https://example.com/a"), 0).await;
        f.push(u("https://example.com/b"), 1).await;

        let first = f.pop_wait(Duration::from_millis(50)).await.unwrap();
        assert_eq!(first.url.path(), "/a");
        let second = f.pop_wait(Duration::from_millis(50)).await.unwrap();
        assert_eq!(second.url.path(), "/b");
    }

    #[tokio::test]
    async fn pop_wait_times_out_on_empty_queue() {
        let f = Frontier::new();
        let popped = f.pop_wait(Duration::from_millis(20)).await;
        assert!(popped.is_none());
    }

    #[tokio::test]
    async fn concurrent_push_of_same_url_enqueues_once() {
        let f = Arc::new(Frontier::new());
        let mut handles = Vec::new();
        for _ in 0..16 {
            let f = f.clone();
            handles.push(tokio::spawn(async move {
                f.push(u("https://example.com/dup"), 0).await
            }));
        }
        let mut successes = 0;
        for h in handles {
            if h.await.unwrap() {
                successes += 1;
            }
        }
        assert_eq!(successes, 1);
        assert_eq!(f.len().await, 1);
        debug!("frontier dedup check passed");
    }
}
