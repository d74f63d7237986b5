use std::time::{Duration, Instant};

use rand::Rng;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};
use url::Url;

use webcrawl_core::device::{device_for_worker, DEVICES};
use webcrawl_core::types::{DeviceProfile, ErrorKind, PageResult};
use webcrawl_core::{classify, CrawlError};

const MAX_REDIRECTS: usize = 5;

/// One worker's fetch-and-parse unit. Owns its own client and device
/// assignment; holds no state between calls beyond the client's connection
/// pool.
pub struct Fetcher {
    client: reqwest::Client,
    worker_id: usize,
    device: &'static DeviceProfile,
    min_delay: Duration,
    max_delay: Duration,
}

impl Fetcher {
    pub fn new(
        worker_id: usize,
        min_delay: Duration,
        max_delay: Duration,
    ) -> Result<Self, CrawlError> {
        let device = device_for_worker(worker_id);
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| CrawlError::Network(e.to_string()))?;

        Ok(Self {
            client,
            worker_id,
            device,
            min_delay,
            max_delay,
        })
    }

    /// Fetches and, if the content is HTML, parses `url`. Never returns an
    /// `Err` — every failure mode is folded into a `PageResult`.
    pub async fn process(&self, url: &Url, depth: u32, request_deadline: Duration) -> PageResult {
        let start = Instant::now();
        self.humanize_delay().await;

        let base_host = url.host_str().unwrap_or("").to_string();

        match timeout(request_deadline, self.fetch_with_redirects(url)).await {
            Err(_elapsed) => self.timeout_result(url, depth, start.elapsed()),
            Ok(Err(e)) => self.transport_error_result(url, depth, start.elapsed(), e),
            Ok(Ok((chain, status, headers, body))) => {
                self.finish(url, depth, start.elapsed(), chain, status, headers, body, &base_host)
                    .await
            }
        }
    }

    async fn humanize_delay(&self) {
        let millis = {
            let mut rng = rand::thread_rng();
            rng.gen_range(self.min_delay.as_millis() as u64..=self.max_delay.as_millis() as u64)
        };
        sleep(Duration::from_millis(millis)).await;
    }

    /// Follows up to `MAX_REDIRECTS` hops manually so the full chain can be
    /// recorded, then returns the terminal response's parts.
    async fn fetch_with_redirects(
        &self,
        url: &Url,
    ) -> Result<(Vec<String>, u16, reqwest::header::HeaderMap, bytes::Bytes), CrawlError> {
        let mut current = url.clone();
        let mut chain = Vec::new();

        for _ in 0..=MAX_REDIRECTS {
            chain.push(current.to_string());
            let resp = self
                .client
                .get(current.as_str())
                .headers(self.request_headers())
                .send()
                .await
                .map_err(|e| CrawlError::Network(e.to_string()))?;

            let status = resp.status();
            if status.is_redirection() {
                let location = resp
                    .headers()
                    .get(reqwest::header::LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .ok_or_else(|| CrawlError::Network("redirect with no Location".into()))?;
                current = current
                    .join(location)
                    .map_err(|e| CrawlError::Network(e.to_string()))?;
                continue;
            }

            let status_code = status.as_u16();
            let headers = resp.headers().clone();
            let body = resp.bytes().await.map_err(|e| CrawlError::Network(e.to_string()))?;
            return Ok((chain, status_code, headers, body));
        }

        Err(CrawlError::Network(format!(
            "exceeded {MAX_REDIRECTS} redirects"
        )))
    }

    fn request_headers(&self) -> reqwest::header::HeaderMap {
        use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

        let mut headers = HeaderMap::new();
        let mut set = |name: HeaderName, value: &str| {
            if let Ok(v) = HeaderValue::from_str(value) {
                headers.insert(name, v);
            }
        };
        set(reqwest::header::USER_AGENT, self.device.user_agent);
        set(
            reqwest::header::ACCEPT,
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        );
        set(reqwest::header::ACCEPT_LANGUAGE, self.device.accept_language);
        set(reqwest::header::ACCEPT_ENCODING, "gzip, deflate");
        set(reqwest::header::CONNECTION, "keep-alive");
        set(reqwest::header::REFERER, "https://www.google.com/");
        set(HeaderName::from_static("dnt"), "1");
        set(
            HeaderName::from_static("upgrade-insecure-requests"),
            "1",
        );
        headers
    }

    async fn finish(
        &self,
        url: &Url,
        depth: u32,
        processing_time: Duration,
        redirect_chain: Vec<String>,
        status_code: u16,
        headers: reqwest::header::HeaderMap,
        body: bytes::Bytes,
        base_host: &str,
    ) -> PageResult {
        let content_type = headers
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        if !(200..300).contains(&status_code) {
            return self.http_error_result(
                url,
                depth,
                processing_time,
                status_code,
                content_type,
                redirect_chain,
            );
        }

        let page_type = classify::resolve_page_type(content_type.as_deref(), url.path());
        let page_size_bytes = body.len();

        let (title, links) = if page_type == webcrawl_core::ResourceType::Html {
            let text = String::from_utf8_lossy(&body).to_string();
            let url_owned = url.clone();
            let host_owned = base_host.to_string();
            match tokio::task::spawn_blocking(move || {
                webcrawl_parser::parse_html(&text, &url_owned, &host_owned)
            })
            .await
            {
                Ok(result) => (result.title, result.links),
                Err(e) => {
                    warn!(url = %url, error = %e, "html parser task panicked");
                    (None, Vec::new())
                }
            }
        } else {
            (None, Vec::new())
        };

        debug!(url = %url, worker_id = self.worker_id, status_code, "fetched page");

        PageResult {
            success: true,
            url: url.to_string(),
            depth,
            status_code,
            content_type,
            page_type,
            title,
            page_size_bytes,
            processing_time: processing_time.as_secs_f64(),
            device_id: self.device.id.to_string(),
            worker_id: self.worker_id,
            error: None,
            error_kind: None,
            redirect_chain,
            timeout_exceeded: false,
            links,
        }
    }

    fn timeout_result(&self, url: &Url, depth: u32, processing_time: Duration) -> PageResult {
        PageResult {
            success: false,
            url: url.to_string(),
            depth,
            status_code: 408,
            content_type: None,
            page_type: webcrawl_core::ResourceType::Unknown,
            title: None,
            page_size_bytes: 0,
            processing_time: processing_time.as_secs_f64(),
            device_id: self.device.id.to_string(),
            worker_id: self.worker_id,
            error: Some("request timed out".to_string()),
            error_kind: Some(ErrorKind::Timeout),
            redirect_chain: Vec::new(),
            timeout_exceeded: true,
            links: Vec::new(),
        }
    }

    fn transport_error_result(
        &self,
        url: &Url,
        depth: u32,
        processing_time: Duration,
        error: CrawlError,
    ) -> PageResult {
        warn!(url = %url, worker_id = self.worker_id, %error, "fetch failed");
        PageResult {
            success: false,
            url: url.to_string(),
            depth,
            status_code: 0,
            content_type: None,
            page_type: webcrawl_core::ResourceType::Unknown,
            title: None,
            page_size_bytes: 0,
            processing_time: processing_time.as_secs_f64(),
            device_id: self.device.id.to_string(),
            worker_id: self.worker_id,
            error: Some(error.to_string()),
            error_kind: Some(ErrorKind::Transport),
            redirect_chain: Vec::new(),
            timeout_exceeded: false,
            links: Vec::new(),
        }
    }

    fn http_error_result(
        &self,
        url: &Url,
        depth: u32,
        processing_time: Duration,
        status_code: u16,
        content_type: Option<String>,
        redirect_chain: Vec<String>,
    ) -> PageResult {
        PageResult {
            success: false,
            url: url.to_string(),
            depth,
            status_code,
            content_type,
            page_type: webcrawl_core::ResourceType::Unknown,
            title: None,
            page_size_bytes: 0,
            processing_time: processing_time.as_secs_f64(),
            device_id: self.device.id.to_string(),
            worker_id: self.worker_id,
            error: Some(format!("http status {status_code}")),
            error_kind: Some(ErrorKind::HttpError),
            redirect_chain,
            timeout_exceeded: false,
            links: Vec::new(),
        }
    }
}

pub fn device_catalogue() -> &'static [DeviceProfile] {
    DEVICES
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher(worker_id: usize) -> Fetcher {
        Fetcher::new(worker_id, Duration::from_millis(1), Duration::from_millis(2)).unwrap()
    }

    #[tokio::test]
    async fn fetches_plain_html_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<html><head><title>Hi</title></head><body><a href=\"/next\">n</a></body></html>")
                    .insert_header("content-type", "text/html"),
            )
            .mount(&server)
            .await;

        let f = fetcher(0);
        let url = Url::parse(&server.uri()).unwrap();
        let result = f.process(&url, 0, Duration::from_secs(5)).await;

        assert!(result.success);
        assert_eq!(result.status_code, 200);
        assert_eq!(result.title.as_deref(), Some("Hi"));
        assert_eq!(result.links.len(), 1);
    }

    #[tokio::test]
    async fn records_redirect_chain() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/start"))
            .respond_with(ResponseTemplate::new(302).insert_header("location", "/end"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/end"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let f = fetcher(0);
        let url = Url::parse(&format!("{}/start", server.uri())).unwrap();
        let result = f.process(&url, 0, Duration::from_secs(5)).await;

        assert!(result.success);
        assert_eq!(result.redirect_chain.len(), 2);
    }

    #[tokio::test]
    async fn non_2xx_is_reported_as_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let f = fetcher(0);
        let url = Url::parse(&format!("{}/missing", server.uri())).unwrap();
        let result = f.process(&url, 0, Duration::from_secs(5)).await;

        assert!(!result.success);
        assert_eq!(result.status_code, 404);
        assert_eq!(result.error_kind, Some(ErrorKind::HttpError));
    }

    #[tokio::test]
    async fn slow_response_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(200)))
            .mount(&server)
            .await;

        let f = fetcher(0);
        let url = Url::parse(&format!("{}/slow", server.uri())).unwrap();
        let result = f.process(&url, 0, Duration::from_millis(20)).await;

        assert!(!result.success);
        assert!(result.timeout_exceeded);
        assert_eq!(result.status_code, 408);
    }
}
