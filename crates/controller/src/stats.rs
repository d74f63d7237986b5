use std::collections::HashMap;

use serde::Serialize;
use webcrawl_core::types::{CompletionStatus, LinkKind, LinkRecord, PageResult, WorkerStats};
use webcrawl_core::{classify, ScanConfig};

use crate::aggregator::LinkAggregator;

#[derive(Debug, Serialize)]
pub struct ScanReport {
    pub scan_summary: ScanSummary,
    pub links_analysis: LinksAnalysis,
    pub http_analysis: HttpAnalysis,
    pub device_analysis: DeviceAnalysis,
    pub performance: Performance,
    pub configuration: Configuration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique_links: Option<UniqueLinks>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detailed_results: Option<Vec<PageResult>>,
}

#[derive(Debug, Serialize)]
pub struct ScanSummary {
    pub scan_id: String,
    pub domain: String,
    pub total_pages: usize,
    pub successful_pages: usize,
    pub error_pages: usize,
    pub timeout_pages: usize,
    pub scan_duration_secs: f64,
    pub pages_per_second: f64,
    pub avg_response_time: f64,
    pub max_depth_reached: u32,
    pub unique_urls_visited: usize,
    pub timed_out: bool,
    pub shutdown_requested: bool,
    pub completion_status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct LinksAnalysis {
    pub total_links: usize,
    pub unique_internal: usize,
    pub unique_external: usize,
    pub by_resource_type: HashMap<String, usize>,
}

#[derive(Debug, Serialize)]
pub struct StatusEntry {
    pub count: usize,
    pub category: &'static str,
    pub percentage: f64,
}

#[derive(Debug, Serialize)]
pub struct HttpAnalysis {
    pub by_status_code: HashMap<String, StatusEntry>,
    pub by_category: HashMap<String, usize>,
    pub by_content_type: HashMap<String, usize>,
    pub redirect_chain_lengths: HashMap<String, usize>,
}

#[derive(Debug, Serialize)]
pub struct DeviceAnalysis {
    pub pages_by_device: HashMap<String, usize>,
    pub pages_by_depth: HashMap<String, usize>,
}

#[derive(Debug, Serialize)]
pub struct WorkerSummary {
    pub worker_id: usize,
    pub device: String,
    pub pages_processed: usize,
    pub links_found: usize,
    pub errors: usize,
    pub timeout_errors: usize,
    pub total_bytes_mb: f64,
    pub avg_processing_time: f64,
    pub error_rate: f64,
    pub timeout_rate: f64,
}

#[derive(Debug, Serialize)]
pub struct Performance {
    pub workers: Vec<WorkerSummary>,
    pub total_bytes_mb: f64,
}

#[derive(Debug, Serialize)]
pub struct Configuration {
    pub seed_url: String,
    pub max_pages: usize,
    pub max_depth: u32,
    pub num_workers: usize,
    pub global_deadline_secs: u64,
    pub request_deadline_secs: u64,
    pub devices_used: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct TopEntry {
    pub key: String,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct UniqueLinks {
    pub internal: Vec<LinkRecord>,
    pub external: Vec<LinkRecord>,
    pub top_internal_pages: Vec<TopEntry>,
    pub top_external_domains: Vec<TopEntry>,
}

pub struct ReportInputs<'a> {
    pub config: &'a ScanConfig,
    pub results: &'a [PageResult],
    pub aggregator: &'a LinkAggregator,
    pub worker_stats: &'a [WorkerStats],
    pub elapsed: std::time::Duration,
    pub timed_out: bool,
    pub shutdown_requested: bool,
    pub completion_status: CompletionStatus,
    pub visited_count: usize,
}

/// Deterministic pure function over the controller's final state.
pub fn compile_report(input: ReportInputs<'_>) -> ScanReport {
    let total_pages = input.results.len();
    let successful_pages = input.results.iter().filter(|r| r.success).count();
    let error_pages = total_pages - successful_pages;
    let timeout_pages = input.results.iter().filter(|r| r.timeout_exceeded).count();
    let elapsed_secs = input.elapsed.as_secs_f64();
    let avg_response_time = if total_pages > 0 {
        input.results.iter().map(|r| r.processing_time).sum::<f64>() / total_pages as f64
    } else {
        0.0
    };
    let max_depth_reached = input.results.iter().map(|r| r.depth).max().unwrap_or(0);

    let scan_summary = ScanSummary {
        scan_id: input.config.scan_id.clone(),
        domain: input.config.base_host.clone(),
        total_pages,
        successful_pages,
        error_pages,
        timeout_pages,
        scan_duration_secs: elapsed_secs,
        pages_per_second: if elapsed_secs > 0.0 {
            total_pages as f64 / elapsed_secs
        } else {
            0.0
        },
        avg_response_time,
        max_depth_reached,
        unique_urls_visited: input.visited_count,
        timed_out: input.timed_out,
        shutdown_requested: input.shutdown_requested,
        completion_status: input.completion_status.as_str(),
    };

    let links_analysis = build_links_analysis(input.aggregator);
    let http_analysis = build_http_analysis(input.results);
    let device_analysis = build_device_analysis(input.results);
    let performance = build_performance(input.worker_stats);
    let configuration = Configuration {
        seed_url: input.config.seed_url.clone(),
        max_pages: input.config.max_pages,
        max_depth: input.config.max_depth,
        num_workers: input.config.num_workers,
        global_deadline_secs: input.config.global_deadline.as_secs(),
        request_deadline_secs: input.config.request_deadline.as_secs(),
        devices_used: performance.workers.iter().map(|w| w.device.clone()).collect(),
    };

    let unique_links = if input.config.include_links {
        Some(build_unique_links(input.aggregator))
    } else {
        None
    };

    let detailed_results = if input.config.detailed {
        Some(input.results.to_vec())
    } else {
        None
    };

    ScanReport {
        scan_summary,
        links_analysis,
        http_analysis,
        device_analysis,
        performance,
        configuration,
        unique_links,
        detailed_results,
    }
}

fn build_links_analysis(aggregator: &LinkAggregator) -> LinksAnalysis {
    let mut by_resource_type: HashMap<String, usize> = HashMap::new();
    let mut unique_internal = 0;
    let mut unique_external = 0;
    let mut total_links = 0;

    for record in aggregator.records() {
        total_links += record.found_on.len();
        *by_resource_type
            .entry(record.resource_type.to_string())
            .or_insert(0) += 1;
        match record.kind {
            LinkKind::Internal => unique_internal += 1,
            LinkKind::External => unique_external += 1,
        }
    }

    LinksAnalysis {
        total_links,
        unique_internal,
        unique_external,
        by_resource_type,
    }
}

fn build_http_analysis(results: &[PageResult]) -> HttpAnalysis {
    let mut by_status_code: HashMap<u16, usize> = HashMap::new();
    let mut by_content_type: HashMap<String, usize> = HashMap::new();
    let mut redirect_chain_lengths: HashMap<String, usize> = HashMap::new();

    for r in results {
        *by_status_code.entry(r.status_code).or_insert(0) += 1;
        if let Some(ct) = &r.content_type {
            *by_content_type.entry(ct.clone()).or_insert(0) += 1;
        }
        *redirect_chain_lengths
            .entry(r.redirect_chain.len().to_string())
            .or_insert(0) += 1;
    }

    let total = results.len().max(1) as f64;
    let by_status_code = by_status_code
        .into_iter()
        .map(|(code, count)| {
            (
                code.to_string(),
                StatusEntry {
                    count,
                    category: classify::status_category(code).as_str(),
                    percentage: count as f64 / total * 100.0,
                },
            )
        })
        .collect();

    let mut by_category: HashMap<String, usize> = HashMap::new();
    for r in results {
        *by_category
            .entry(classify::status_category(r.status_code).as_str().to_string())
            .or_insert(0) += 1;
    }

    HttpAnalysis {
        by_status_code,
        by_category,
        by_content_type,
        redirect_chain_lengths,
    }
}

fn build_device_analysis(results: &[PageResult]) -> DeviceAnalysis {
    let mut pages_by_device: HashMap<String, usize> = HashMap::new();
    let mut pages_by_depth: HashMap<String, usize> = HashMap::new();

    for r in results {
        *pages_by_device.entry(r.device_id.clone()).or_insert(0) += 1;
        *pages_by_depth.entry(r.depth.to_string()).or_insert(0) += 1;
    }

    DeviceAnalysis {
        pages_by_device,
        pages_by_depth,
    }
}

fn build_performance(worker_stats: &[WorkerStats]) -> Performance {
    let workers = worker_stats
        .iter()
        .map(|w| WorkerSummary {
            worker_id: w.worker_id,
            device: w.device.clone(),
            pages_processed: w.pages_processed,
            links_found: w.links_found,
            errors: w.errors,
            timeout_errors: w.timeout_errors,
            total_bytes_mb: w.total_bytes as f64 / (1024.0 * 1024.0),
            avg_processing_time: w.avg_processing_time(),
            error_rate: w.error_rate(),
            timeout_rate: w.timeout_rate(),
        })
        .collect::<Vec<_>>();

    let total_bytes_mb = worker_stats
        .iter()
        .map(|w| w.total_bytes as f64)
        .sum::<f64>()
        / (1024.0 * 1024.0);

    Performance {
        workers,
        total_bytes_mb,
    }
}

fn build_unique_links(aggregator: &LinkAggregator) -> UniqueLinks {
    let mut internal = Vec::new();
    let mut external = Vec::new();
    for record in aggregator.records() {
        match record.kind {
            LinkKind::Internal => internal.push(record.clone()),
            LinkKind::External => external.push(record.clone()),
        }
    }
    internal.sort_by(|a, b| a.url.cmp(&b.url));
    external.sort_by(|a, b| a.url.cmp(&b.url));

    let mut top_internal_pages = internal
        .iter()
        .map(|r| TopEntry {
            key: r.url.clone(),
            count: r.found_on.len(),
        })
        .collect::<Vec<_>>();
    top_internal_pages.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));
    top_internal_pages.truncate(10);

    let mut domain_counts: HashMap<String, usize> = HashMap::new();
    for r in &external {
        if let Ok(u) = url::Url::parse(&r.url) {
            if let Some(host) = u.host_str() {
                *domain_counts.entry(host.to_string()).or_insert(0) += 1;
            }
        }
    }
    let mut top_external_domains = domain_counts
        .into_iter()
        .map(|(key, count)| TopEntry { key, count })
        .collect::<Vec<_>>();
    top_external_domains.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));
    top_external_domains.truncate(10);

    UniqueLinks {
        internal,
        external,
        top_internal_pages,
        top_external_domains,
    }
}
