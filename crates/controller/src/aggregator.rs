use std::collections::HashMap;

use webcrawl_core::types::{ExtractedLink, LinkRecord};

/// Scan-wide distinct-link accumulator. Keyed by the (already normalized)
/// absolute URL, so two pages citing the same link fold into one record.
#[derive(Default)]
pub struct LinkAggregator {
    by_url: HashMap<String, LinkRecord>,
}

impl LinkAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, link: &ExtractedLink, source_url: &str, now: chrono::DateTime<chrono::Utc>) {
        match self.by_url.get_mut(&link.url) {
            Some(existing) => {
                if !existing.found_on.iter().any(|u| u == source_url) {
                    existing.found_on.push(source_url.to_string());
                }
            }
            None => {
                self.by_url.insert(
                    link.url.clone(),
                    LinkRecord {
                        url: link.url.clone(),
                        kind: link.kind,
                        resource_type: link.resource_type,
                        source_element: link.source_element,
                        anchor_text: link.anchor_text.clone(),
                        first_seen_at: now,
                        found_on: vec![source_url.to_string()],
                    },
                );
            }
        }
    }

    pub fn len(&self) -> usize {
        self.by_url.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_url.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &LinkRecord> {
        self.by_url.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use webcrawl_core::types::{LinkKind, ResourceType, SourceElement};

    fn link(url: &str) -> ExtractedLink {
        ExtractedLink {
            url: url.to_string(),
            kind: LinkKind::Internal,
            resource_type: ResourceType::Html,
            source_element: SourceElement::A,
            anchor_text: Some("text".to_string()),
        }
    }

    #[test]
    fn dedups_citing_pages() {
        let mut agg = LinkAggregator::new();
        let now = chrono::Utc::now();
        agg.add(&link("https://example.com/a"), "https://example.com/", now);
        agg.add(&link("https://example.com/a"), "https://example.com/", now);
        agg.add(&link("https://example.com/a"), "https://example.com/other", now);

        assert_eq!(agg.len(), 1);
        let record = agg.records().next().unwrap();
        assert_eq!(record.found_on.len(), 2);
    }
}
