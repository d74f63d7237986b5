use std::time::{Duration, Instant};

use scraper::{ElementRef, Html, Selector};
use url::Url;

use webcrawl_core::normalize::{absolutize, is_rejected_href};
use webcrawl_core::{classify, ExtractedLink, LinkKind, SourceElement};

const MAX_TITLE_BYTES: usize = 5_000;
const MAX_TITLE_CHARS: usize = 200;
const MAX_ANCHOR_CHARS: usize = 100;
const MAX_EXTRACT_TIME: Duration = Duration::from_secs(5);

pub struct HtmlParseResult {
    pub title: Option<String>,
    pub links: Vec<ExtractedLink>,
    pub link_extraction_truncated: bool,
}

/// Parses `body` for a title and for every `a`/`link`/`script`/`img`/`iframe`
/// reference. `scraper::Html` is not `Send`, so callers fetching on a tokio
/// worker thread should run this inside `spawn_blocking`.
pub fn parse_html(body: &str, base_url: &Url, base_host: &str) -> HtmlParseResult {
    let title = extract_title(body);
    let document = Html::parse_document(body);
    let (links, truncated) = extract_links(&document, base_url, base_host);

    HtmlParseResult {
        title,
        links,
        link_extraction_truncated: truncated,
    }
}

fn extract_title(body: &str) -> Option<String> {
    let head_slice = &body.as_bytes()[..body.len().min(MAX_TITLE_BYTES)];
    let head = String::from_utf8_lossy(head_slice);
    let document = Html::parse_document(&head);
    let sel = title_selector();
    document
        .select(&sel)
        .next()
        .map(|el| el.text().collect::<String>())
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .map(|t| truncate_chars(&t, MAX_TITLE_CHARS))
}

fn extract_links(document: &Html, base_url: &Url, base_host: &str) -> (Vec<ExtractedLink>, bool) {
    let mut links = Vec::new();
    let start = Instant::now();
    let mut truncated = false;

    for (selector, element, attr) in link_selectors() {
        if truncated {
            break;
        }
        for el in document.select(&selector) {
            if start.elapsed() > MAX_EXTRACT_TIME {
                truncated = true;
                break;
            }
            if let Some(link) = extract_one_link(el, attr, element, base_url, base_host) {
                links.push(link);
            }
        }
    }

    (links, truncated)
}

fn extract_one_link(
    el: ElementRef,
    attr: &str,
    element: SourceElement,
    base_url: &Url,
    base_host: &str,
) -> Option<ExtractedLink> {
    let href = el.value().attr(attr)?;
    if is_rejected_href(href) {
        return None;
    }
    let absolute = absolutize(base_url, href)?;

    let kind = if absolute
        .host_str()
        .is_some_and(|h| h.eq_ignore_ascii_case(base_host))
    {
        LinkKind::Internal
    } else {
        LinkKind::External
    };
    let resource_type = classify::classify_by_extension(absolute.path());
    let anchor_text = matches!(element, SourceElement::A).then(|| {
        let text = el.text().collect::<String>();
        truncate_chars(text.trim(), MAX_ANCHOR_CHARS)
    });

    Some(ExtractedLink {
        url: absolute.to_string(),
        kind,
        resource_type,
        source_element: element,
        anchor_text,
    })
}

fn link_selectors() -> Vec<(Selector, SourceElement, &'static str)> {
    vec![
        (Selector::parse("a[href]").unwrap(), SourceElement::A, "href"),
        (
            Selector::parse("link[href]").unwrap(),
            SourceElement::Link,
            "href",
        ),
        (
            Selector::parse("script[src]").unwrap(),
            SourceElement::Script,
            "src",
        ),
        (Selector::parse("img[src]").unwrap(), SourceElement::Img, "src"),
        (
            Selector::parse("iframe[src]").unwrap(),
            SourceElement::Iframe,
            "src",
        ),
    ]
}

fn title_selector() -> Selector {
    Selector::parse("title").unwrap()
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/dir/page.html").unwrap()
    }

    #[test]
    fn extracts_title_truncated() {
        let long = "x".repeat(300);
        let html = format!("<html><head><title>{long}</title></head><body></body></html>");
        let result = parse_html(&html, &base(), "example.com");
        assert_eq!(result.title.unwrap().chars().count(), MAX_TITLE_CHARS);
    }

    #[test]
    fn missing_title_is_none() {
        let result = parse_html("<html><body>hi</body></html>", &base(), "example.com");
        assert!(result.title.is_none());
    }

    #[test]
    fn classifies_internal_and_external_links() {
        let html = r#"
            <html><body>
                <a href="/relative">Home</a>
                <a href="https://other.example/page">Other</a>
                <a href="#frag">Anchor only</a>
                <a href="javascript:void(0)">JS</a>
            </body></html>
        "#;
        let result = parse_html(html, &base(), "example.com");
        assert_eq!(result.links.len(), 2);
        assert!(result.links[0].url.starts_with("https://example.com"));
        assert_eq!(result.links[0].kind, LinkKind::Internal);
        assert_eq!(result.links[1].kind, LinkKind::External);
    }

    #[test]
    fn truncates_anchor_text_only_for_a_elements() {
        let long_text = "y".repeat(250);
        let html = format!(r#"<html><body><a href="/x">{long_text}</a></body></html>"#);
        let result = parse_html(&html, &base(), "example.com");
        let anchor = result.links[0].anchor_text.as_ref().unwrap();
        assert_eq!(anchor.chars().count(), MAX_ANCHOR_CHARS);
    }

    #[test]
    fn collects_non_anchor_source_elements_without_text() {
        let html = r#"<html><body><img src="/logo.png"></body></html>"#;
        let result = parse_html(html, &base(), "example.com");
        assert_eq!(result.links.len(), 1);
        assert!(result.links[0].anchor_text.is_none());
        assert_eq!(result.links[0].source_element, SourceElement::Img);
    }
}
