use crate::types::{ResourceType, StatusCategory};

/// Extension lookup table, matching the original crawler's resource map.
fn extension_category(ext: &str) -> ResourceType {
    match ext {
        "html" | "htm" | "php" | "asp" | "aspx" | "jsp" | "do" | "action" | "cgi" => {
            ResourceType::Html
        }
        "css" => ResourceType::Css,
        "js" | "jsx" | "ts" | "tsx" => ResourceType::Javascript,
        "jpg" | "jpeg" | "png" | "gif" | "bmp" | "svg" | "webp" | "ico" | "tiff" | "tif"
        | "heic" | "heif" => ResourceType::Image,
        "mp4" | "avi" | "mov" | "wmv" | "flv" | "mkv" | "webm" | "m4v" => ResourceType::Video,
        "mp3" | "wav" | "ogg" | "flac" | "aac" | "m4a" | "wma" => ResourceType::Audio,
        "zip" | "rar" | "7z" | "tar" | "gz" | "bz2" | "xz" | "tgz" => ResourceType::Archive,
        "pdf" | "doc" | "docx" | "xls" | "xlsx" | "ppt" | "pptx" | "txt" | "rtf" | "odt"
        | "ods" | "odp" | "csv" | "tsv" | "xml" => ResourceType::Document,
        "exe" | "msi" | "dmg" | "pkg" | "deb" | "rpm" | "apk" | "ipa" => ResourceType::Executable,
        "json" | "yaml" | "yml" | "sql" | "db" | "sqlite" | "mdb" => ResourceType::Data,
        "ini" | "cfg" | "conf" | "properties" => ResourceType::Config,
        "ttf" | "otf" | "woff" | "woff2" | "eot" => ResourceType::Font,
        _ => ResourceType::Unknown,
    }
}

/// Classifies a URL path by its trailing extension. A trailing-slash or
/// extensionless path is treated as `html` (it's a route, not a file).
pub fn classify_by_extension(path: &str) -> ResourceType {
    if path.is_empty() || path.ends_with('/') {
        return ResourceType::Html;
    }
    let last_segment = path.rsplit('/').next().unwrap_or(path);
    match last_segment.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => extension_category(&ext.to_ascii_lowercase()),
        _ => ResourceType::Html,
    }
}

/// Classifies by an HTTP `Content-Type` header value (prefix match, ignoring
/// any `; charset=...` suffix).
pub fn classify_by_content_type(content_type: &str) -> ResourceType {
    let ct = content_type.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
    if ct.starts_with("text/html") {
        ResourceType::Html
    } else if ct.starts_with("text/css") {
        ResourceType::Css
    } else if ct.starts_with("application/javascript") || ct.starts_with("text/javascript") {
        ResourceType::Javascript
    } else if ct.starts_with("application/json") {
        ResourceType::Data
    } else if ct.starts_with("application/pdf") {
        ResourceType::Document
    } else if ct.starts_with("application/zip") {
        ResourceType::Archive
    } else if ct.starts_with("image/") {
        ResourceType::Image
    } else if ct.starts_with("video/") {
        ResourceType::Video
    } else if ct.starts_with("audio/") {
        ResourceType::Audio
    } else if ct.starts_with("application/xml") || ct.starts_with("text/xml") {
        ResourceType::Document
    } else if ct.starts_with("text/plain") {
        ResourceType::Document
    } else {
        ResourceType::Unknown
    }
}

/// Content-Type first, falling back to the URL's extension when the header
/// doesn't resolve to anything specific.
pub fn resolve_page_type(content_type: Option<&str>, path: &str) -> ResourceType {
    match content_type.map(classify_by_content_type) {
        Some(ResourceType::Unknown) | None => classify_by_extension(path),
        Some(resolved) => resolved,
    }
}

pub fn status_category(code: u16) -> StatusCategory {
    match code {
        100..=199 => StatusCategory::Informational,
        200..=299 => StatusCategory::Success,
        300..=399 => StatusCategory::Redirect,
        400..=499 => StatusCategory::ClientError,
        500..=599 => StatusCategory::ServerError,
        _ => StatusCategory::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_maps_known_types() {
        assert_eq!(classify_by_extension("/app.js"), ResourceType::Javascript);
        assert_eq!(classify_by_extension("/style.css"), ResourceType::Css);
        assert_eq!(classify_by_extension("/photo.JPEG"), ResourceType::Image);
        assert_eq!(classify_by_extension("/report.pdf"), ResourceType::Document);
        assert_eq!(classify_by_extension("/data.json"), ResourceType::Data);
    }

    #[test]
    fn extensionless_or_trailing_slash_is_html() {
        assert_eq!(classify_by_extension("/"), ResourceType::Html);
        assert_eq!(classify_by_extension(""), ResourceType::Html);
        assert_eq!(classify_by_extension("/blog/post"), ResourceType::Html);
        assert_eq!(classify_by_extension("/blog/"), ResourceType::Html);
    }

    #[test]
    fn unknown_extension_is_unknown() {
        assert_eq!(classify_by_extension("/file.xyz123"), ResourceType::Unknown);
    }

    #[test]
    fn content_type_prefix_matches() {
        assert_eq!(
            classify_by_content_type("text/html; charset=utf-8"),
            ResourceType::Html
        );
        assert_eq!(classify_by_content_type("image/png"), ResourceType::Image);
        assert_eq!(
            classify_by_content_type("application/octet-stream"),
            ResourceType::Unknown
        );
    }

    #[test]
    fn resolve_falls_back_to_extension() {
        assert_eq!(
            resolve_page_type(Some("application/octet-stream"), "/archive.zip"),
            ResourceType::Archive
        );
        assert_eq!(
            resolve_page_type(Some("text/html"), "/archive.zip"),
            ResourceType::Html
        );
        assert_eq!(resolve_page_type(None, "/page"), ResourceType::Html);
    }

    #[test]
    fn status_categories() {
        assert_eq!(status_category(101), StatusCategory::Informational);
        assert_eq!(status_category(200), StatusCategory::Success);
        assert_eq!(status_category(301), StatusCategory::Redirect);
        assert_eq!(status_category(404), StatusCategory::ClientError);
        assert_eq!(status_category(503), StatusCategory::ServerError);
        assert_eq!(status_category(0), StatusCategory::Unknown);
    }
}
