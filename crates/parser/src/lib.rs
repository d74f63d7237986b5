pub mod html;

pub use html::{parse_html, HtmlParseResult};
