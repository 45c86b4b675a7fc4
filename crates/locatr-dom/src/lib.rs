//! Page-source processing: XML parsing, XPath evaluation, optimal locator
//! synthesis, the minified element tree and prompt-sized chunking.

pub mod document;
pub mod error;
pub mod locator;
pub mod minifier;
pub mod platform;
pub mod splitter;
pub mod xpath;

pub use document::{XmlDocument, XmlNode};
pub use error::DomError;
pub use locator::{
    Candidate, LocatorGenerator, Uniqueness, MAYBE_UNIQUE_ATTRIBUTES, UNIQUE_ATTRIBUTES,
};
pub use minifier::{build_dom, build_dom_from_document, create_locator_map, minify_source};
pub use platform::{parse_bounds, Bounds, Platform};
pub use splitter::{
    split_html, HtmlSplitter, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE, HTML_SEPARATORS,
};
pub use xpath::XPath;
