//! Minified DOM snapshot shared between plugins, the tree builder and the
//! retrieval modes.

use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::LazyLock;

/// Element id -> candidate locators, best candidate first.
pub type LocatorMap = HashMap<String, Vec<String>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LocatorType {
    #[serde(rename = "css selector")]
    Css,
    #[serde(rename = "xpath")]
    XPath,
}

impl fmt::Display for LocatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocatorType::Css => f.write_str("css selector"),
            LocatorType::XPath => f.write_str("xpath"),
        }
    }
}

/// One node of a minified element tree.
///
/// `id` is the content hash of the node's canonical locator, so the same
/// locator always yields the same id across captures.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ElementSpec {
    pub id: String,
    pub tag_name: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub children: Vec<ElementSpec>,
}

impl ElementSpec {
    /// Serialize the subtree into the compact markup fed to rerankers and LLMs.
    ///
    /// The element's own `id` attribute carries the content hash; a native
    /// `id` attribute is emitted as `native-id` so the two never collide.
    pub fn repr(&self) -> String {
        let mut out = String::new();
        self.write_repr(&mut out);
        out
    }

    fn write_repr(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.tag_name);
        for (key, value) in &self.attributes {
            let key = if key == "id" { "native-id" } else { key.as_str() };
            out.push(' ');
            out.push_str(key);
            out.push_str("=\"");
            out.push_str(&escape_markup(value));
            out.push('"');
        }
        out.push_str(" id=\"");
        out.push_str(&self.id);
        out.push_str("\">");
        out.push_str(&escape_markup(&self.text));
        for child in &self.children {
            child.write_repr(out);
        }
        out.push_str("</");
        out.push_str(&self.tag_name);
        out.push('>');
    }

    /// Follow a path of child indices from this node.
    pub fn at_path(&self, path: &[usize]) -> Option<&ElementSpec> {
        let mut node = self;
        for &idx in path {
            node = node.children.get(idx)?;
        }
        Some(node)
    }

    /// Number of nodes in the subtree, including this one.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(ElementSpec::node_count).sum::<usize>()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomMetadata {
    pub locator_type: LocatorType,
    pub locator_map: LocatorMap,
}

/// A single DOM capture: the minified tree plus how to address its nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dom {
    pub root_element: ElementSpec,
    pub metadata: DomMetadata,
}

impl Dom {
    /// Candidate locators for an element id, if the id is known.
    pub fn locators(&self, id: &str) -> Option<&[String]> {
        self.metadata
            .locator_map
            .get(id)
            .map(Vec::as_slice)
            .filter(|l| !l.is_empty())
    }
}

/// Deterministic element id derived from a locator string.
pub fn generate_unique_id(locator: &str) -> String {
    let digest = Sha256::digest(locator.as_bytes());
    hex::encode(&digest[..16])
}

static FIRST_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<[A-Za-z_][^<>]*?\sid="([^"]*)""#).unwrap());

/// First non-empty `id` attribute found on an element tag inside a fragment of
/// serialized DOM. Fragments are chunk slices and need not be well formed.
pub fn extract_first_unique_id(fragment: &str) -> Option<String> {
    FIRST_ID_RE
        .captures_iter(fragment)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str())
        .find(|id| !id.is_empty())
        .map(str::to_string)
}

fn escape_markup(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(id: &str, tag: &str, text: &str) -> ElementSpec {
        ElementSpec {
            id: id.into(),
            tag_name: tag.into(),
            text: text.into(),
            ..Default::default()
        }
    }

    #[test]
    fn repr_renames_native_id_and_escapes() {
        let mut el = leaf("h1", "button", "Save & <exit>");
        el.attributes.insert("id".into(), "b1".into());
        el.attributes.insert("label".into(), "say \"hi\"".into());
        assert_eq!(
            el.repr(),
            r#"<button native-id="b1" label="say &quot;hi&quot;" id="h1">Save &amp; &lt;exit&gt;</button>"#
        );
    }

    #[test]
    fn first_id_skips_native_ids() {
        let fragment = r#"v native-id="x" id="aaa">text</div><span id="bbb"></span>"#;
        // Leading fragment has no opening '<', so the first tag-borne id wins.
        assert_eq!(extract_first_unique_id(fragment).as_deref(), Some("bbb"));
        assert_eq!(extract_first_unique_id("<p>no ids</p>"), None);
    }

    #[test]
    fn unique_id_is_stable() {
        let a = generate_unique_id("//button[@id=\"b1\"]");
        let b = generate_unique_id("//button[@id=\"b1\"]");
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
        assert_ne!(a, generate_unique_id("//button[@id=\"b2\"]"));
    }

    #[test]
    fn at_path_walks_children() {
        let mut root = leaf("r", "hierarchy", "");
        let mut mid = leaf("m", "group", "");
        mid.children.push(leaf("c", "button", "Go"));
        root.children.push(leaf("a", "text", ""));
        root.children.push(mid);
        assert_eq!(root.at_path(&[1, 0]).map(|e| e.id.as_str()), Some("c"));
        assert!(root.at_path(&[2]).is_none());
        assert_eq!(root.node_count(), 4);
    }
}
