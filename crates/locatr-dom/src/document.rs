//! Element-only arena over a parsed XML page source.
//!
//! Nodes are stored in document (pre-)order, so a node's descendants occupy
//! the contiguous index range `id + 1..node.end`.

use crate::error::DomError;
use crate::xpath::XPath;

#[derive(Debug, Clone, PartialEq)]
pub struct XmlNode {
    pub tag: String,
    pub attributes: Vec<(String, String)>,
    /// Non-blank direct text children, trimmed and joined by a space.
    pub text: String,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    /// One past the last descendant's index.
    pub end: usize,
}

impl XmlNode {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Whether the node has element children or non-blank text.
    pub fn has_content(&self) -> bool {
        !self.children.is_empty() || !self.text.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct XmlDocument {
    nodes: Vec<XmlNode>,
}

impl XmlDocument {
    pub fn parse(source: &str) -> Result<Self, DomError> {
        if source.trim().is_empty() {
            return Err(DomError::EmptySource);
        }
        let parsed =
            roxmltree::Document::parse(source).map_err(|e| DomError::Parse(e.to_string()))?;

        let mut nodes = Vec::new();
        push_node(&mut nodes, parsed.root_element(), None);
        Ok(Self { nodes })
    }

    pub fn root(&self) -> usize {
        0
    }

    pub fn node(&self, id: usize) -> &XmlNode {
        &self.nodes[id]
    }

    pub fn get(&self, id: usize) -> Option<&XmlNode> {
        self.nodes.get(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Ids of every node below `id`, in document order.
    pub fn descendants(&self, id: usize) -> std::ops::Range<usize> {
        id + 1..self.nodes[id].end
    }

    /// 1-based position among same-tag element siblings, or `None` when the
    /// node's tag is unique among its siblings.
    pub fn sibling_position(&self, id: usize) -> Option<usize> {
        let node = &self.nodes[id];
        let parent = node.parent?;
        let same_tag: Vec<usize> = self.nodes[parent]
            .children
            .iter()
            .copied()
            .filter(|&c| self.nodes[c].tag == node.tag)
            .collect();
        if same_tag.len() < 2 {
            return None;
        }
        same_tag.iter().position(|&c| c == id).map(|p| p + 1)
    }

    /// Evaluate an XPath expression, returning matching node ids in document order.
    pub fn find(&self, xpath: &str) -> Result<Vec<usize>, DomError> {
        Ok(XPath::parse(xpath)?.evaluate(self))
    }
}

fn push_node(nodes: &mut Vec<XmlNode>, element: roxmltree::Node<'_, '_>, parent: Option<usize>) {
    let id = nodes.len();
    let text = element
        .children()
        .filter(|c| c.is_text())
        .filter_map(|c| c.text())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    nodes.push(XmlNode {
        tag: element.tag_name().name().to_string(),
        attributes: element
            .attributes()
            .map(|a| (a.name().to_string(), a.value().to_string()))
            .collect(),
        text,
        parent,
        children: Vec::new(),
        end: id + 1,
    });

    for child in element.children().filter(|c| c.is_element()) {
        let child_id = nodes.len();
        nodes[id].children.push(child_id);
        push_node(nodes, child, Some(id));
    }
    nodes[id].end = nodes.len();
}
