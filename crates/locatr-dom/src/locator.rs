//! Optimal XPath synthesis.
//!
//! Candidates are tried as a cascade: single likely-unique attributes, then
//! attribute pairs, then maybe-unique attributes alone, then the bare tag.
//! The first candidate matching exactly the node wins. Otherwise the first
//! indexed (`(xpath)[k]`) candidate is used, and failing that a hierarchical
//! path built on the parent's optimal locator.

use crate::document::XmlDocument;
use std::collections::HashMap;
use tracing::trace;

/// Attributes likely to be unique on their own, in priority order.
pub const UNIQUE_ATTRIBUTES: &[&str] =
    &["name", "content-desc", "id", "resource-id", "accessibility-id"];

/// Attributes that are unique only sometimes, best used in pairs.
pub const MAYBE_UNIQUE_ATTRIBUTES: &[&str] = &["label", "text", "value"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Uniqueness {
    /// Matches exactly the node.
    Unique,
    /// Matches several nodes; the xpath carries the node's index.
    SemiUnique,
    /// Positional path from a unique ancestor.
    Hierarchical,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub xpath: String,
    pub uniqueness: Uniqueness,
}

impl Candidate {
    fn new(xpath: String, uniqueness: Uniqueness) -> Self {
        Self { xpath, uniqueness }
    }
}

enum Verdict {
    Rejected,
    Unique(String),
    SemiUnique(String),
}

pub struct LocatorGenerator<'a> {
    doc: &'a XmlDocument,
    memo: HashMap<usize, Candidate>,
    pairs: Vec<(&'static str, &'static str)>,
}

impl<'a> LocatorGenerator<'a> {
    pub fn new(doc: &'a XmlDocument) -> Self {
        let all: Vec<&'static str> = UNIQUE_ATTRIBUTES
            .iter()
            .chain(MAYBE_UNIQUE_ATTRIBUTES)
            .copied()
            .collect();
        let mut pairs = Vec::new();
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                pairs.push((*a, *b));
            }
        }
        Self {
            doc,
            memo: HashMap::new(),
            pairs,
        }
    }

    pub fn document(&self) -> &'a XmlDocument {
        self.doc
    }

    pub fn optimal_xpath(&mut self, id: usize) -> Candidate {
        if let Some(found) = self.memo.get(&id) {
            return found.clone();
        }
        let candidate = self.compute(id);
        self.memo.insert(id, candidate.clone());
        candidate
    }

    fn compute(&mut self, id: usize) -> Candidate {
        let doc = self.doc;
        let node = doc.node(id);
        let mut semi_unique: Option<String> = None;

        let cases: [Vec<Vec<&'static str>>; 3] = [
            singles(UNIQUE_ATTRIBUTES),
            self.pairs.iter().map(|(a, b)| vec![*a, *b]).collect(),
            singles(MAYBE_UNIQUE_ATTRIBUTES),
        ];

        for case in &cases {
            for attrs in case {
                let Some(xpath) = self.attribute_xpath(id, attrs) else {
                    continue;
                };
                match self.judge(id, xpath) {
                    Verdict::Unique(xpath) => return Candidate::new(xpath, Uniqueness::Unique),
                    Verdict::SemiUnique(xpath) => {
                        semi_unique.get_or_insert(xpath);
                    }
                    Verdict::Rejected => {}
                }
            }
        }

        if let Verdict::Unique(xpath) = self.judge(id, format!("//{}", node.tag)) {
            let xpath = if node.parent.is_none() {
                format!("/{}", node.tag)
            } else {
                xpath
            };
            return Candidate::new(xpath, Uniqueness::Unique);
        }

        if let Some(xpath) = semi_unique {
            return Candidate::new(xpath, Uniqueness::SemiUnique);
        }

        let step = self.step(id);
        let xpath = match node.parent {
            Some(parent) => format!("{}{}", self.optimal_xpath(parent).xpath, step),
            None => step,
        };
        Candidate::new(xpath, Uniqueness::Hierarchical)
    }

    /// Absolute positional path from the root, e.g. `/hierarchy/node[2]/node`.
    pub fn hierarchy_xpath(&self, id: usize) -> String {
        let mut steps = Vec::new();
        let mut current = Some(id);
        while let Some(node_id) = current {
            steps.push(self.step(node_id));
            current = self.doc.node(node_id).parent;
        }
        steps.reverse();
        steps.concat()
    }

    fn step(&self, id: usize) -> String {
        let tag = &self.doc.node(id).tag;
        match self.doc.sibling_position(id) {
            Some(k) => format!("/{}[{}]", tag, k),
            None => format!("/{}", tag),
        }
    }

    fn attribute_xpath(&self, id: usize, attrs: &[&str]) -> Option<String> {
        let node = self.doc.node(id);
        let mut conditions = Vec::with_capacity(attrs.len());
        for attr in attrs {
            let value = node.attribute(attr).filter(|v| !v.is_empty())?;
            conditions.push(format!("@{}={}", attr, quote(value)?));
        }
        Some(format!("//{}[{}]", node.tag, conditions.join(" and ")))
    }

    fn judge(&self, id: usize, xpath: String) -> Verdict {
        let matches = match self.doc.find(&xpath) {
            Ok(matches) => matches,
            Err(e) => {
                trace!(xpath = %xpath, error = %e, "Skipping candidate");
                return Verdict::Rejected;
            }
        };
        match matches.iter().position(|&m| m == id) {
            Some(_) if matches.len() == 1 => Verdict::Unique(xpath),
            Some(idx) => Verdict::SemiUnique(format!("({})[{}]", xpath, idx + 1)),
            None => Verdict::Rejected,
        }
    }
}

fn singles(attrs: &[&'static str]) -> Vec<Vec<&'static str>> {
    attrs.iter().map(|a| vec![*a]).collect()
}

/// XPath 1.0 string literal, or `None` when the value holds both quote kinds.
fn quote(value: &str) -> Option<String> {
    if !value.contains('"') {
        Some(format!("\"{}\"", value))
    } else if !value.contains('\'') {
        Some(format!("'{}'", value))
    } else {
        None
    }
}
