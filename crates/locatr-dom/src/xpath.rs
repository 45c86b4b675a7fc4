//! The XPath subset produced by the locator generator.
//!
//! ```text
//! xpath     := group? step*
//! group     := '(' xpath ')' predicate+
//! step      := ('/' | '//') (name | '*') predicate*
//! name      := XML name, any script
//! predicate := '[' integer ']' | '[' attr ('and' attr)* ']'
//! attr      := '@' name '=' ('"' .. '"' | '\'' .. '\'')
//! ```
//!
//! Positional predicates inside a step count per parent, as in XPath 1.0,
//! while a positional predicate on a parenthesized group counts over the
//! whole node set.

use crate::document::XmlDocument;
use crate::error::DomError;
use pest::error::InputLocation;
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Predicate {
    Position(usize),
    Attributes(Vec<(String, String)>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Child,
    Descendant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Step {
    axis: Axis,
    /// `None` matches any tag.
    name: Option<String>,
    predicates: Vec<Predicate>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Group {
    inner: Box<XPath>,
    predicates: Vec<Predicate>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XPath {
    group: Option<Group>,
    steps: Vec<Step>,
}

impl XPath {
    pub fn parse(source: &str) -> Result<Self, DomError> {
        let mut pairs =
            XPathParser::parse(Rule::xpath_input, source).map_err(|e| from_pest(source, e))?;
        let xpath = pairs
            .next()
            .and_then(|input| input.into_inner().find(|p| p.as_rule() == Rule::xpath))
            .ok_or_else(|| invalid(source, "empty expression"))?;
        build_xpath(source, xpath)
    }

    /// Matching node ids in document order.
    pub fn evaluate(&self, doc: &XmlDocument) -> Vec<usize> {
        if doc.is_empty() {
            return Vec::new();
        }

        // `None` stands for the document node above the root element.
        let mut context: Vec<Option<usize>> = match &self.group {
            Some(group) => {
                let nodes = group.inner.evaluate(doc);
                apply_predicates(doc, nodes, &group.predicates)
                    .into_iter()
                    .map(Some)
                    .collect()
            }
            None => vec![None],
        };

        for step in &self.steps {
            let mut matched = BTreeSet::new();
            for parent_group in step_candidates(doc, &context, step) {
                matched.extend(apply_predicates(doc, parent_group, &step.predicates));
            }
            context = matched.into_iter().map(Some).collect();
        }

        context.into_iter().flatten().collect()
    }
}

/// Candidate nodes for a step, grouped by parent so positions count per parent.
fn step_candidates(doc: &XmlDocument, context: &[Option<usize>], step: &Step) -> Vec<Vec<usize>> {
    let matches_name = |id: usize| match &step.name {
        Some(name) => doc.node(id).tag == *name,
        None => true,
    };

    let mut parents: BTreeSet<Option<usize>> = BTreeSet::new();
    for &ctx in context {
        match (step.axis, ctx) {
            (Axis::Child, _) => {
                parents.insert(ctx);
            }
            (Axis::Descendant, None) => {
                parents.insert(None);
                parents.extend((0..doc.len()).map(Some));
            }
            (Axis::Descendant, Some(id)) => {
                parents.insert(Some(id));
                parents.extend(doc.descendants(id).map(Some));
            }
        }
    }

    parents
        .into_iter()
        .map(|parent| {
            let children: Vec<usize> = match parent {
                None => vec![doc.root()],
                Some(id) => doc.node(id).children.clone(),
            };
            children.into_iter().filter(|&c| matches_name(c)).collect::<Vec<_>>()
        })
        .filter(|group| !group.is_empty())
        .collect()
}

fn apply_predicates(
    doc: &XmlDocument,
    mut nodes: Vec<usize>,
    predicates: &[Predicate],
) -> Vec<usize> {
    for predicate in predicates {
        nodes = match predicate {
            Predicate::Position(n) => nodes.get(n - 1).copied().into_iter().collect(),
            Predicate::Attributes(conditions) => nodes
                .into_iter()
                .filter(|&id| {
                    let node = doc.node(id);
                    conditions
                        .iter()
                        .all(|(name, value)| node.attribute(name) == Some(value.as_str()))
                })
                .collect(),
        };
    }
    nodes
}

#[derive(Parser)]
#[grammar = "xpath.pest"]
struct XPathParser;

fn invalid(source: &str, reason: impl Into<String>) -> DomError {
    DomError::InvalidXPath {
        xpath: source.to_string(),
        reason: reason.into(),
    }
}

fn from_pest(source: &str, err: pest::error::Error<Rule>) -> DomError {
    let offset = match err.location {
        InputLocation::Pos(pos) => pos,
        InputLocation::Span((start, _)) => start,
    };
    invalid(source, format!("{} at offset {}", err.variant.message(), offset))
}

fn build_xpath(source: &str, pair: Pair<'_, Rule>) -> Result<XPath, DomError> {
    let mut group = None;
    let mut steps = Vec::new();
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::group => group = Some(build_group(source, inner)?),
            Rule::step => steps.push(build_step(source, inner)?),
            rule => return Err(invalid(source, format!("unexpected {:?}", rule))),
        }
    }
    Ok(XPath { group, steps })
}

fn build_group(source: &str, pair: Pair<'_, Rule>) -> Result<Group, DomError> {
    let mut inner = None;
    let mut predicates = Vec::new();
    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::xpath => inner = Some(build_xpath(source, part)?),
            Rule::predicate => predicates.push(build_predicate(source, part)?),
            rule => return Err(invalid(source, format!("unexpected {:?} in group", rule))),
        }
    }
    let inner = inner.ok_or_else(|| invalid(source, "empty group"))?;
    Ok(Group {
        inner: Box::new(inner),
        predicates,
    })
}

fn build_step(source: &str, pair: Pair<'_, Rule>) -> Result<Step, DomError> {
    let mut axis = Axis::Child;
    let mut name = None;
    let mut predicates = Vec::new();
    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::axis if part.as_str() == "//" => axis = Axis::Descendant,
            Rule::axis | Rule::wildcard => {}
            Rule::name => name = Some(part.as_str().to_string()),
            Rule::predicate => predicates.push(build_predicate(source, part)?),
            rule => return Err(invalid(source, format!("unexpected {:?} in step", rule))),
        }
    }
    Ok(Step {
        axis,
        name,
        predicates,
    })
}

fn build_predicate(source: &str, pair: Pair<'_, Rule>) -> Result<Predicate, DomError> {
    let part = pair
        .into_inner()
        .next()
        .ok_or_else(|| invalid(source, "empty predicate"))?;
    match part.as_rule() {
        Rule::position => part
            .as_str()
            .parse()
            .map(Predicate::Position)
            .map_err(|_| invalid(source, format!("position {} out of range", part.as_str()))),
        Rule::conditions => part
            .into_inner()
            .map(|condition| build_condition(source, condition))
            .collect::<Result<Vec<_>, _>>()
            .map(Predicate::Attributes),
        rule => Err(invalid(source, format!("unexpected {:?} in predicate", rule))),
    }
}

fn build_condition(source: &str, pair: Pair<'_, Rule>) -> Result<(String, String), DomError> {
    let mut parts = pair.into_inner();
    let (Some(name), Some(literal)) = (parts.next(), parts.next()) else {
        return Err(invalid(source, "incomplete attribute condition"));
    };
    // An empty literal may yield no inner pair.
    let value = literal.into_inner().next().map_or("", |v| v.as_str());
    Ok((name.as_str().to_string(), value.to_string()))
}
