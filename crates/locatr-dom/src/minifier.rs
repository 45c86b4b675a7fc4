//! Builds the minified element tree and its locator map from a page source.

use crate::document::XmlDocument;
use crate::error::DomError;
use crate::locator::{LocatorGenerator, Uniqueness};
use crate::platform::Platform;
use locatr_common::{generate_unique_id, Dom, DomMetadata, ElementSpec, LocatorMap, LocatorType};
use tracing::debug;

/// Parse `source` and build the full DOM snapshot.
pub fn build_dom(source: &str, platform: Platform) -> Result<Dom, DomError> {
    let doc = XmlDocument::parse(source)?;
    Ok(build_dom_from_document(&doc, platform))
}

/// Minified element tree only.
pub fn minify_source(source: &str, platform: Platform) -> Result<ElementSpec, DomError> {
    Ok(build_dom(source, platform)?.root_element)
}

/// Element id to candidate locators, for every kept element.
pub fn create_locator_map(source: &str, platform: Platform) -> Result<LocatorMap, DomError> {
    Ok(build_dom(source, platform)?.metadata.locator_map)
}

pub fn build_dom_from_document(doc: &XmlDocument, platform: Platform) -> Dom {
    let mut builder = TreeBuilder {
        generator: LocatorGenerator::new(doc),
        platform,
        locator_map: LocatorMap::new(),
    };
    let root_element = builder.element(doc.root());
    debug!(
        platform = %platform,
        nodes = doc.len(),
        kept = root_element.node_count(),
        "Built minified DOM"
    );
    Dom {
        root_element,
        metadata: DomMetadata {
            locator_type: LocatorType::XPath,
            locator_map: builder.locator_map,
        },
    }
}

struct TreeBuilder<'a> {
    generator: LocatorGenerator<'a>,
    platform: Platform,
    locator_map: LocatorMap,
}

impl TreeBuilder<'_> {
    fn element(&mut self, id: usize) -> ElementSpec {
        let doc = self.generator.document();
        let node = doc.node(id);

        let optimal = self.generator.optimal_xpath(id);
        let mut locators = vec![optimal.xpath];
        if optimal.uniqueness == Uniqueness::SemiUnique {
            let absolute = self.generator.hierarchy_xpath(id);
            if !locators.contains(&absolute) {
                locators.push(absolute);
            }
        }
        let element_id = generate_unique_id(&locators[0]);
        self.locator_map.insert(element_id.clone(), locators);

        let mut children = Vec::new();
        for &child in &node.children {
            if self.platform.keeps(doc.node(child)) {
                children.push(self.element(child));
            }
        }

        ElementSpec {
            id: element_id,
            tag_name: node.tag.clone(),
            text: self.platform.visible_text(node),
            attributes: node.attributes.iter().cloned().collect(),
            children,
        }
    }
}
