use locatr_dom::{DomError, XmlDocument};

const DOC: &str = r#"<r><g><a k="1"/><a k="2"/></g><g><a k="3">hi</a></g></r>"#;

fn find(doc: &XmlDocument, xpath: &str) -> Vec<usize> {
    doc.find(xpath).unwrap_or_else(|e| panic!("{xpath}: {e}"))
}

#[test]
fn test_arena_is_preorder() {
    let doc = XmlDocument::parse(DOC).expect("parse");
    let tags: Vec<&str> = (0..doc.len()).map(|i| doc.node(i).tag.as_str()).collect();
    assert_eq!(tags, vec!["r", "g", "a", "a", "g", "a"]);
    assert_eq!(doc.descendants(1), 2..4);
    assert_eq!(doc.node(5).text, "hi");
    assert_eq!(doc.sibling_position(3), Some(2));
    assert_eq!(doc.sibling_position(5), None);
}

#[test]
fn test_descendant_and_child_steps() {
    let doc = XmlDocument::parse(DOC).unwrap();
    assert_eq!(find(&doc, "//a"), vec![2, 3, 5]);
    assert_eq!(find(&doc, "//r"), vec![0]);
    assert_eq!(find(&doc, "/r/g/a"), vec![2, 3, 5]);
    assert_eq!(find(&doc, "//g/*"), vec![2, 3, 5]);
    assert!(find(&doc, "/a").is_empty());
}

#[test]
fn test_positions_count_per_parent() {
    let doc = XmlDocument::parse(DOC).unwrap();
    assert_eq!(find(&doc, "//a[2]"), vec![3]);
    assert_eq!(find(&doc, "//a[1]"), vec![2, 5]);
    assert_eq!(find(&doc, "(//a)[3]"), vec![5]);
    assert_eq!(find(&doc, "//g[2]/a"), vec![5]);
}

#[test]
fn test_attribute_predicates() {
    let doc = XmlDocument::parse(DOC).unwrap();
    assert_eq!(find(&doc, r#"/r/g/a[@k="2"]"#), vec![3]);
    assert_eq!(find(&doc, "//*[@k='3']"), vec![5]);
    assert_eq!(find(&doc, r#"//a[@k="2"][1]"#), vec![3]);
    assert!(find(&doc, r#"//a[@k="1" and @k="2"]"#).is_empty());
    assert!(find(&doc, r#"//g[@x="y"]"#).is_empty());
}

#[test]
fn test_parse_errors() {
    assert_eq!(XmlDocument::parse("  ").unwrap_err(), DomError::EmptySource);
    assert!(matches!(XmlDocument::parse("<a>"), Err(DomError::Parse(_))));
    let doc = XmlDocument::parse(DOC).unwrap();
    assert!(matches!(doc.find("(//a)[2]/.."), Err(DomError::InvalidXPath { .. })));
}
