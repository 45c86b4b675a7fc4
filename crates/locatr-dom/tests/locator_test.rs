use locatr_dom::{build_dom, LocatorGenerator, Platform, Uniqueness, XmlDocument};

const ANDROID: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<hierarchy rotation="0">
  <android.widget.FrameLayout bounds="[0,0][100,100]">
    <android.widget.Button resource-id="com.app:id/login" text="Login" bounds="[0,0][20,20]"/>
    <android.widget.TextView text="Item" bounds="[0,20][20,40]"/>
    <android.widget.TextView text="Item" bounds="[0,40][20,60]"/>
    <android.widget.View bounds="[0,60][0,80]"/>
  </android.widget.FrameLayout>
</hierarchy>"#;

fn node_with(doc: &XmlDocument, tag: &str, nth: usize) -> usize {
    (0..doc.len())
        .filter(|&i| doc.node(i).tag == tag)
        .nth(nth)
        .unwrap_or_else(|| panic!("no {tag} #{nth}"))
}

#[test]
fn test_unique_attribute_wins() {
    let doc = XmlDocument::parse(ANDROID).unwrap();
    let mut generator = LocatorGenerator::new(&doc);
    let button = node_with(&doc, "android.widget.Button", 0);
    let candidate = generator.optimal_xpath(button);
    assert_eq!(
        candidate.xpath,
        r#"//android.widget.Button[@resource-id="com.app:id/login"]"#
    );
    assert_eq!(candidate.uniqueness, Uniqueness::Unique);
}

#[test]
fn test_duplicate_text_is_indexed() {
    let doc = XmlDocument::parse(ANDROID).unwrap();
    let mut generator = LocatorGenerator::new(&doc);
    let second = node_with(&doc, "android.widget.TextView", 1);
    let candidate = generator.optimal_xpath(second);
    assert_eq!(candidate.xpath, r#"(//android.widget.TextView[@text="Item"])[2]"#);
    assert_eq!(candidate.uniqueness, Uniqueness::SemiUnique);
    assert_eq!(
        generator.hierarchy_xpath(second),
        "/hierarchy/android.widget.FrameLayout/android.widget.TextView[2]"
    );
}

#[test]
fn test_unique_tag_and_root() {
    let doc = XmlDocument::parse(ANDROID).unwrap();
    let mut generator = LocatorGenerator::new(&doc);
    assert_eq!(generator.optimal_xpath(doc.root()).xpath, "/hierarchy");
    let frame = node_with(&doc, "android.widget.FrameLayout", 0);
    assert_eq!(
        generator.optimal_xpath(frame).xpath,
        "//android.widget.FrameLayout"
    );
}

#[test]
fn test_pair_beats_single_maybe_attribute() {
    let source = r#"<root>
        <item name="row" text="A"/>
        <item name="row" text="B"/>
        <item text="A"/>
    </root>"#;
    let doc = XmlDocument::parse(source).unwrap();
    let mut generator = LocatorGenerator::new(&doc);
    let first = node_with(&doc, "item", 0);
    let candidate = generator.optimal_xpath(first);
    assert_eq!(candidate.xpath, r#"//item[@name="row" and @text="A"]"#);
    assert_eq!(candidate.uniqueness, Uniqueness::Unique);
}

#[test]
fn test_hierarchical_fallback() {
    let doc = XmlDocument::parse("<root><g><a/></g><g><a/></g></root>").unwrap();
    let mut generator = LocatorGenerator::new(&doc);
    let second_a = node_with(&doc, "a", 1);
    let candidate = generator.optimal_xpath(second_a);
    assert_eq!(candidate.xpath, "/root/g[2]/a");
    assert_eq!(candidate.uniqueness, Uniqueness::Hierarchical);
    assert_eq!(doc.find(&candidate.xpath).unwrap(), vec![second_a]);
}

#[test]
fn test_values_with_quotes() {
    let doc = XmlDocument::parse(r#"<root><b name='say "hi"'/><b name="x"/></root>"#).unwrap();
    let mut generator = LocatorGenerator::new(&doc);
    let b = node_with(&doc, "b", 0);
    assert_eq!(generator.optimal_xpath(b).xpath, r#"//b[@name='say "hi"']"#);
}

#[test]
fn test_every_optimal_xpath_requeries_its_node() {
    let sources = [
        ANDROID,
        "<root><g><a/></g><g><a/><a/></g><a k=\"1\"/><a k=\"1\"/></root>",
        r#"<XCUIElementTypeApplication name="App">
            <XCUIElementTypeWindow>
              <XCUIElementTypeButton label="OK" visible="true"/>
              <XCUIElementTypeButton label="OK" value="2" visible="true"/>
              <XCUIElementTypeOther><XCUIElementTypeOther/></XCUIElementTypeOther>
            </XCUIElementTypeWindow>
           </XCUIElementTypeApplication>"#,
        "<hierarchy><a><ñ/></a><a><ñ/></a><日本 name=\"ボタン\"/></hierarchy>",
    ];
    for source in sources {
        let doc = XmlDocument::parse(source).unwrap();
        let mut generator = LocatorGenerator::new(&doc);
        for id in 0..doc.len() {
            let candidate = generator.optimal_xpath(id);
            assert!(!candidate.xpath.is_empty());
            let matches = doc.find(&candidate.xpath).unwrap();
            assert!(
                matches.contains(&id),
                "{} does not select node {id}",
                candidate.xpath
            );
            if candidate.uniqueness != Uniqueness::Hierarchical {
                assert_eq!(matches, vec![id], "{}", candidate.xpath);
            }
        }
    }
}

#[test]
fn test_non_ascii_names_resolve() {
    let source = "<hierarchy><a><ñ/></a><a><ñ/></a><日本 name=\"ボタン\"/></hierarchy>";
    let doc = XmlDocument::parse(source).unwrap();
    let dom = build_dom(source, Platform::Ios).unwrap();

    for locators in dom.metadata.locator_map.values() {
        for locator in locators {
            let matches = doc.find(locator).unwrap();
            assert!(!matches.is_empty(), "{locator} selects nothing");
        }
    }

    let first = node_with(&doc, "ñ", 0);
    let mut generator = LocatorGenerator::new(&doc);
    let candidate = generator.optimal_xpath(first);
    assert_eq!(candidate.xpath, "/hierarchy/a[1]/ñ");
    assert_eq!(candidate.uniqueness, Uniqueness::Hierarchical);
    assert_eq!(doc.find(&candidate.xpath).unwrap(), vec![first]);
    let named = node_with(&doc, "日本", 0);
    assert_eq!(generator.optimal_xpath(named).xpath, r#"//日本[@name="ボタン"]"#);
}
