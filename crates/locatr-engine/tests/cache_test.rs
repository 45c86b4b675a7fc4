mod common;

use common::LOGIN_PAGE;
use locatr_common::{CacheEntry, LocatorType};
use locatr_dom::Platform;
use locatr_engine::{CacheError, LocatorCache, SourcePlugin};

fn entry(request: &str, locators: &[&str]) -> CacheEntry {
    CacheEntry {
        user_request: request.to_string(),
        locators: locators.iter().map(|l| l.to_string()).collect(),
        locator_type: LocatorType::XPath,
    }
}

#[tokio::test]
async fn test_persist_and_load_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("deep").join("dir").join("locatr.cache");

    let mut cache = LocatorCache::new(&path);
    cache.put("https://example.com/login", entry("login button", &["//button[@id=\"b1\"]"]));
    cache.put(
        "https://example.com/login",
        entry("username field", &["//input[@name=\"u\"]", "/html/body/input"]),
    );
    cache.put(
        "com.app/.MainActivity",
        entry("settings", &["//android.widget.Button[@text=\"Settings\"]"]),
    );
    cache.persist().await.unwrap();

    let loaded = LocatorCache::load(&path).await.unwrap();
    assert_eq!(loaded, cache);
    assert_eq!(loaded.entries()["https://example.com/login"].len(), 2);
}

#[tokio::test]
async fn test_file_format() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("locatr.cache");
    let mut cache = LocatorCache::new(&path);
    cache.put("ctx", entry("login button", &["//button[@id=\"b1\"]"]));
    cache.persist().await.unwrap();

    let raw: serde_json::Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(raw["ctx"][0]["user_request"], "login button");
    assert_eq!(raw["ctx"][0]["locators"][0], "//button[@id=\"b1\"]");
    assert_eq!(raw["ctx"][0]["locator_type"], "xpath");
}

#[tokio::test]
async fn test_missing_or_blank_file_is_empty() {
    let dir = tempfile::tempdir().unwrap();

    let missing = LocatorCache::load(dir.path().join("nope.cache")).await.unwrap();
    assert!(missing.entries().is_empty());

    let blank = dir.path().join("blank.cache");
    std::fs::write(&blank, "  \n").unwrap();
    assert!(LocatorCache::load(&blank).await.unwrap().entries().is_empty());
}

#[tokio::test]
async fn test_corrupt_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("locatr.cache");
    std::fs::write(&path, r#"{"ctx": [{"user_request": 1}]}"#).unwrap();

    let err = LocatorCache::load(&path).await.unwrap_err();
    assert!(matches!(err, CacheError::Json(_)));
}

#[tokio::test]
async fn test_get_keeps_only_valid_locators() {
    let mut plugin = SourcePlugin::new(Platform::Android, "login", LOGIN_PAGE);
    let mut cache = LocatorCache::new("unused.cache");
    cache.put(
        "login",
        entry(
            "login button",
            &[r#"//button[@id="gone"]"#, r#"//button[@id="b1"]"#, "//button[@id="],
        ),
    );

    let hit = cache.get("login", "login button", &mut plugin).await.unwrap();
    assert_eq!(hit.locators, vec![r#"//button[@id="b1"]"#.to_string()]);
    assert_eq!(hit.locator_type, LocatorType::XPath);

    assert!(cache.get("signup", "login button", &mut plugin).await.is_none());
    assert!(cache.get("login", "Login button", &mut plugin).await.is_none());
}

#[tokio::test]
async fn test_get_skips_entries_without_valid_locators() {
    let mut plugin = SourcePlugin::new(Platform::Android, "login", LOGIN_PAGE);
    let mut cache = LocatorCache::new("unused.cache");
    cache.put("login", entry("login button", &[r#"//button[@id="old"]"#]));
    assert!(cache.get("login", "login button", &mut plugin).await.is_none());

    cache.put("login", entry("login button", &["/hierarchy/button"]));
    let hit = cache.get("login", "login button", &mut plugin).await.unwrap();
    assert_eq!(hit.locators, vec!["/hierarchy/button".to_string()]);
}
