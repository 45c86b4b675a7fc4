use crate::dom::{Dom, extract_first_unique_id};
use crate::error::PluginError;
use crate::geometry::Location;
use async_trait::async_trait;
use std::sync::Arc;

/// The capability set every automation backend exposes to the engine.
///
/// Browser adapters (Playwright, Selenium, CDP), native adapters (Appium) and
/// raw page-source adapters all implement this one interface; the engine never
/// branches on which backend it is talking to.
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Identifier of the current page or screen (URL, activity name).
    async fn get_current_context(&mut self) -> Result<String, PluginError>;

    /// Minified DOM of the current context. Plugins may memoize the snapshot
    /// per navigation, hence the shared handle.
    async fn get_minified_dom(&mut self) -> Result<Arc<Dom>, PluginError>;

    /// Id of the first element found in a serialized DOM fragment.
    async fn extract_first_unique_id(&mut self, fragment: &str) -> Result<String, PluginError> {
        extract_first_unique_id(fragment)
            .ok_or_else(|| PluginError::NotFound("no id attribute found in fragment".into()))
    }

    /// Whether the locator still resolves on the live page.
    async fn is_locator_valid(&mut self, locator: &str) -> Result<bool, PluginError>;

    async fn set_viewport_size(&mut self, _width: u32, _height: u32) -> Result<(), PluginError> {
        Err(PluginError::NotSupported("set_viewport_size".into()))
    }

    /// PNG screenshot of the current viewport.
    async fn take_screenshot(&mut self) -> Result<Vec<u8>, PluginError> {
        Err(PluginError::NotSupported("take_screenshot".into()))
    }

    /// Reverse lookup: locators of the element under a point.
    async fn get_element_locators(
        &mut self,
        _location: &Location,
    ) -> Result<Vec<String>, PluginError> {
        Err(PluginError::NotSupported("get_element_locators".into()))
    }

    /// Point and scroll position of the element a locator resolves to.
    async fn get_element_location(&mut self, _locator: &str) -> Result<Location, PluginError> {
        Err(PluginError::NotSupported("get_element_location".into()))
    }
}
