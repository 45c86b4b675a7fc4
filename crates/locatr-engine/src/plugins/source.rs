use crate::config::LocatrConfig;
use crate::coords::{letterbox_png, remap_point, remap_point_inverse};
use crate::search::{self, DEFAULT_SEARCH_TIMEOUT};
use async_trait::async_trait;
use locatr_common::{Dom, Location, Plugin, PluginError, Point, Resolution};
use locatr_dom::{Platform, XmlDocument, build_dom_from_document};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

struct Snapshot {
    document: XmlDocument,
    dom: Arc<Dom>,
}

/// Plugin over a captured native page source (Appium `getPageSource` XML)
/// and, optionally, the screenshot taken with it.
///
/// The built tree is memoized until the next `set_source`.
pub struct SourcePlugin {
    platform: Platform,
    context: String,
    source: String,
    screenshot: Option<Vec<u8>>,
    viewport: Option<Resolution>,
    original: Option<Resolution>,
    search_timeout: Duration,
    snapshot: Option<Snapshot>,
}

impl SourcePlugin {
    pub fn new(platform: Platform, context: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            platform,
            context: context.into(),
            source: source.into(),
            screenshot: None,
            viewport: None,
            original: None,
            search_timeout: DEFAULT_SEARCH_TIMEOUT,
            snapshot: None,
        }
    }

    pub fn with_screenshot(mut self, png: Vec<u8>) -> Self {
        self.screenshot = Some(png);
        self
    }

    pub fn with_search_timeout(mut self, timeout: Duration) -> Self {
        self.search_timeout = timeout;
        self
    }

    /// Apply the `search` section of a loaded configuration.
    pub fn with_config(self, config: &LocatrConfig) -> Self {
        self.with_search_timeout(config.search.timeout())
    }

    pub fn search_timeout(&self) -> Duration {
        self.search_timeout
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn viewport(&self) -> Option<Resolution> {
        self.viewport
    }

    /// Navigate: replace the page source and drop everything derived from
    /// the previous one.
    pub fn set_source(&mut self, context: impl Into<String>, source: impl Into<String>) {
        self.context = context.into();
        self.source = source.into();
        self.screenshot = None;
        self.original = None;
        self.snapshot = None;
        debug!(context = %self.context, "Page source replaced");
    }

    pub fn set_screenshot(&mut self, png: Vec<u8>) {
        self.screenshot = Some(png);
        self.original = None;
    }

    fn snapshot(&mut self) -> Result<&Snapshot, PluginError> {
        if self.snapshot.is_none() {
            let document = XmlDocument::parse(&self.source)
                .map_err(|e| PluginError::InvalidSource(e.to_string()))?;
            let dom = Arc::new(build_dom_from_document(&document, self.platform));
            info!(
                context = %self.context,
                elements = dom.metadata.locator_map.len(),
                "Built DOM snapshot"
            );
            self.snapshot = Some(Snapshot { document, dom });
        }
        self.snapshot
            .as_ref()
            .ok_or_else(|| PluginError::InvalidSource("no page source".into()))
    }

    /// Screenshot and viewport resolutions, when a letterboxed screenshot
    /// has been handed out.
    fn letterbox(&self) -> Option<(Resolution, Resolution)> {
        self.original.zip(self.viewport)
    }
}

#[async_trait]
impl Plugin for SourcePlugin {
    async fn get_current_context(&mut self) -> Result<String, PluginError> {
        Ok(self.context.clone())
    }

    async fn get_minified_dom(&mut self) -> Result<Arc<Dom>, PluginError> {
        Ok(self.snapshot()?.dom.clone())
    }

    async fn is_locator_valid(&mut self, locator: &str) -> Result<bool, PluginError> {
        let matches = self
            .snapshot()?
            .document
            .find(locator)
            .map_err(|e| PluginError::InvalidLocator {
                locator: locator.to_string(),
                reason: e.to_string(),
            })?;
        Ok(!matches.is_empty())
    }

    async fn set_viewport_size(&mut self, width: u32, height: u32) -> Result<(), PluginError> {
        self.viewport = Some(Resolution::new(width, height));
        Ok(())
    }

    async fn take_screenshot(&mut self) -> Result<Vec<u8>, PluginError> {
        let Some(png) = &self.screenshot else {
            return Err(PluginError::NotSupported(
                "take_screenshot without a captured screenshot".into(),
            ));
        };
        let Some(target) = self.viewport else {
            return Ok(png.clone());
        };
        let (padded, original) =
            letterbox_png(png, target).map_err(|e| PluginError::Backend(e.to_string()))?;
        debug!(original = %original, target = %target, "Letterboxed screenshot");
        self.original = Some(original);
        Ok(padded)
    }

    async fn get_element_locators(
        &mut self,
        location: &Location,
    ) -> Result<Vec<String>, PluginError> {
        let point = match self.letterbox() {
            Some((original, target)) => {
                remap_point(location.point, original, target).ok_or_else(|| {
                    PluginError::NotFound(format!(
                        "point {} lies on the screenshot padding",
                        location.point
                    ))
                })?
            }
            None => location.point,
        };
        let dom = self.snapshot()?.dom.clone();
        let locators =
            search::find_locators_at(dom, point, self.platform, self.search_timeout).await?;
        Ok(locators)
    }

    async fn get_element_location(&mut self, locator: &str) -> Result<Location, PluginError> {
        let dom = self.snapshot()?.dom.clone();
        let point =
            search::find_element_location(dom, locator, self.platform, self.search_timeout)
                .await?;
        let point = match self.letterbox() {
            Some((original, target)) => remap_point_inverse(point, original, target),
            None => point,
        };
        Ok(Location {
            point,
            scroll_position: Point::default(),
        })
    }
}
