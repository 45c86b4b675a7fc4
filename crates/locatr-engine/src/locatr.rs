use crate::cache::{DEFAULT_CACHE_PATH, LocatorCache};
use crate::config::LocatrConfig;
use crate::error::LocateError;
use crate::logging::Topic;
use crate::mode::{self, DomAnalysisMode, LocateMode};
use locatr_common::{CacheEntry, LlmClient, LocatrCompletion, Plugin, RerankerClient};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{Instrument, error, info, info_span, warn};

/// Resolves natural-language element descriptions to locators on the
/// plugin's current page.
///
/// Calls take `&mut self` and are meant to be issued one at a time; the
/// cache is mutated in place.
pub struct Locatr<P: Plugin> {
    plugin: P,
    llm: Arc<dyn LlmClient>,
    reranker: Arc<dyn RerankerClient>,
    mode: Box<dyn LocateMode>,
    cache: Option<LocatorCache>,
}

pub struct LocatrBuilder<P: Plugin> {
    plugin: P,
    llm: Arc<dyn LlmClient>,
    reranker: Arc<dyn RerankerClient>,
    mode: Option<Box<dyn LocateMode>>,
    cache_path: Option<PathBuf>,
}

impl<P: Plugin> LocatrBuilder<P> {
    pub fn mode(mut self, mode: impl LocateMode + 'static) -> Self {
        self.mode = Some(Box::new(mode));
        self
    }

    pub fn boxed_mode(mut self, mode: Box<dyn LocateMode>) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Enable the cache at `path`, or at `.locatr.cache` when `None`.
    pub fn cache(mut self, path: Option<PathBuf>) -> Self {
        self.cache_path = Some(path.unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_PATH)));
        self
    }

    /// Apply mode and cache settings from a loaded configuration.
    pub fn config(mut self, config: &LocatrConfig) -> Self {
        self.mode = Some(mode::from_config(&config.mode));
        self.cache_path = config.cache.enabled.then(|| config.cache.path.clone());
        self
    }

    /// Loads the cache file when caching is enabled. A corrupt cache file is
    /// an error; a missing one is not.
    pub async fn build(self) -> Result<Locatr<P>, LocateError> {
        let cache = match self.cache_path {
            Some(path) => {
                info!("Loading cache from {}", path.display());
                Some(LocatorCache::load(path).await?)
            }
            None => None,
        };
        Ok(Locatr {
            plugin: self.plugin,
            llm: self.llm,
            reranker: self.reranker,
            mode: self.mode.unwrap_or_else(|| Box::new(DomAnalysisMode::default())),
            cache,
        })
    }
}

impl<P: Plugin> Locatr<P> {
    pub fn builder(
        plugin: P,
        llm: Arc<dyn LlmClient>,
        reranker: Arc<dyn RerankerClient>,
    ) -> LocatrBuilder<P> {
        LocatrBuilder {
            plugin,
            llm,
            reranker,
            mode: None,
            cache_path: None,
        }
    }

    pub fn plugin(&self) -> &P {
        &self.plugin
    }

    pub fn plugin_mut(&mut self) -> &mut P {
        &mut self.plugin
    }

    pub fn cache(&self) -> Option<&LocatorCache> {
        self.cache.as_ref()
    }

    /// On exhaustion the returned error still carries the token usage, see
    /// [`LocateError::usage`].
    pub async fn locate(&mut self, request: &str) -> Result<LocatrCompletion, LocateError> {
        let topic = Topic::start(format!("[Locate] '{}'", request));
        let span = info_span!("locate", request = %request, mode = self.mode.name());

        let mut completion = LocatrCompletion::new(self.llm.provider(), self.llm.model());
        self.resolve(request, &mut completion).instrument(span).await?;
        completion.elapsed_ms = topic.elapsed().as_millis() as u64;
        Ok(completion)
    }

    async fn resolve(
        &mut self,
        request: &str,
        completion: &mut LocatrCompletion,
    ) -> Result<(), LocateError> {
        if let Some(cache) = &self.cache {
            info!("Searching for locators in cache");
            match self.plugin.get_current_context().await {
                Ok(context) => {
                    if let Some(entry) = cache.get(&context, request, &mut self.plugin).await {
                        info!("Cache hit for '{}'", entry.user_request);
                        completion.locators = entry.locators;
                        completion.locator_type = Some(entry.locator_type);
                        completion.cache_hit = true;
                        return Ok(());
                    }
                }
                Err(e) => warn!("Couldn't get current context: {}", e),
            }
        }

        self.mode
            .process_request(
                request,
                &mut self.plugin,
                self.llm.as_ref(),
                self.reranker.as_ref(),
                completion,
            )
            .await?;

        let found = completion.locator_type.filter(|_| !completion.locators.is_empty());
        let Some(locator_type) = found else {
            return Err(LocateError::NoElementId {
                usage: completion.meta.clone(),
            });
        };

        if let Some(cache) = &mut self.cache {
            match self.plugin.get_current_context().await {
                Ok(context) => {
                    cache.put(
                        context,
                        CacheEntry {
                            user_request: request.to_string(),
                            locators: completion.locators.clone(),
                            locator_type,
                        },
                    );
                    if let Err(e) = cache.persist().await {
                        error!("Couldn't persist cache: {}", e);
                    }
                }
                Err(e) => warn!("Couldn't get current context, result not cached: {}", e),
            }
        }
        Ok(())
    }

    /// Whether all locators resolve to the same point at the same scroll
    /// position.
    pub async fn compare(&mut self, locators: &[&str]) -> Result<bool, LocateError> {
        let [first, rest @ ..] = locators else {
            return Err(LocateError::NotEnoughLocators(0));
        };
        if rest.is_empty() {
            return Err(LocateError::NotEnoughLocators(1));
        }

        let reference = self.plugin.get_element_location(first).await?;
        for locator in rest {
            let location = self.plugin.get_element_location(locator).await?;
            if location.point != reference.point
                || location.scroll_position != reference.scroll_position
            {
                return Ok(false);
            }
        }
        Ok(true)
    }
}
