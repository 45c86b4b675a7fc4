//! Scatter/gather searches over a minified tree.
//!
//! Every node is visited by its own task. Tasks address nodes by their child
//! index path from the root so they can share one `Arc<Dom>`.

use locatr_common::{Dom, ElementSpec, Point, PluginError, generate_unique_id};
use locatr_dom::{DomError, Platform};
use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

pub const DEFAULT_SEARCH_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SearchError {
    #[error("element not found: {0}")]
    NotFound(String),

    #[error("timeout while searching for {0}")]
    Timeout(String),

    #[error("element geometry: {0}")]
    Geometry(#[from] DomError),
}

impl From<SearchError> for PluginError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::NotFound(what) => PluginError::NotFound(what),
            SearchError::Timeout(what) => PluginError::Timeout(what),
            SearchError::Geometry(e) => PluginError::NotFound(e.to_string()),
        }
    }
}

/// Center of an element according to the platform's geometry attributes.
pub fn element_center(element: &ElementSpec, platform: Platform) -> Result<Point, DomError> {
    platform.element_center(|key| element.attributes.get(key).map(String::as_str))
}

#[derive(Debug)]
struct Hit {
    path: Vec<usize>,
    distance: f64,
}

impl Hit {
    /// Closer first, then deeper, then earlier in document order.
    fn outranks(&self, other: &Hit) -> bool {
        let order = self
            .distance
            .total_cmp(&other.distance)
            .then_with(|| other.path.len().cmp(&self.path.len()))
            .then_with(|| self.path.cmp(&other.path));
        order == Ordering::Less
    }
}

/// Locators of the element whose center is nearest (L1) to `target`.
pub async fn find_locators_at(
    dom: Arc<Dom>,
    target: Point,
    platform: Platform,
    timeout: Duration,
) -> Result<Vec<String>, SearchError> {
    let (tx, mut rx) = mpsc::channel::<Hit>(64);
    let token = CancellationToken::new();
    spawn_point_visit(dom.clone(), Vec::new(), target, platform, tx, token.clone());

    let gather = async {
        let mut best: Option<Hit> = None;
        while let Some(hit) = rx.recv().await {
            if best.as_ref().is_none_or(|b| hit.outranks(b)) {
                best = Some(hit);
            }
        }
        best
    };

    let best = match tokio::time::timeout(timeout, gather).await {
        Ok(best) => best,
        Err(_) => {
            token.cancel();
            return Err(SearchError::Timeout(format!("element at {}", target)));
        }
    };

    let hit = best.ok_or_else(|| SearchError::NotFound(format!("no element at {}", target)))?;
    let element = dom
        .root_element
        .at_path(&hit.path)
        .ok_or_else(|| SearchError::NotFound(format!("no element at {}", target)))?;
    debug!(
        target = %target,
        distance = hit.distance,
        tag = %element.tag_name,
        "Nearest element"
    );
    dom.locators(&element.id)
        .map(<[String]>::to_vec)
        .ok_or_else(|| SearchError::NotFound(format!("no locators for element {}", element.id)))
}

fn spawn_point_visit(
    dom: Arc<Dom>,
    path: Vec<usize>,
    target: Point,
    platform: Platform,
    tx: mpsc::Sender<Hit>,
    token: CancellationToken,
) {
    tokio::spawn(async move {
        if token.is_cancelled() {
            return;
        }
        let Some(element) = dom.root_element.at_path(&path) else {
            return;
        };

        for index in 0..element.children.len() {
            let mut child = path.clone();
            child.push(index);
            spawn_point_visit(dom.clone(), child, target, platform, tx.clone(), token.clone());
        }

        match element_center(element, platform) {
            Ok(center) => {
                let hit = Hit {
                    distance: center.manhattan_distance(&target),
                    path,
                };
                tokio::select! {
                    _ = token.cancelled() => {}
                    _ = tx.send(hit) => {}
                }
            }
            Err(e) => trace!(tag = %element.tag_name, error = %e, "No center"),
        }
    });
}

/// Child index path of the element with the given id.
pub async fn find_element(
    dom: Arc<Dom>,
    id: &str,
    timeout: Duration,
) -> Result<Vec<usize>, SearchError> {
    let (tx, mut rx) = mpsc::channel::<Vec<usize>>(1);
    let token = CancellationToken::new();
    spawn_id_visit(dom, Vec::new(), Arc::from(id), tx, token.clone());

    let found = tokio::time::timeout(timeout, rx.recv()).await;
    token.cancel();
    match found {
        Ok(Some(path)) => Ok(path),
        Ok(None) => Err(SearchError::NotFound(format!("element with id '{}'", id))),
        Err(_) => Err(SearchError::Timeout(format!("element with id '{}'", id))),
    }
}

fn spawn_id_visit(
    dom: Arc<Dom>,
    path: Vec<usize>,
    id: Arc<str>,
    tx: mpsc::Sender<Vec<usize>>,
    token: CancellationToken,
) {
    tokio::spawn(async move {
        if token.is_cancelled() {
            return;
        }
        let Some(element) = dom.root_element.at_path(&path) else {
            return;
        };
        if element.id == *id {
            // First match wins; later matches are dropped.
            let _ = tx.try_send(path);
            return;
        }
        for index in 0..element.children.len() {
            let mut child = path.clone();
            child.push(index);
            spawn_id_visit(dom.clone(), child, id.clone(), tx.clone(), token.clone());
        }
    });
}

/// Center point of the element a locator was generated for.
pub async fn find_element_location(
    dom: Arc<Dom>,
    locator: &str,
    platform: Platform,
    timeout: Duration,
) -> Result<Point, SearchError> {
    let id = generate_unique_id(locator);
    let not_found =
        || SearchError::NotFound(format!("element associated with locator '{}'", locator));
    let path = find_element(dom.clone(), &id, timeout)
        .await
        .map_err(|e| match e {
            SearchError::NotFound(_) => not_found(),
            SearchError::Timeout(_) => {
                SearchError::Timeout(format!("element with locator '{}'", locator))
            }
            other => other,
        })?;
    let element = dom.root_element.at_path(&path).ok_or_else(not_found)?;
    Ok(element_center(element, platform)?)
}
