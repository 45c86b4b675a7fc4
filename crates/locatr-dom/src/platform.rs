//! Per-platform rules for native accessibility trees.

use crate::document::XmlNode;
use crate::error::DomError;
use locatr_common::Point;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static BOUNDS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*\[(-?\d+),(-?\d+)\]\[(-?\d+),(-?\d+)\]\s*$").unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Android,
    Ios,
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Android => f.write_str("android"),
            Platform::Ios => f.write_str("ios"),
        }
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "android" => Ok(Platform::Android),
            "ios" => Ok(Platform::Ios),
            other => Err(format!("Unknown platform: {}", other)),
        }
    }
}

/// Axis-aligned rectangle parsed from an Android `bounds` attribute.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl Bounds {
    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }

    pub fn center(&self) -> Point {
        Point::new((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }
}

/// Parse `[x1,y1][x2,y2]`.
pub fn parse_bounds(value: &str) -> Result<Bounds, DomError> {
    let caps = BOUNDS_RE
        .captures(value)
        .ok_or_else(|| DomError::InvalidGeometry(format!("bounds '{}'", value)))?;
    let num = |i: usize| -> Result<f64, DomError> {
        caps[i]
            .parse::<f64>()
            .map_err(|e| DomError::InvalidGeometry(format!("bounds '{}': {}", value, e)))
    };
    Ok(Bounds {
        x1: num(1)?,
        y1: num(2)?,
        x2: num(3)?,
        y2: num(4)?,
    })
}

fn numeric_attr<'a>(
    attrs: impl Fn(&str) -> Option<&'a str>,
    name: &str,
) -> Result<f64, DomError> {
    let raw = attrs(name).ok_or_else(|| DomError::InvalidGeometry(format!("missing '{}'", name)))?;
    raw.trim()
        .parse::<f64>()
        .map_err(|e| DomError::InvalidGeometry(format!("{}='{}': {}", name, raw, e)))
}

impl Platform {
    /// Own visibility of a node, ignoring its children.
    pub fn is_visible(&self, node: &XmlNode) -> bool {
        match self {
            Platform::Android => match node.attribute("bounds") {
                Some(bounds) => parse_bounds(bounds)
                    .map(|b| b.width() > 0.0 && b.height() > 0.0)
                    .unwrap_or(false),
                None => false,
            },
            Platform::Ios => node.attribute("visible").map_or(true, |v| v == "true"),
        }
    }

    /// Whether a node survives minification. Containers and text carriers are
    /// always kept even when the platform reports them hidden.
    pub fn keeps(&self, node: &XmlNode) -> bool {
        node.tag == "hierarchy" || node.has_content() || self.is_visible(node)
    }

    /// The human-readable label of a node.
    pub fn visible_text(&self, node: &XmlNode) -> String {
        let attr = match self {
            Platform::Android => node.attribute("text"),
            Platform::Ios => node
                .attribute("label")
                .filter(|v| !v.trim().is_empty())
                .or_else(|| node.attribute("value")),
        };
        match attr.map(str::trim).filter(|v| !v.is_empty()) {
            Some(text) => text.to_string(),
            None => node.text.clone(),
        }
    }

    /// Center point of an element from its attributes.
    pub fn element_center<'a>(
        &self,
        attrs: impl Fn(&str) -> Option<&'a str>,
    ) -> Result<Point, DomError> {
        match self {
            Platform::Android => {
                let bounds = attrs("bounds")
                    .ok_or_else(|| DomError::InvalidGeometry("missing 'bounds'".into()))?;
                Ok(parse_bounds(bounds)?.center())
            }
            Platform::Ios => {
                if attrs("visible") != Some("true") {
                    return Err(DomError::NotVisible);
                }
                let x = numeric_attr(&attrs, "x")?;
                let y = numeric_attr(&attrs, "y")?;
                let width = numeric_attr(&attrs, "width")?;
                let height = numeric_attr(&attrs, "height")?;
                Ok(Point::new(x + width / 2.0, y + height / 2.0))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn bounds_center() {
        let b = parse_bounds("[0,0][20,40]").unwrap();
        assert_eq!(b.center(), Point::new(10.0, 20.0));
        assert!(parse_bounds("[0,0][20]").is_err());
    }

    #[test]
    fn ios_center_requires_visible() {
        let mut attrs: HashMap<&str, &str> = HashMap::new();
        attrs.insert("x", "10");
        attrs.insert("y", "20");
        attrs.insert("width", "30");
        attrs.insert("height", "40");
        let get = |k: &str| attrs.get(k).copied();
        assert_eq!(Platform::Ios.element_center(get), Err(DomError::NotVisible));

        attrs.insert("visible", "true");
        let get = |k: &str| attrs.get(k).copied();
        assert_eq!(Platform::Ios.element_center(get), Ok(Point::new(25.0, 40.0)));
    }

    #[test]
    fn platform_from_str() {
        assert_eq!("Android".parse::<Platform>(), Ok(Platform::Android));
        assert_eq!("ios".parse::<Platform>(), Ok(Platform::Ios));
        assert!("web".parse::<Platform>().is_err());
    }
}
