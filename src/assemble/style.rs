//! Cosmetic styling properties for GitHub and GSI map viewers.

use serde_json::{json, Map, Value};

use crate::config::StyleConfig;

const FALLBACK_COLOR: &str = "#333333";

/// Styling shared by every feature of one group
#[derive(Debug, Clone, PartialEq)]
pub struct Style {
    pub color: String,
    pub opacity: f64,
    pub weight: f64,
    pub fill_opacity: f64,
}

impl Style {
    /// Style for the `index`-th group; colours cycle through the palette
    pub fn for_group(index: usize, config: &StyleConfig) -> Self {
        let color = if config.palette.is_empty() {
            FALLBACK_COLOR.to_string()
        } else {
            config.palette[index % config.palette.len()].clone()
        };

        Self {
            color,
            opacity: config.opacity,
            weight: config.weight,
            fill_opacity: config.fill_opacity,
        }
    }

    /// Add the styling keys to a property bag, overwriting any existing ones
    pub fn apply(&self, properties: &mut Map<String, Value>) {
        // GitHub simplestyle
        properties.insert("fill".to_string(), json!(self.color));
        properties.insert("stroke".to_string(), json!(self.color));
        // GSI maps
        properties.insert("_opacity".to_string(), json!(self.opacity));
        properties.insert("_weight".to_string(), json!(self.weight));
        properties.insert("_fillOpacity".to_string(), json!(self.fill_opacity));
        properties.insert("_fillColor".to_string(), json!(self.color));
        properties.insert("_color".to_string(), json!(self.color));
    }
}
