use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct OnionSkinConfig {
    pub enabled: bool,
    pub prev: usize,
    pub next: usize,
    pub alpha: f64,
}

impl Default for OnionSkinConfig {
    fn default() -> Self {
        OnionSkinConfig { enabled: true, prev: 1, next: 1, alpha: 0.3 }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct BrushConfig {
    pub primary_color: String,
    pub secondary_color: String,
    pub brush_size: f64,
    pub opacity: f64,
    pub font_size: f64,
    pub font_family: String,
}

impl Default for BrushConfig {
    fn default() -> Self {
        BrushConfig {
            primary_color: "#4f46e5".to_string(),
            secondary_color: "#ffffff".to_string(),
            brush_size: 5.0,
            opacity: 1.0,
            font_size: 24.0,
            font_family: "Inter".to_string(),
        }
    }
}

/// Editor tunables. Every field has a default so a host may override only
/// the keys it cares about.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    pub canvas_width: f64,
    pub canvas_height: f64,
    pub history_capacity: usize,
    pub handle_hit_radius: f64,
    pub hover_hit_radius: f64,
    pub handle_size: f64,
    pub rotate_handle_offset: f64,
    pub min_resize: f64,
    pub onion_skin: OnionSkinConfig,
    pub playback_fps: f64,
    pub zoom_min: f64,
    pub zoom_max: f64,
    pub zoom_step: f64,
    pub brush: BrushConfig,
    pub background_enabled: bool,
    pub background_color: String,
    pub fire_anchor: (f64, f64),
}

impl Default for EditorConfig {
    fn default() -> Self {
        EditorConfig {
            canvas_width: 1920.0,
            canvas_height: 1080.0,
            history_capacity: 50,
            handle_hit_radius: 15.0,
            hover_hit_radius: 12.0,
            handle_size: 8.0,
            rotate_handle_offset: 25.0,
            min_resize: 10.0,
            onion_skin: OnionSkinConfig::default(),
            playback_fps: 12.0,
            zoom_min: 0.2,
            zoom_max: 5.0,
            zoom_step: 0.1,
            brush: BrushConfig::default(),
            background_enabled: false,
            background_color: "#ffffff".to_string(),
            fire_anchor: (400.0, 550.0),
        }
    }
}

impl EditorConfig {
    pub fn from_json(json: &str) -> EngineResult<Self> {
        let config: EditorConfig = serde_json::from_str(json).map_err(EngineError::InvalidConfig)?;
        Ok(config.sanitized())
    }

    fn sanitized(mut self) -> Self {
        self.history_capacity = self.history_capacity.max(2);
        if self.playback_fps <= 0.0 { self.playback_fps = 12.0; }
        if self.zoom_min <= 0.0 { self.zoom_min = 0.2; }
        if self.zoom_max < self.zoom_min { self.zoom_max = self.zoom_min; }
        self.onion_skin.alpha = self.onion_skin.alpha.clamp(0.0, 1.0);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_override_keeps_defaults() {
        let config = EditorConfig::from_json(r#"{"historyCapacity": 10, "onionSkin": {"alpha": 0.5}}"#).unwrap();
        assert_eq!(config.history_capacity, 10);
        assert_eq!(config.onion_skin.alpha, 0.5);
        assert_eq!(config.onion_skin.prev, 1);
        assert_eq!(config.canvas_width, 1920.0);
        assert_eq!(config.brush.primary_color, "#4f46e5");
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(EditorConfig::from_json("{"), Err(EngineError::InvalidConfig(_))));
    }
}
