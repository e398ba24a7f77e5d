//! Engine and render configuration, loadable from RON

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::renderer::{DrawSceneDesc, Technique};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] ron::Error),
}

/// Per-frame draw settings copied into every [`DrawSceneDesc`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Hour of the day, drives the sky blend
    pub time_of_day: f32,
    pub sky_alignment: f32,
    pub bump_map_strength: f32,
    pub small_bump_map_strength: f32,
    pub cull_back: bool,
    pub wireframe: bool,
    pub draw_bounding_boxes: bool,
    pub draw_footpaths: bool,
    pub draw_streams: bool,
    pub draw_debug_cross: bool,
    pub draw_test_model: bool,
    pub techniques: Technique,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            time_of_day: 12.0,
            sky_alignment: 0.0,
            bump_map_strength: 1.0,
            small_bump_map_strength: 1.0,
            cull_back: false,
            wireframe: false,
            draw_bounding_boxes: false,
            draw_footpaths: false,
            draw_streams: false,
            draw_debug_cross: false,
            draw_test_model: false,
            techniques: Technique::all(),
        }
    }
}

impl RenderSettings {
    /// Technique set after the debug toggles are applied
    pub fn effective_techniques(&self) -> Technique {
        let mut techniques = self.techniques;
        if !self.draw_debug_cross {
            techniques.remove(Technique::DEBUG_CROSS);
        }
        if !self.draw_test_model {
            techniques.remove(Technique::TEST_MODEL);
        }
        techniques
    }

    pub fn apply(&self, desc: &mut DrawSceneDesc<'_>) {
        desc.sky_alignment = self.sky_alignment;
        desc.bump_map_strength = self.bump_map_strength;
        desc.small_bump_map_strength = self.small_bump_map_strength;
        desc.cull_back = self.cull_back;
        desc.wireframe = self.wireframe;
        desc.draw_bounding_boxes = self.draw_bounding_boxes;
        desc.techniques = self.effective_techniques();
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Window title
    pub title: String,
    /// Initial window width
    pub width: u32,
    /// Initial window height
    pub height: u32,
    /// Target frames per second (0 for unlimited)
    pub target_fps: u32,
    /// Enable VSync
    pub vsync: bool,
    /// Where F12 writes the back buffer
    pub screenshot_path: String,
    pub render: RenderSettings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            title: String::from("godcore"),
            width: 1280,
            height: 720,
            target_fps: 60,
            vsync: true,
            screenshot_path: String::from("screenshot.png"),
            render: RenderSettings::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_ron_str(source: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(source)?)
    }

    pub fn from_ron_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_ron_str(&content)?;
        log::info!("Loaded config from {}", path.as_ref().display());
        Ok(config)
    }

    pub fn to_ron_string(&self) -> Result<String, ConfigError> {
        Ok(ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?)
    }

    /// Create a new config with a title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set window dimensions
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set target FPS
    pub fn with_target_fps(mut self, fps: u32) -> Self {
        self.target_fps = fps;
        self
    }

    /// Enable or disable VSync
    pub fn with_vsync(mut self, vsync: bool) -> Self {
        self.vsync = vsync;
        self
    }

    pub fn with_render(mut self, render: RenderSettings) -> Self {
        self.render = render;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::Camera;

    #[test]
    fn test_missing_fields_take_defaults() {
        let config = EngineConfig::from_ron_str("(title: \"viewer\", render: (wireframe: true))").unwrap();
        assert_eq!(config.title, "viewer");
        assert_eq!(config.width, 1280);
        assert!(config.render.wireframe);
        assert!((config.render.time_of_day - 12.0).abs() < 0.0001);
        assert_eq!(config.render.techniques, Technique::all());
    }

    #[test]
    fn test_technique_names_parse() {
        let config = EngineConfig::from_ron_str("(render: (techniques: \"SKY | WATER\"))").unwrap();
        assert_eq!(config.render.techniques, Technique::SKY | Technique::WATER);
    }

    #[test]
    fn test_round_trip_through_text() {
        let config = EngineConfig::default()
            .with_title("round trip")
            .with_size(640, 480)
            .with_vsync(false);
        let text = config.to_ron_string().unwrap();
        assert_eq!(EngineConfig::from_ron_str(&text).unwrap(), config);
    }

    #[test]
    fn test_parse_error_is_reported() {
        let error = EngineConfig::from_ron_str("(width: \"wide\")").unwrap_err();
        assert!(matches!(error, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file() {
        let error = EngineConfig::from_ron_file("does/not/exist.ron").unwrap_err();
        assert!(matches!(error, ConfigError::Io(_)));
    }

    #[test]
    fn test_debug_toggles_filter_techniques() {
        let mut settings = RenderSettings::default();
        let techniques = settings.effective_techniques();
        assert!(!techniques.contains(Technique::DEBUG_CROSS));
        assert!(!techniques.contains(Technique::TEST_MODEL));
        assert!(techniques.contains(Technique::ISLAND));

        settings.draw_debug_cross = true;
        settings.techniques = Technique::SKY;
        assert_eq!(settings.effective_techniques(), Technique::SKY);
    }

    #[test]
    fn test_apply_copies_settings() {
        let settings = RenderSettings {
            bump_map_strength: 0.25,
            cull_back: true,
            draw_bounding_boxes: true,
            ..Default::default()
        };
        let mut desc = DrawSceneDesc::new(Camera::new());
        settings.apply(&mut desc);
        assert!((desc.bump_map_strength - 0.25).abs() < 0.0001);
        assert!(desc.cull_back);
        assert!(desc.draw_bounding_boxes);
        assert!(!desc.techniques.contains(Technique::TEST_MODEL));
    }
}
