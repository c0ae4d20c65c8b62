//! Configuration for signing sessions
//!
//! Loaded from TOML. Every field has a default, so an empty file (or no file
//! at all) yields a usable configuration.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::capture::{InkColor, InkStyle};
use crate::coords::PixelSize;
use crate::error::SignError;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignerConfig {
    #[serde(default)]
    pub viewport: ViewportConfig,
    #[serde(default)]
    pub placement: PlacementConfig,
    #[serde(default)]
    pub ink: InkConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

impl SignerConfig {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read, the TOML is
    /// malformed, or a value fails validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SignError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            SignError::ConfigError(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_str(&content)
    }

    /// Parse and validate configuration from a TOML string
    ///
    /// ```
    /// use inksign_core::SignerConfig;
    ///
    /// let config = SignerConfig::from_str("[viewport]\nscale = 2.0\n").unwrap();
    /// assert_eq!(config.viewport.scale, 2.0);
    /// assert_eq!(config.placement.width, 150.0);
    /// ```
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self, SignError> {
        let config: Self =
            toml::from_str(s).map_err(|e| SignError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SignError> {
        fn positive(name: &str, value: f64) -> Result<(), SignError> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(SignError::ConfigError(format!(
                    "{} must be positive and finite, got {}",
                    name, value
                )))
            }
        }

        positive("viewport.scale", self.viewport.scale)?;
        positive("placement.width", self.placement.width)?;
        positive("placement.height", self.placement.height)?;
        positive("ink.width", self.ink.width as f64)?;
        positive("ink.pixel_ratio", self.ink.pixel_ratio as f64)?;

        if self.ink.canvas_width == 0 || self.ink.canvas_height == 0 {
            return Err(SignError::ConfigError(format!(
                "ink canvas must be non-empty, got {}x{}",
                self.ink.canvas_width, self.ink.canvas_height
            )));
        }
        if InkColor::from_hex(&self.ink.color).is_none() {
            return Err(SignError::ConfigError(format!(
                "ink.color must be #RRGGBB, got {:?}",
                self.ink.color
            )));
        }
        if self.export.file_name.trim().is_empty() {
            return Err(SignError::ConfigError(
                "export.file_name must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Default size of a newly placed signature
    pub fn placement_size(&self) -> PixelSize {
        PixelSize::new(self.placement.width, self.placement.height)
    }

    /// Ink style for new strokes. An unparseable color falls back to black.
    pub fn ink_style(&self) -> InkStyle {
        InkStyle {
            color: InkColor::from_hex(&self.ink.color).unwrap_or_default(),
            width: self.ink.width,
        }
    }
}

/// Page render settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewportConfig {
    /// Pixels per PDF point (default: 1.5)
    #[serde(default = "default_scale")]
    pub scale: f64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            scale: default_scale(),
        }
    }
}

fn default_scale() -> f64 {
    1.5
}

/// Size given to newly placed signatures, in page pixels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementConfig {
    #[serde(default = "default_placement_width")]
    pub width: f64,
    #[serde(default = "default_placement_height")]
    pub height: f64,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            width: default_placement_width(),
            height: default_placement_height(),
        }
    }
}

fn default_placement_width() -> f64 {
    150.0
}

fn default_placement_height() -> f64 {
    50.0
}

/// Capture surface and stroke settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InkConfig {
    /// Stroke color as `#RRGGBB` (default: black)
    #[serde(default = "default_ink_color")]
    pub color: String,
    /// Stroke width in canvas pixels (default: 2.0)
    #[serde(default = "default_ink_width")]
    pub width: f32,
    #[serde(default = "default_canvas_width")]
    pub canvas_width: u32,
    #[serde(default = "default_canvas_height")]
    pub canvas_height: u32,
    /// Raster density multiplier, like a display's device pixel ratio
    #[serde(default = "default_pixel_ratio")]
    pub pixel_ratio: f32,
}

impl Default for InkConfig {
    fn default() -> Self {
        Self {
            color: default_ink_color(),
            width: default_ink_width(),
            canvas_width: default_canvas_width(),
            canvas_height: default_canvas_height(),
            pixel_ratio: default_pixel_ratio(),
        }
    }
}

fn default_ink_color() -> String {
    "#000000".to_string()
}

fn default_ink_width() -> f32 {
    2.0
}

fn default_canvas_width() -> u32 {
    500
}

fn default_canvas_height() -> u32 {
    200
}

fn default_pixel_ratio() -> f32 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Name suggested for the signed output
    #[serde(default = "default_file_name")]
    pub file_name: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            file_name: default_file_name(),
        }
    }
}

fn default_file_name() -> String {
    "signed-document.pdf".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = SignerConfig::from_str("").unwrap();
        assert_eq!(config, SignerConfig::default());
        assert_eq!(config.viewport.scale, 1.5);
        assert_eq!(config.placement_size(), PixelSize::new(150.0, 50.0));
        assert_eq!(config.ink.canvas_width, 500);
        assert_eq!(config.ink.canvas_height, 200);
        assert_eq!(config.export.file_name, "signed-document.pdf");
    }

    #[test]
    fn test_partial_sections() {
        let toml = r##"
            [placement]
            width = 200.0

            [ink]
            color = "#1a2b3c"
            pixel_ratio = 2.0
        "##;
        let config = SignerConfig::from_str(toml).unwrap();
        assert_eq!(config.placement.width, 200.0);
        assert_eq!(config.placement.height, 50.0);
        assert_eq!(
            config.ink_style(),
            InkStyle {
                color: InkColor {
                    r: 0x1a,
                    g: 0x2b,
                    b: 0x3c
                },
                width: 2.0,
            }
        );
        assert_eq!(config.ink.pixel_ratio, 2.0);
    }

    #[test]
    fn test_rejects_zero_scale() {
        let err = SignerConfig::from_str("[viewport]\nscale = 0.0\n").unwrap_err();
        assert!(matches!(err, SignError::ConfigError(_)));
    }

    #[test]
    fn test_rejects_bad_color() {
        let err = SignerConfig::from_str("[ink]\ncolor = \"blue\"\n").unwrap_err();
        assert!(matches!(err, SignError::ConfigError(_)));
    }

    #[test]
    fn test_rejects_empty_canvas() {
        let err = SignerConfig::from_str("[ink]\ncanvas_height = 0\n").unwrap_err();
        assert!(matches!(err, SignError::ConfigError(_)));
    }

    #[test]
    fn test_rejects_malformed_toml() {
        let err = SignerConfig::from_str("[viewport\nscale = 1").unwrap_err();
        assert!(matches!(err, SignError::ConfigError(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = SignerConfig::from_file("/nonexistent/inksign.toml").unwrap_err();
        assert!(matches!(err, SignError::ConfigError(_)));
    }
}
