// Configuration module

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::watermark::font::{FontSource, DEFAULT_FONT_NAME};
use crate::watermark::grid::GridSpec;
use crate::watermark::image_pass::ImageTilingParams;

/// Tool configuration. Every field has a default, so an empty file is valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub watermark: WatermarkConfig,
    #[serde(default)]
    pub font: FontConfig,
    #[serde(default)]
    pub pdf: PdfConfig,
    #[serde(default)]
    pub image: ImageConfig,
}

fn default_angle() -> f32 {
    -35.0
}

fn default_opacity() -> f32 {
    0.18
}

/// Rotation and opacity of the stamped text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatermarkConfig {
    /// Degrees, counter-clockwise (default: -35)
    #[serde(default = "default_angle")]
    pub angle: f32,

    /// 0.0 to 1.0 (default: 0.18)
    #[serde(default = "default_opacity")]
    pub opacity: f32,
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            angle: default_angle(),
            opacity: default_opacity(),
        }
    }
}

fn default_font_name() -> Option<String> {
    Some(DEFAULT_FONT_NAME.to_string())
}

/// Preferred font; the embedded font is used when neither is found
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontConfig {
    /// Explicit font file, tried first
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// File name searched in the system font directories
    #[serde(default = "default_font_name")]
    pub name: Option<String>,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            path: None,
            name: default_font_name(),
        }
    }
}

impl FontConfig {
    pub fn source(&self) -> FontSource {
        FontSource {
            path: self.path.clone(),
            name: self.name.clone(),
        }
    }
}

fn default_pdf_font_size() -> f32 {
    28.0
}

fn default_pdf_x_step() -> f64 {
    320.0
}

fn default_pdf_y_step() -> f64 {
    240.0
}

fn default_pdf_margin() -> f64 {
    36.0
}

/// PDF layout, in points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PdfConfig {
    #[serde(default = "default_pdf_font_size")]
    pub font_size: f32,
    #[serde(default = "default_pdf_x_step")]
    pub x_step: f64,
    #[serde(default = "default_pdf_y_step")]
    pub y_step: f64,
    #[serde(default = "default_pdf_margin")]
    pub margin: f64,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            font_size: default_pdf_font_size(),
            x_step: default_pdf_x_step(),
            y_step: default_pdf_y_step(),
            margin: default_pdf_margin(),
        }
    }
}

impl PdfConfig {
    pub fn grid_spec(&self) -> GridSpec {
        GridSpec::new(self.x_step, self.y_step, self.margin)
    }
}

fn default_font_size_ratio() -> f64 {
    0.035
}

fn default_x_step_ratio() -> f64 {
    0.28
}

fn default_y_step_ratio() -> f64 {
    0.22
}

fn default_margin_ratio() -> f64 {
    0.04
}

fn default_quality() -> u8 {
    92
}

/// Image layout as fractions of the image size, plus JPEG quality
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageConfig {
    #[serde(default = "default_font_size_ratio")]
    pub font_size_ratio: f64,
    #[serde(default = "default_x_step_ratio")]
    pub x_step_ratio: f64,
    #[serde(default = "default_y_step_ratio")]
    pub y_step_ratio: f64,
    #[serde(default = "default_margin_ratio")]
    pub margin_ratio: f64,
    /// JPEG quality, 1-100 (default: 92)
    #[serde(default = "default_quality")]
    pub quality: u8,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            font_size_ratio: default_font_size_ratio(),
            x_step_ratio: default_x_step_ratio(),
            y_step_ratio: default_y_step_ratio(),
            margin_ratio: default_margin_ratio(),
            quality: default_quality(),
        }
    }
}

impl ImageConfig {
    pub fn tiling_params(&self) -> ImageTilingParams {
        ImageTilingParams {
            font_size_ratio: self.font_size_ratio,
            x_step_ratio: self.x_step_ratio,
            y_step_ratio: self.y_step_ratio,
            margin_ratio: self.margin_ratio,
        }
    }
}

impl Config {
    pub fn from_yaml_with_env(yaml: &str) -> Result<Self, String> {
        // Replace ${VAR_NAME} with environment variable values
        let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").map_err(|e| e.to_string())?;

        // First, check that all referenced environment variables exist
        for caps in re.captures_iter(yaml) {
            let var_name = &caps[1];
            std::env::var(var_name).map_err(|_| {
                format!(
                    "Environment variable '{}' is referenced but not set",
                    var_name
                )
            })?;
        }

        let substituted = re.replace_all(yaml, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_default()
        });

        // An empty or comment-only document means "all defaults"
        let value: serde_yaml::Value =
            serde_yaml::from_str(&substituted).map_err(|e| e.to_string())?;
        if value.is_null() {
            return Ok(Self::default());
        }

        serde_yaml::from_value(value).map_err(|e| e.to_string())
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;
        Self::from_yaml_with_env(&yaml)
    }

    pub fn validate(&self) -> Result<(), String> {
        let wm = &self.watermark;
        if !wm.angle.is_finite() {
            return Err(format!("watermark.angle must be finite, got {}", wm.angle));
        }
        if !(0.0..=1.0).contains(&wm.opacity) {
            return Err(format!(
                "watermark.opacity must be between 0 and 1, got {}",
                wm.opacity
            ));
        }

        let pdf = &self.pdf;
        if !(pdf.font_size.is_finite() && pdf.font_size > 0.0) {
            return Err(format!(
                "pdf.font_size must be positive, got {}",
                pdf.font_size
            ));
        }
        require_positive("pdf.x_step", pdf.x_step)?;
        require_positive("pdf.y_step", pdf.y_step)?;
        require_non_negative("pdf.margin", pdf.margin)?;

        let image = &self.image;
        require_positive("image.font_size_ratio", image.font_size_ratio)?;
        require_positive("image.x_step_ratio", image.x_step_ratio)?;
        require_positive("image.y_step_ratio", image.y_step_ratio)?;
        require_non_negative("image.margin_ratio", image.margin_ratio)?;
        if !(1..=100).contains(&image.quality) {
            return Err(format!(
                "image.quality must be between 1 and 100, got {}",
                image.quality
            ));
        }

        if let Some(path) = &self.font.path {
            if path.as_os_str().is_empty() {
                return Err("font.path cannot be empty".to_string());
            }
        }

        Ok(())
    }
}

fn require_positive(name: &str, value: f64) -> Result<(), String> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(format!("{} must be a positive number, got {}", name, value))
    }
}

fn require_non_negative(name: &str, value: f64) -> Result<(), String> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(format!("{} must be zero or positive, got {}", name, value))
    }
}
