// Application configuration: backend endpoint, export defaults and share texts

pub mod loader;
pub mod merger;

pub use loader::ConfigLoader;
pub use merger::{
    ConfigMerger, PartialApiConfig, PartialConfig, PartialExportConfig, PartialShareConfig,
};

use serde::{Deserialize, Serialize};

/// Lowest pixel density accepted for raster exports
pub const MIN_RASTER_PIXEL_RATIO: f32 = 3.0;

/// AI UML configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AppConfig {
    /// Backend API settings
    #[serde(default)]
    pub api: ApiConfig,
    /// Diagram export settings
    #[serde(default)]
    pub export: ExportConfig,
    /// Share link settings
    #[serde(default)]
    pub share: ShareConfig,
}

impl AppConfig {
    /// Reject settings the export pipeline cannot honour
    pub fn validate(&self) -> anyhow::Result<()> {
        self.export.validate()
    }
}

/// Backend API configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiConfig {
    /// Base URL of the project store, including the `/api` prefix
    #[serde(rename = "baseUrl", alias = "base_url", default = "default_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(rename = "timeoutSecs", alias = "timeout_secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String { "http://localhost:8080/api".to_string() }
fn default_timeout_secs() -> u64 { 60 }

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Export configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExportConfig {
    /// Opaque canvas color behind captures; the diagram theme is drawn for a dark canvas
    #[serde(rename = "backgroundColor", alias = "background_color", default = "default_background")]
    pub background_color: String,
    /// Pixel density for PNG exports
    #[serde(rename = "pngPixelRatio", alias = "png_pixel_ratio", default = "default_png_ratio")]
    pub png_pixel_ratio: f32,
    /// Pixel density for JPEG exports
    #[serde(rename = "jpegPixelRatio", alias = "jpeg_pixel_ratio", default = "default_jpeg_ratio")]
    pub jpeg_pixel_ratio: f32,
    /// JPEG encoder quality in (0, 1]
    #[serde(rename = "jpegQuality", alias = "jpeg_quality", default = "default_jpeg_quality")]
    pub jpeg_quality: f32,
    /// Pixel density of the bitmap embedded in PDF exports
    #[serde(rename = "pdfPixelRatio", alias = "pdf_pixel_ratio", default = "default_pdf_ratio")]
    pub pdf_pixel_ratio: f32,
    /// Directory delivered files are written to (defaults to the download dir)
    #[serde(rename = "outputDir", alias = "output_dir", default)]
    pub output_dir: Option<String>,
}

fn default_background() -> String { "#020617".to_string() }
fn default_png_ratio() -> f32 { 4.0 }
fn default_jpeg_ratio() -> f32 { 3.0 }
fn default_jpeg_quality() -> f32 { 1.0 }
fn default_pdf_ratio() -> f32 { 4.0 }

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            background_color: default_background(),
            png_pixel_ratio: default_png_ratio(),
            jpeg_pixel_ratio: default_jpeg_ratio(),
            jpeg_quality: default_jpeg_quality(),
            pdf_pixel_ratio: default_pdf_ratio(),
            output_dir: None,
        }
    }
}

impl ExportConfig {
    fn validate(&self) -> anyhow::Result<()> {
        if !is_opaque_hex_color(&self.background_color) {
            anyhow::bail!(
                "export.backgroundColor must be an opaque #rrggbb color, got '{}'",
                self.background_color
            );
        }
        for (name, ratio) in [
            ("pngPixelRatio", self.png_pixel_ratio),
            ("jpegPixelRatio", self.jpeg_pixel_ratio),
            ("pdfPixelRatio", self.pdf_pixel_ratio),
        ] {
            if ratio < MIN_RASTER_PIXEL_RATIO {
                anyhow::bail!(
                    "export.{} must be at least {}, got {}",
                    name,
                    MIN_RASTER_PIXEL_RATIO,
                    ratio
                );
            }
        }
        if !(self.jpeg_quality > 0.0 && self.jpeg_quality <= 1.0) {
            anyhow::bail!(
                "export.jpegQuality must be in (0, 1], got {}",
                self.jpeg_quality
            );
        }
        Ok(())
    }

    /// Resolved output directory for delivered files
    pub fn output_dir(&self) -> std::path::PathBuf {
        self.output_dir
            .as_ref()
            .map(std::path::PathBuf::from)
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| std::path::PathBuf::from("."))
    }
}

/// Share configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShareConfig {
    /// Public origin of the web app; project pages live at `{appUrl}/project/{id}`
    #[serde(rename = "appUrl", alias = "app_url", default = "default_app_url")]
    pub app_url: String,
    /// Promotional text embedded in social share links
    #[serde(rename = "promoText", alias = "promo_text", default = "default_promo_text")]
    pub promo_text: String,
    /// Subject line of the e-mail share
    #[serde(rename = "emailSubject", alias = "email_subject", default = "default_email_subject")]
    pub email_subject: String,
}

fn default_app_url() -> String { "http://localhost:3000".to_string() }
fn default_promo_text() -> String {
    "Check out my system architecture designed with AI UML!".to_string()
}
fn default_email_subject() -> String { "AI Architecture Design".to_string() }

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            app_url: default_app_url(),
            promo_text: default_promo_text(),
            email_subject: default_email_subject(),
        }
    }
}

impl ShareConfig {
    /// Canonical page URL of a project workspace
    pub fn project_url(&self, project_id: u64) -> String {
        format!("{}/project/{}", self.app_url.trim_end_matches('/'), project_id)
    }
}

fn is_opaque_hex_color(value: &str) -> bool {
    value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit())
}
