// Configuration merging with priority

use super::{ApiConfig, AppConfig, ExportConfig, ShareConfig};
use serde::{Deserialize, Serialize};

/// Partial configuration for merging
/// Uses Option<T> for all fields so a layer only overrides what it sets
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct PartialConfig {
    #[serde(default)]
    pub api: Option<PartialApiConfig>,
    #[serde(default)]
    pub export: Option<PartialExportConfig>,
    #[serde(default)]
    pub share: Option<PartialShareConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct PartialApiConfig {
    #[serde(rename = "baseUrl", alias = "base_url", default)]
    pub base_url: Option<String>,
    #[serde(rename = "timeoutSecs", alias = "timeout_secs", default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct PartialExportConfig {
    #[serde(rename = "backgroundColor", alias = "background_color", default)]
    pub background_color: Option<String>,
    #[serde(rename = "pngPixelRatio", alias = "png_pixel_ratio", default)]
    pub png_pixel_ratio: Option<f32>,
    #[serde(rename = "jpegPixelRatio", alias = "jpeg_pixel_ratio", default)]
    pub jpeg_pixel_ratio: Option<f32>,
    #[serde(rename = "jpegQuality", alias = "jpeg_quality", default)]
    pub jpeg_quality: Option<f32>,
    #[serde(rename = "pdfPixelRatio", alias = "pdf_pixel_ratio", default)]
    pub pdf_pixel_ratio: Option<f32>,
    #[serde(rename = "outputDir", alias = "output_dir", default)]
    pub output_dir: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct PartialShareConfig {
    #[serde(rename = "appUrl", alias = "app_url", default)]
    pub app_url: Option<String>,
    #[serde(rename = "promoText", alias = "promo_text", default)]
    pub promo_text: Option<String>,
    #[serde(rename = "emailSubject", alias = "email_subject", default)]
    pub email_subject: Option<String>,
}

/// Configuration merger
/// Priority order: CLI -> Explicit file -> Global -> Defaults
pub struct ConfigMerger {
    defaults: AppConfig,
    global: Option<PartialConfig>,
    file: Option<PartialConfig>,
    cli: Option<PartialConfig>,
}

impl ConfigMerger {
    /// Create a new config merger with defaults
    pub fn new() -> Self {
        Self {
            defaults: AppConfig::default(),
            global: None,
            file: None,
            cli: None,
        }
    }

    /// Set global config
    pub fn with_global(mut self, config: Option<PartialConfig>) -> Self {
        self.global = config;
        self
    }

    /// Set config from the explicit file
    pub fn with_file(mut self, config: Option<PartialConfig>) -> Self {
        self.file = config;
        self
    }

    /// Set CLI overrides
    pub fn with_cli(mut self, config: Option<PartialConfig>) -> Self {
        self.cli = config;
        self
    }

    /// Merge all configs with priority
    pub fn merge(&self) -> AppConfig {
        [&self.global, &self.file, &self.cli]
            .into_iter()
            .flatten()
            .fold(self.defaults.clone(), |base, layer| Self::apply(&base, layer))
    }

    /// Lay one partial config over a complete one
    pub fn apply(base: &AppConfig, layer: &PartialConfig) -> AppConfig {
        AppConfig {
            api: match layer.api {
                Some(ref p) => Self::merge_api(&base.api, p),
                None => base.api.clone(),
            },
            export: match layer.export {
                Some(ref p) => Self::merge_export(&base.export, p),
                None => base.export.clone(),
            },
            share: match layer.share {
                Some(ref p) => Self::merge_share(&base.share, p),
                None => base.share.clone(),
            },
        }
    }

    fn merge_api(base: &ApiConfig, over: &PartialApiConfig) -> ApiConfig {
        ApiConfig {
            base_url: over.base_url.clone().unwrap_or_else(|| base.base_url.clone()),
            timeout_secs: over.timeout_secs.unwrap_or(base.timeout_secs),
        }
    }

    fn merge_export(base: &ExportConfig, over: &PartialExportConfig) -> ExportConfig {
        ExportConfig {
            background_color: over
                .background_color
                .clone()
                .unwrap_or_else(|| base.background_color.clone()),
            png_pixel_ratio: over.png_pixel_ratio.unwrap_or(base.png_pixel_ratio),
            jpeg_pixel_ratio: over.jpeg_pixel_ratio.unwrap_or(base.jpeg_pixel_ratio),
            jpeg_quality: over.jpeg_quality.unwrap_or(base.jpeg_quality),
            pdf_pixel_ratio: over.pdf_pixel_ratio.unwrap_or(base.pdf_pixel_ratio),
            output_dir: over.output_dir.clone().or_else(|| base.output_dir.clone()),
        }
    }

    fn merge_share(base: &ShareConfig, over: &PartialShareConfig) -> ShareConfig {
        ShareConfig {
            app_url: over.app_url.clone().unwrap_or_else(|| base.app_url.clone()),
            promo_text: over.promo_text.clone().unwrap_or_else(|| base.promo_text.clone()),
            email_subject: over
                .email_subject
                .clone()
                .unwrap_or_else(|| base.email_subject.clone()),
        }
    }
}

impl Default for ConfigMerger {
    fn default() -> Self {
        Self::new()
    }
}
