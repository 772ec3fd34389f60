use std::path::{Path, PathBuf};

use gif_quant::quantize::HistogramMethod;
use gif_quant::{DisposalMethod, DistanceMetric, DitherMode, DitherOptions, QuantizerKind, Rgba};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Environment variable naming a config file when `--config` is absent.
pub const CONFIG_ENV_VAR: &str = "GIFLOOM_CONFIG";

/// Encoder configuration, loaded from YAML or built in code.
///
/// Every field has a default, so an empty document is a valid config.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct EncoderConfig {
    /// Canvas width; taken from the first frame when unset
    pub width: Option<u32>,

    /// Canvas height; taken from the first frame when unset
    pub height: Option<u32>,

    /// Dithering algorithm for frames without an override
    pub dithering: DitherMode,

    /// Tuning for the error diffusion and Riemersma ditherers
    #[serde(alias = "dither_options")]
    pub dither_options: DitherOptions,

    /// Fixed palette; disables palette building and transparency
    pub palette: Option<Vec<PaletteEntry>>,

    /// Disposal method for frames without an override
    pub disposal: DisposalMethod,

    /// Pixels with alpha below `cut_off * 255` become transparent
    #[serde(alias = "transparency_cut_off")]
    pub transparency_cut_off: f64,

    /// Frames processed concurrently
    #[serde(alias = "num_workers")]
    pub num_workers: usize,

    /// Palette building strategy
    pub quantizer: QuantizerKind,

    /// Histogram method for the `rgb-quant` strategy
    pub histogram: HistogramMethod,

    /// Color distance metric
    pub distance: DistanceMetric,

    /// Palette size target, 2 to 256
    #[serde(alias = "max_colors")]
    pub max_colors: usize,

    /// Frame delay in seconds
    pub delay: f64,

    /// Loop count: `null` plays once, 0 loops forever
    pub repeat: Option<u16>,
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(2)
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            width: None,
            height: None,
            dithering: DitherMode::default(),
            dither_options: DitherOptions::default(),
            palette: None,
            disposal: DisposalMethod::default(),
            transparency_cut_off: 0.5,
            num_workers: default_workers(),
            quantizer: QuantizerKind::default(),
            histogram: HistogramMethod::default(),
            distance: DistanceMetric::default(),
            max_colors: 256,
            delay: 0.1,
            repeat: Some(0),
        }
    }
}

/// A palette color: `0xRRGGBB` as an integer or a `#RRGGBB` string.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum PaletteEntry {
    Rgb(u32),
    Hex(String),
}

impl PaletteEntry {
    pub fn to_rgba(&self, index: usize) -> Result<Rgba, ConfigError> {
        match self {
            PaletteEntry::Rgb(value) if *value <= 0xFF_FFFF => Ok(Rgba::from_rgb_hex(*value)),
            PaletteEntry::Rgb(value) => Err(ConfigError::PaletteEntry {
                index,
                reason: format!("0x{value:X} exceeds 0xFFFFFF"),
            }),
            PaletteEntry::Hex(text) => text.parse().map_err(|e: gif_quant::ParseColorError| {
                ConfigError::PaletteEntry {
                    index,
                    reason: e.to_string(),
                }
            }),
        }
    }
}

impl From<Rgba> for PaletteEntry {
    fn from(c: Rgba) -> Self {
        PaletteEntry::Rgb(c.to_rgb_hex())
    }
}

/// Resolve every entry of a configured palette.
pub fn palette_colors(entries: &[PaletteEntry]) -> Result<Vec<Rgba>, ConfigError> {
    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| entry.to_rgba(i))
        .collect()
}

/// Seconds to GIF delay units (hundredths of a second), rounded.
pub fn delay_centiseconds(seconds: f64) -> u16 {
    (seconds * 100.0).round().clamp(0.0, u16::MAX as f64) as u16
}

impl EncoderConfig {
    /// Parse a YAML document.
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        // An empty file deserializes as null, not as an empty mapping
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a YAML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml_str(&content)?;
        tracing::info!(
            path = %path.display(),
            quantizer = %config.quantizer,
            dithering = %config.dithering,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// The config file to use: the explicit path, else `$GIFLOOM_CONFIG`.
    pub fn resolve_path(explicit: Option<PathBuf>) -> Option<PathBuf> {
        explicit.or_else(|| {
            std::env::var_os(CONFIG_ENV_VAR)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
        })
    }

    /// Load the resolved config file, or fall back to defaults.
    pub fn load_or_default(explicit: Option<PathBuf>) -> Result<Self, ConfigError> {
        match Self::resolve_path(explicit) {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    /// Reject values no encoder could honor.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(2..=256).contains(&self.max_colors) {
            return Err(ConfigError::InvalidValue {
                field: "max-colors",
                reason: format!("{} is outside 2..=256", self.max_colors),
            });
        }
        if !(0.0..=1.0).contains(&self.transparency_cut_off) {
            return Err(ConfigError::InvalidValue {
                field: "transparency-cut-off",
                reason: format!("{} is outside 0..=1", self.transparency_cut_off),
            });
        }
        if !self.delay.is_finite() || self.delay < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "delay",
                reason: format!("{} is not a non-negative number of seconds", self.delay),
            });
        }
        if let Some(entries) = &self.palette {
            palette_colors(entries)?;
        }
        Ok(())
    }
}
