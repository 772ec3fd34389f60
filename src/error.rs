use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by [`GifEncoder`](crate::api::GifEncoder) and the frame scheduler.
#[derive(Debug, Error)]
pub enum EncoderError {
    #[error("Resource exhausted: {0}")]
    ResourceExhausted(&'static str),

    #[error("No tokio runtime available: {0}")]
    Runtime(String),

    #[error("Frame job failed: {0}")]
    Job(String),

    #[error("Encoder already produced its GIF")]
    Finalized,

    #[error("No frames were added")]
    NoFrames,

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Frame error: {0}")]
    Frame(#[from] gif_quant::FrameError),

    #[error("Quantization error: {0}")]
    Quantize(#[from] gif_quant::QuantizeError),

    #[error("GIF error: {0}")]
    Gif(#[from] gif_quant::GifError),
}

/// Errors loading an [`EncoderConfig`](crate::models::EncoderConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid palette entry {index}: {reason}")]
    PaletteEntry { index: usize, reason: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Errors reading frame images.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("PNG decode error: {0}")]
    PngDecode(String),

    #[error("Unsupported PNG format: {0:?}")]
    UnsupportedFormat(png::ColorType),

    #[error("Frame error: {0}")]
    Frame(#[from] gif_quant::FrameError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<png::DecodingError> for RenderError {
    fn from(e: png::DecodingError) -> Self {
        RenderError::PngDecode(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoder_error_resource_exhausted() {
        let error = EncoderError::ResourceExhausted("encoder destroyed");
        assert_eq!(error.to_string(), "Resource exhausted: encoder destroyed");
    }

    #[test]
    fn test_encoder_error_job() {
        let error = EncoderError::Job("task panicked".to_string());
        assert_eq!(error.to_string(), "Frame job failed: task panicked");
    }

    #[test]
    fn test_encoder_error_from_gif_error() {
        let gif_error = gif_quant::GifError::InvalidPaletteSize(3);
        let error: EncoderError = gif_error.into();
        match error {
            EncoderError::Gif(_) => {}
            _ => panic!("Expected Gif variant"),
        }
    }

    #[test]
    fn test_config_error_palette_entry() {
        let error = ConfigError::PaletteEntry {
            index: 2,
            reason: "bad hex".to_string(),
        };
        assert_eq!(error.to_string(), "Invalid palette entry 2: bad hex");
    }

    #[test]
    fn test_render_error_unsupported_format() {
        let error = RenderError::UnsupportedFormat(png::ColorType::Indexed);
        assert_eq!(error.to_string(), "Unsupported PNG format: Indexed");
    }
}
