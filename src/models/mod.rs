pub mod config;
pub mod frame_options;

pub use config::{delay_centiseconds, palette_colors, EncoderConfig, PaletteEntry, CONFIG_ENV_VAR};
pub use frame_options::FrameOptions;
