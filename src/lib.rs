//! Gifloom - animated GIF encoder
//!
//! Quantizes true-color frames concurrently and assembles them into a
//! GIF89a file. The color science and the bitstream live in the
//! `gif-quant` crate; this crate adds the encoder API, the worker pool,
//! configuration and PNG frame loading.

pub mod api;
pub mod error;
pub mod models;
pub mod rendering;
pub mod services;

pub use api::GifEncoder;
pub use error::{ConfigError, EncoderError, RenderError};
pub use models::{EncoderConfig, FrameOptions};
