//! PNG files as animation frames.

use std::io::Cursor;
use std::path::Path;

use gif_quant::Frame;

use crate::error::RenderError;

/// Read a PNG file into an RGBA8 frame.
pub fn load_png(path: impl AsRef<Path>) -> Result<Frame, RenderError> {
    let bytes = std::fs::read(path.as_ref())?;
    decode_png(&bytes)
}

/// Decode PNG bytes into an RGBA8 frame.
///
/// Palette, 16-bit and sub-byte images are normalized to 8 bits per
/// channel first; gray and RGB gain an opaque alpha channel.
pub fn decode_png(bytes: &[u8]) -> Result<Frame, RenderError> {
    let mut decoder = png::Decoder::new(Cursor::new(bytes));
    decoder.set_transformations(png::Transformations::normalize_to_color8());
    let mut reader = decoder.read_info()?;
    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buf)?;
    let data = &buf[..info.buffer_size()];

    let rgba: Vec<u8> = match info.color_type {
        png::ColorType::Rgba => data.to_vec(),
        png::ColorType::Rgb => data
            .chunks_exact(3)
            .flat_map(|px| [px[0], px[1], px[2], 255])
            .collect(),
        png::ColorType::GrayscaleAlpha => data
            .chunks_exact(2)
            .flat_map(|px| [px[0], px[0], px[0], px[1]])
            .collect(),
        png::ColorType::Grayscale => data.iter().flat_map(|&v| [v, v, v, 255]).collect(),
        other => return Err(RenderError::UnsupportedFormat(other)),
    };

    tracing::debug!(
        width = info.width,
        height = info.height,
        color_type = ?info.color_type,
        "Decoded PNG frame"
    );
    Ok(Frame::new(info.width, info.height, rgba)?)
}
