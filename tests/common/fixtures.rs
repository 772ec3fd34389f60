//! Test fixtures: frames, palettes and PNG files.

use std::path::{Path, PathBuf};

use gif_quant::{Frame, Rgba};
use gifloom::EncoderConfig;

pub const WHITE: Rgba = Rgba::opaque(255, 255, 255);
pub const BLACK: Rgba = Rgba::opaque(0, 0, 0);
pub const CLEAR: Rgba = Rgba::new(0, 0, 0, 0);

/// Config with a small, fixed worker count so tests behave the same on
/// every machine.
pub fn test_config() -> EncoderConfig {
    EncoderConfig {
        num_workers: 2,
        ..EncoderConfig::default()
    }
}

pub fn solid(width: u32, height: u32, color: Rgba) -> Frame {
    Frame::filled(width, height, color).unwrap()
}

/// Horizontal red ramp over a vertical blue ramp.
pub fn gradient(width: u32, height: u32) -> Frame {
    let mut pixels = Vec::with_capacity((width * height) as usize);
    for y in 0..height {
        for x in 0..width {
            pixels.push(Rgba::opaque(
                (x * 255 / width.max(2).saturating_sub(1)) as u8,
                64,
                (y * 255 / height.max(2).saturating_sub(1)) as u8,
            ));
        }
    }
    Frame::from_pixels(width, height, &pixels).unwrap()
}

/// A disc of `color` on a transparent background.
pub fn disc(size: u32, color: Rgba) -> Frame {
    let r = size as f64 / 2.0;
    let mut pixels = Vec::with_capacity((size * size) as usize);
    for y in 0..size {
        for x in 0..size {
            let dx = x as f64 + 0.5 - r;
            let dy = y as f64 + 0.5 - r;
            pixels.push(if dx * dx + dy * dy <= r * r { color } else { CLEAR });
        }
    }
    Frame::from_pixels(size, size, &pixels).unwrap()
}

/// Write `frame` as an RGBA PNG under `dir`.
pub fn write_png(dir: &Path, name: &str, frame: &Frame) -> PathBuf {
    let path = dir.join(name);
    let file = std::fs::File::create(&path).unwrap();
    let mut encoder = png::Encoder::new(std::io::BufWriter::new(file), frame.width(), frame.height());
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header().unwrap();
    writer.write_image_data(frame.data()).unwrap();
    path
}
