//! An animated GIF as an in-memory value.

use tracing::debug;

use super::error::GifError;
use super::writer::GifWriter;
use super::DisposalMethod;
use crate::palette::Palette;

/// One palette-indexed frame covering the whole canvas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantizedFrame {
    pub width: u32,
    pub height: u32,
    /// Row-major palette indices, `width * height` of them.
    pub indices: Vec<u8>,
    pub palette: Palette,
    /// Palette index drawn as fully transparent.
    pub transparent_index: Option<u8>,
    pub disposal: DisposalMethod,
    /// Display time in hundredths of a second.
    pub delay: u16,
}

/// Canvas, optional global palette, loop setting and frames.
///
/// ```
/// use gif_quant::{DisposalMethod, GifDocument, Palette, QuantizedFrame, Rgba};
///
/// let palette = Palette::new(&[Rgba::opaque(0, 0, 0), Rgba::opaque(255, 255, 255)]).unwrap();
/// let mut doc = GifDocument::new(2, 1).with_repeat(Some(0));
/// doc.push(QuantizedFrame {
///     width: 2,
///     height: 1,
///     indices: vec![0, 1],
///     palette,
///     transparent_index: None,
///     disposal: DisposalMethod::Keep,
///     delay: 10,
/// });
/// let bytes = doc.encode().unwrap();
/// assert_eq!(&bytes[..6], b"GIF89a");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GifDocument {
    pub width: u32,
    pub height: u32,
    pub global_palette: Option<Palette>,
    /// `None` writes no looping extension (play once), `Some(0)` loops
    /// forever, `Some(n)` repeats `n` times.
    pub repeat: Option<u16>,
    pub frames: Vec<QuantizedFrame>,
}

impl GifDocument {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            global_palette: None,
            repeat: None,
            frames: Vec::new(),
        }
    }

    pub fn with_global_palette(mut self, palette: Palette) -> Self {
        self.global_palette = Some(palette);
        self
    }

    pub fn with_repeat(mut self, repeat: Option<u16>) -> Self {
        self.repeat = repeat;
        self
    }

    /// Append a frame. Checked when the document is encoded.
    pub fn push(&mut self, frame: QuantizedFrame) {
        self.frames.push(frame);
    }

    /// Check every frame against the canvas and its own palette.
    pub fn validate(&self) -> Result<(), GifError> {
        for (index, frame) in self.frames.iter().enumerate() {
            if frame.width != self.width || frame.height != self.height {
                return Err(GifError::FrameSizeMismatch {
                    frame: index,
                    width: frame.width,
                    height: frame.height,
                    canvas_width: self.width,
                    canvas_height: self.height,
                });
            }
        }
        Ok(())
    }

    /// Serialize to GIF89a bytes.
    pub fn encode(&self) -> Result<Vec<u8>, GifError> {
        self.validate()?;
        let mut writer = GifWriter::new();
        writer.write_header(self.width, self.height, self.global_palette.as_ref(), self.repeat)?;
        for frame in &self.frames {
            writer.write_frame(
                &frame.indices,
                &frame.palette,
                frame.transparent_index,
                frame.disposal,
                frame.delay,
            )?;
        }
        let bytes = writer.finish()?;
        debug!(
            width = self.width,
            height = self.height,
            frames = self.frames.len(),
            bytes = bytes.len(),
            "encoded GIF"
        );
        Ok(bytes)
    }
}
