//! Sequential GIF89a block writer.

use tracing::trace;

use super::error::{GifError, WriterStage};
use super::lzw;
use super::{
    DisposalMethod, APPLICATION_LABEL, EXTENSION_INTRODUCER, GRAPHIC_CONTROL_LABEL,
    IMAGE_SEPARATOR, MAX_SUB_BLOCK, NETSCAPE_ID, SIGNATURE, TRAILER,
};
use crate::palette::{is_valid_size, Palette};

/// Writes a GIF stream block by block.
///
/// Calls must follow `write_header`, any number of `write_frame`, then
/// `finish`. Anything else fails with [`GifError::InvalidState`]. Every
/// check runs before bytes are appended, so a failed call leaves the
/// buffer as it was.
#[derive(Debug)]
pub struct GifWriter {
    out: Vec<u8>,
    stage: WriterStage,
    width: u16,
    height: u16,
    global: Option<Palette>,
    frames: usize,
}

impl Default for GifWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl GifWriter {
    pub fn new() -> Self {
        Self {
            out: Vec::new(),
            stage: WriterStage::Start,
            width: 0,
            height: 0,
            global: None,
            frames: 0,
        }
    }

    /// Current stage.
    pub fn stage(&self) -> WriterStage {
        self.stage
    }

    /// Write the signature, logical screen descriptor, optional global color
    /// table and, when `repeat` is set, the NETSCAPE2.0 looping extension.
    ///
    /// `repeat` of `Some(0)` loops forever.
    pub fn write_header(
        &mut self,
        width: u32,
        height: u32,
        global: Option<&Palette>,
        repeat: Option<u16>,
    ) -> Result<(), GifError> {
        self.expect_stage(WriterStage::Start, "write header")?;
        let width = check_dimension("width", width)?;
        let height = check_dimension("height", height)?;
        if let Some(palette) = global {
            check_palette(palette)?;
        }

        self.out.extend_from_slice(SIGNATURE);
        self.out.extend_from_slice(&width.to_le_bytes());
        self.out.extend_from_slice(&height.to_le_bytes());
        match global {
            Some(palette) => {
                let size = palette.bits() - 1;
                // global table flag, color resolution, table size
                self.out.push(0x80 | (size << 4) | size);
                self.out.push(0); // background index
                self.out.push(0); // pixel aspect ratio
                self.out.extend_from_slice(&palette.rgb_bytes());
            }
            None => self.out.extend_from_slice(&[0x70, 0, 0]),
        }

        if let Some(count) = repeat {
            self.out.push(EXTENSION_INTRODUCER);
            self.out.push(APPLICATION_LABEL);
            self.out.push(NETSCAPE_ID.len() as u8);
            self.out.extend_from_slice(NETSCAPE_ID);
            self.out.extend_from_slice(&[3, 1]);
            self.out.extend_from_slice(&count.to_le_bytes());
            self.out.push(0);
        }

        self.width = width;
        self.height = height;
        self.global = global.cloned();
        self.stage = WriterStage::Frames;
        trace!(width, height, global = global.is_some(), ?repeat, "wrote GIF header");
        Ok(())
    }

    /// Validate and append one full-canvas frame.
    ///
    /// The frame's palette goes out as a local color table unless it equals
    /// the global one.
    pub fn write_frame(
        &mut self,
        indices: &[u8],
        palette: &Palette,
        transparent_index: Option<u8>,
        disposal: DisposalMethod,
        delay: u16,
    ) -> Result<(), GifError> {
        self.expect_stage(WriterStage::Frames, "write frame")?;
        let frame = self.frames;
        check_palette(palette)?;

        let expected = self.width as usize * self.height as usize;
        if indices.len() != expected {
            return Err(GifError::IndexCountMismatch {
                frame,
                expected,
                actual: indices.len(),
            });
        }
        if let Some(position) = indices.iter().position(|&i| i as usize >= palette.len()) {
            return Err(GifError::IndexOutOfRange {
                frame,
                position,
                index: indices[position],
                palette_len: palette.len(),
            });
        }
        if let Some(index) = transparent_index {
            if index as usize >= palette.len() {
                return Err(GifError::TransparencyIndexOutOfRange {
                    frame,
                    index,
                    palette_len: palette.len(),
                });
            }
        }

        if transparent_index.is_some() || disposal != DisposalMethod::Unspecified || delay != 0 {
            self.write_graphic_control(transparent_index, disposal, delay);
        }

        let local = self.global.as_ref() != Some(palette);
        self.out.push(IMAGE_SEPARATOR);
        self.out.extend_from_slice(&[0, 0, 0, 0]);
        self.out.extend_from_slice(&self.width.to_le_bytes());
        self.out.extend_from_slice(&self.height.to_le_bytes());
        if local {
            self.out.push(0x80 | (palette.bits() - 1));
            self.out.extend_from_slice(&palette.rgb_bytes());
        } else {
            self.out.push(0);
        }

        let min_code_size = lzw::min_code_size(palette.len());
        let data = lzw::encode(indices, min_code_size);
        self.out.push(min_code_size);
        write_sub_blocks(&mut self.out, &data);

        self.frames += 1;
        trace!(frame, local, bytes = data.len(), "wrote GIF frame");
        Ok(())
    }

    /// Append the trailer and hand back the finished stream.
    pub fn finish(&mut self) -> Result<Vec<u8>, GifError> {
        self.expect_stage(WriterStage::Frames, "finish")?;
        self.out.push(TRAILER);
        self.stage = WriterStage::Finished;
        Ok(std::mem::take(&mut self.out))
    }

    fn write_graphic_control(&mut self, transparent: Option<u8>, disposal: DisposalMethod, delay: u16) {
        let flags = (disposal.code() << 2) | u8::from(transparent.is_some());
        self.out.extend_from_slice(&[EXTENSION_INTRODUCER, GRAPHIC_CONTROL_LABEL, 4, flags]);
        self.out.extend_from_slice(&delay.to_le_bytes());
        self.out.push(transparent.unwrap_or(0));
        self.out.push(0);
    }

    fn expect_stage(&self, expected: WriterStage, operation: &'static str) -> Result<(), GifError> {
        if self.stage == expected {
            Ok(())
        } else {
            Err(GifError::InvalidState {
                operation,
                stage: self.stage,
            })
        }
    }
}

fn check_dimension(field: &'static str, value: u32) -> Result<u16, GifError> {
    match u16::try_from(value) {
        Ok(v) if v > 0 => Ok(v),
        _ => Err(GifError::InvalidDimension { field, value }),
    }
}

fn check_palette(palette: &Palette) -> Result<(), GifError> {
    if is_valid_size(palette.len()) {
        Ok(())
    } else {
        Err(GifError::InvalidPaletteSize(palette.len()))
    }
}

/// Split `data` into length-prefixed sub-blocks and add the terminator.
fn write_sub_blocks(out: &mut Vec<u8>, data: &[u8]) {
    for chunk in data.chunks(MAX_SUB_BLOCK) {
        out.push(chunk.len() as u8);
        out.extend_from_slice(chunk);
    }
    out.push(0);
}
