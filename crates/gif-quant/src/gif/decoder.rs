//! GIF87a/GIF89a parser.
//!
//! Produces raw indices and color tables per frame; compositing frames onto
//! a canvas is left to the caller.

use super::error::DecodeError;
use super::lzw::{self, LzwStats};
use super::{
    DisposalMethod, APPLICATION_LABEL, EXTENSION_INTRODUCER, GRAPHIC_CONTROL_LABEL,
    IMAGE_SEPARATOR, NETSCAPE_ID, SIGNATURE, SIGNATURE_87A, TRAILER,
};
use crate::color::Rgba;

/// A parsed GIF file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedGif {
    pub width: u16,
    pub height: u16,
    pub global_palette: Option<Vec<Rgba>>,
    /// Loop count from the NETSCAPE2.0 extension, if present.
    pub repeat: Option<u16>,
    pub frames: Vec<DecodedFrame>,
}

/// One image block with the Graphics Control Extension that preceded it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFrame {
    pub left: u16,
    pub top: u16,
    pub width: u16,
    pub height: u16,
    /// Row-major indices, de-interlaced.
    pub indices: Vec<u8>,
    /// The color table in effect: the local one, or else the global one.
    pub palette: Vec<Rgba>,
    pub has_local_palette: bool,
    pub transparent_index: Option<u8>,
    pub disposal: DisposalMethod,
    pub delay: u16,
    pub interlaced: bool,
    pub min_code_size: u8,
    pub lzw: LzwStats,
}

#[derive(Debug, Clone, Copy, Default)]
struct GraphicControl {
    transparent_index: Option<u8>,
    disposal: DisposalMethod,
    delay: u16,
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn u8(&mut self, context: &'static str) -> Result<u8, DecodeError> {
        let b = *self
            .data
            .get(self.pos)
            .ok_or(DecodeError::UnexpectedEof(context))?;
        self.pos += 1;
        Ok(b)
    }

    fn u16(&mut self, context: &'static str) -> Result<u16, DecodeError> {
        let bytes = self.take(2, context)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    fn take(&mut self, len: usize, context: &'static str) -> Result<&'a [u8], DecodeError> {
        let end = self.pos + len;
        let slice = self
            .data
            .get(self.pos..end)
            .ok_or(DecodeError::UnexpectedEof(context))?;
        self.pos = end;
        Ok(slice)
    }

    fn color_table(&mut self, bits: u8) -> Result<Vec<Rgba>, DecodeError> {
        let len = 1usize << (bits + 1);
        let bytes = self.take(len * 3, "color table")?;
        Ok(bytes
            .chunks_exact(3)
            .map(|c| Rgba::opaque(c[0], c[1], c[2]))
            .collect())
    }

    fn sub_blocks(&mut self, context: &'static str) -> Result<Vec<u8>, DecodeError> {
        let mut out = Vec::new();
        loop {
            let len = self.u8(context)? as usize;
            if len == 0 {
                return Ok(out);
            }
            out.extend_from_slice(self.take(len, context)?);
        }
    }

    fn skip_sub_blocks(&mut self, context: &'static str) -> Result<(), DecodeError> {
        loop {
            let len = self.u8(context)? as usize;
            if len == 0 {
                return Ok(());
            }
            self.take(len, context)?;
        }
    }
}

/// Parse a complete GIF byte stream.
///
/// A missing trailer is tolerated; the stream simply ends after the last
/// complete block.
pub fn decode(bytes: &[u8]) -> Result<DecodedGif, DecodeError> {
    let mut r = Reader { data: bytes, pos: 0 };
    let signature = r.take(6, "signature").map_err(|_| DecodeError::InvalidSignature)?;
    if signature != SIGNATURE && signature != SIGNATURE_87A {
        return Err(DecodeError::InvalidSignature);
    }

    let width = r.u16("logical screen descriptor")?;
    let height = r.u16("logical screen descriptor")?;
    let packed = r.u8("logical screen descriptor")?;
    r.take(2, "logical screen descriptor")?;
    let global_palette = if packed & 0x80 != 0 {
        Some(r.color_table(packed & 0x07)?)
    } else {
        None
    };

    let mut gif = DecodedGif {
        width,
        height,
        global_palette,
        repeat: None,
        frames: Vec::new(),
    };
    let mut control = GraphicControl::default();

    while r.pos < bytes.len() {
        let offset = r.pos;
        match r.u8("block")? {
            TRAILER => break,
            EXTENSION_INTRODUCER => match r.u8("extension label")? {
                GRAPHIC_CONTROL_LABEL => {
                    let block = r.sub_blocks("graphic control extension")?;
                    if block.len() >= 4 {
                        let flags = block[0];
                        control = GraphicControl {
                            transparent_index: (flags & 1 != 0).then_some(block[3]),
                            disposal: DisposalMethod::from_code((flags >> 2) & 0x07),
                            delay: u16::from_le_bytes([block[1], block[2]]),
                        };
                    }
                }
                APPLICATION_LABEL => {
                    let block = r.sub_blocks("application extension")?;
                    if block.len() >= 14 && &block[..11] == NETSCAPE_ID && block[11] == 1 {
                        gif.repeat = Some(u16::from_le_bytes([block[12], block[13]]));
                    }
                }
                _ => r.skip_sub_blocks("extension")?,
            },
            IMAGE_SEPARATOR => {
                let frame = read_image(&mut r, &gif, std::mem::take(&mut control))?;
                gif.frames.push(frame);
            }
            byte => return Err(DecodeError::UnknownBlock { byte, offset }),
        }
    }

    Ok(gif)
}

fn read_image(
    r: &mut Reader<'_>,
    gif: &DecodedGif,
    control: GraphicControl,
) -> Result<DecodedFrame, DecodeError> {
    let index = gif.frames.len();
    let left = r.u16("image descriptor")?;
    let top = r.u16("image descriptor")?;
    let width = r.u16("image descriptor")?;
    let height = r.u16("image descriptor")?;
    let packed = r.u8("image descriptor")?;
    let interlaced = packed & 0x40 != 0;
    if width == 0 || height == 0 {
        return Err(DecodeError::EmptyImage {
            frame: index,
            width,
            height,
        });
    }

    let has_local_palette = packed & 0x80 != 0;
    let palette = if has_local_palette {
        r.color_table(packed & 0x07)?
    } else {
        gif.global_palette
            .clone()
            .ok_or(DecodeError::MissingColorTable(index))?
    };

    let min_code_size = r.u8("image data")?;
    let data = r.sub_blocks("image data")?;
    let (mut indices, stats) = lzw::decode_with_stats(&data, min_code_size)?;

    let expected = width as usize * height as usize;
    if indices.len() < expected {
        return Err(DecodeError::ShortImage {
            frame: index,
            expected,
            actual: indices.len(),
        });
    }
    indices.truncate(expected);
    if interlaced {
        indices = deinterlace(&indices, width as usize, height as usize);
    }

    Ok(DecodedFrame {
        left,
        top,
        width,
        height,
        indices,
        palette,
        has_local_palette,
        transparent_index: control.transparent_index,
        disposal: control.disposal,
        delay: control.delay,
        interlaced,
        min_code_size,
        lzw: stats,
    })
}

/// Reorder rows stored in the four-pass interlace order.
fn deinterlace(data: &[u8], width: usize, height: usize) -> Vec<u8> {
    let mut out = vec![0u8; data.len()];
    let mut rows = data.chunks_exact(width);
    for (start, step) in [(0, 8), (4, 8), (2, 4), (1, 2)] {
        for y in (start..height).step_by(step) {
            if let Some(row) = rows.next() {
                out[y * width..(y + 1) * width].copy_from_slice(row);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_gif() {
        assert_eq!(decode(b"PNG\r\n\x1a\n"), Err(DecodeError::InvalidSignature));
        assert_eq!(decode(b"GIF"), Err(DecodeError::InvalidSignature));
    }

    #[test]
    fn test_truncated_header() {
        assert!(matches!(
            decode(b"GIF89a\x01\x00"),
            Err(DecodeError::UnexpectedEof(_))
        ));
    }

    #[test]
    fn test_image_without_color_table() {
        let mut bytes = b"GIF89a".to_vec();
        bytes.extend_from_slice(&[1, 0, 1, 0, 0x00, 0, 0]);
        bytes.extend_from_slice(&[0x2C, 0, 0, 0, 0, 1, 0, 1, 0, 0x00]);
        assert_eq!(decode(&bytes), Err(DecodeError::MissingColorTable(0)));
    }

    #[test]
    fn test_unknown_block() {
        let mut bytes = b"GIF89a".to_vec();
        bytes.extend_from_slice(&[1, 0, 1, 0, 0x00, 0, 0, 0x99]);
        assert_eq!(
            decode(&bytes),
            Err(DecodeError::UnknownBlock { byte: 0x99, offset: 13 })
        );
    }

    #[test]
    fn test_skips_comment_extension() {
        let mut bytes = b"GIF89a".to_vec();
        bytes.extend_from_slice(&[1, 0, 1, 0, 0x00, 0, 0]);
        bytes.extend_from_slice(&[0x21, 0xFE, 2, b'h', b'i', 0, 0x3B]);
        let gif = decode(&bytes).unwrap();
        assert!(gif.frames.is_empty());
    }

    #[test]
    fn test_zero_width_image() {
        // 2-color global table, then an interlaced 0x1 image
        let mut bytes = b"GIF89a".to_vec();
        bytes.extend_from_slice(&[1, 0, 1, 0, 0x80, 0, 0]);
        bytes.extend_from_slice(&[0, 0, 0, 255, 255, 255]);
        bytes.extend_from_slice(&[0x2C, 0, 0, 0, 0, 0, 0, 1, 0, 0x40]);
        bytes.extend_from_slice(&[2, 2, 0x4C, 0x01, 0, 0x3B]);
        assert_eq!(
            decode(&bytes),
            Err(DecodeError::EmptyImage {
                frame: 0,
                width: 0,
                height: 1
            })
        );

        let mut tall = bytes.clone();
        tall[24..28].copy_from_slice(&[1, 0, 0, 0]);
        assert!(matches!(
            decode(&tall),
            Err(DecodeError::EmptyImage { height: 0, .. })
        ));
    }

    #[test]
    fn test_deinterlace_rows() {
        // 1 pixel wide, 8 rows stored as 0,4,2,6,1,3,5,7
        let stored = [0, 4, 2, 6, 1, 3, 5, 7];
        assert_eq!(deinterlace(&stored, 1, 8), vec![0, 1, 2, 3, 4, 5, 6, 7]);
    }
}
