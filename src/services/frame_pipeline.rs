//! Per-frame work: transparency, palette, dithering.
//!
//! Runs on a blocking worker. Each job owns its frame outright, so no
//! state is shared between concurrently running jobs.

use gif_quant::dither::{self, TransparentPixels};
use gif_quant::quantize::HistogramMethod;
use gif_quant::transparency::{
    find_unused_color, has_transparency, make_opaque, reserve_sentinel, substitute,
};
use gif_quant::{
    ColorDistance, DisposalMethod, DitherMode, DitherOptions, Frame, Palette, QuantizeError,
    QuantizedFrame, Quantizer, QuantizerKind,
};
use tracing::{debug, warn};

use crate::error::EncoderError;

/// Settings resolved for one frame from the encoder config and the
/// frame's overrides.
#[derive(Debug, Clone)]
pub struct FrameSettings {
    /// Fixed palette, already validated
    pub palette: Option<Palette>,
    pub dithering: DitherMode,
    pub dither_options: DitherOptions,
    pub disposal: DisposalMethod,
    pub transparency_cut_off: f64,
    pub quantizer: QuantizerKind,
    pub histogram: HistogramMethod,
    pub distance: ColorDistance,
    pub max_colors: usize,
    /// Hundredths of a second
    pub delay: u16,
}

/// One frame on its way to the encoder.
#[derive(Debug)]
pub struct FrameJob {
    pub index: usize,
    pub frame: Frame,
    pub settings: FrameSettings,
}

impl FrameJob {
    pub fn new(index: usize, frame: Frame, settings: FrameSettings) -> Self {
        Self {
            index,
            frame,
            settings,
        }
    }

    /// Quantize and dither the frame.
    pub fn run(self) -> Result<QuantizedFrame, EncoderError> {
        let FrameJob {
            index,
            frame,
            settings: s,
        } = self;
        let (width, height) = (frame.width(), frame.height());

        let cut_off = s.transparency_cut_off;
        let wants_transparency = cut_off > 0.0 && has_transparency(&frame, cut_off);

        let (frame, mask, sentinel) = match (&s.palette, wants_transparency) {
            (None, true) => match find_unused_color(&frame) {
                Some(sentinel) => {
                    let (frame, mask) = substitute(frame, sentinel, cut_off);
                    (frame, Some(mask), Some(sentinel))
                }
                None => {
                    warn!(frame = index, "No unused color left for transparency, encoding opaque");
                    (make_opaque(frame), None, None)
                }
            },
            (Some(_), true) => {
                warn!(frame = index, "Fixed palette in use, transparency ignored");
                (frame, None, None)
            }
            (Some(_), false) => (frame, None, None),
            (None, false) => (make_opaque(frame), None, None),
        };

        let (palette, transparent_index) = match (s.palette, sentinel) {
            (Some(palette), _) => (palette, None),
            (None, None) => {
                let mut quantizer = Quantizer::with_histogram(s.quantizer, s.distance, s.histogram);
                quantizer.sample(&frame);
                (quantizer.build_palette(s.max_colors)?, None)
            }
            (None, Some(sentinel)) => {
                // One slot is held back for the sentinel
                let mut quantizer = Quantizer::with_histogram(s.quantizer, s.distance, s.histogram);
                quantizer.sample(&frame);
                let colors = quantizer.build_colors(s.max_colors.saturating_sub(1).max(2))?;
                let (palette, index) =
                    reserve_sentinel(colors, sentinel, s.max_colors, &s.distance)
                        .map_err(QuantizeError::from)?;
                (palette, Some(index as u8))
            }
        };
        let pinned = mask
            .as_deref()
            .zip(transparent_index)
            .map(|(mask, index)| TransparentPixels { mask, index });

        let indices = dither::reduce(
            &frame,
            &palette,
            s.dithering,
            &s.distance,
            &s.dither_options,
            pinned,
        );

        debug!(
            frame = index,
            width,
            height,
            colors = palette.len(),
            dithering = %s.dithering,
            transparent = transparent_index.is_some(),
            "Frame quantized"
        );

        Ok(QuantizedFrame {
            width,
            height,
            indices,
            palette,
            transparent_index,
            disposal: s.disposal,
            delay: s.delay,
        })
    }
}
