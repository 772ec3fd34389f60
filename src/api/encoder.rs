use std::sync::Arc;

use base64::Engine;
use gif_quant::{
    validate_user_palette, ColorDistance, Frame, GifDocument, Palette, QuantizedFrame,
};

use crate::error::EncoderError;
use crate::models::{delay_centiseconds, palette_colors, EncoderConfig, FrameOptions};
use crate::services::{FrameJob, FrameScheduler, FrameSettings};

type FrameResult = Result<QuantizedFrame, EncoderError>;

/// Animated GIF encoder.
///
/// Frames are quantized concurrently as they are added; the GIF is
/// assembled once, when [`get_blob_gif`](Self::get_blob_gif) is first
/// awaited. Must be created inside a tokio runtime.
///
/// ```no_run
/// # async fn demo(frames: Vec<gif_quant::Frame>) -> Result<(), gifloom::EncoderError> {
/// use gifloom::{EncoderConfig, FrameOptions, GifEncoder};
///
/// let mut encoder = GifEncoder::new(EncoderConfig::default())?;
/// encoder.set_delay(0.05);
/// for frame in frames {
///     encoder.add_frame(frame, FrameOptions::default())?;
/// }
/// let gif = encoder.get_blob_gif().await?;
/// # Ok(())
/// # }
/// ```
pub struct GifEncoder {
    config: EncoderConfig,
    distance: ColorDistance,
    global_palette: Option<Palette>,
    width: Option<u32>,
    height: Option<u32>,
    delay: u16,
    repeat: Option<u16>,
    scheduler: FrameScheduler<FrameResult>,
    frames: usize,
    output: Option<Vec<u8>>,
    destroyed: bool,
}

impl GifEncoder {
    pub fn new(config: EncoderConfig) -> Result<Self, EncoderError> {
        config.validate()?;
        let global_palette = match &config.palette {
            Some(entries) => Some(validate_user_palette(&palette_colors(entries)?)),
            None => None,
        };
        let scheduler = FrameScheduler::new(config.num_workers)?;

        Ok(Self {
            distance: ColorDistance::new(config.distance),
            global_palette,
            width: config.width,
            height: config.height,
            delay: delay_centiseconds(config.delay),
            repeat: config.repeat,
            scheduler,
            frames: 0,
            output: None,
            destroyed: false,
            config,
        })
    }

    /// Canvas size. Every frame must match it.
    pub fn set_size(&mut self, width: u32, height: u32) {
        self.width = Some(width);
        self.height = Some(height);
    }

    /// Delay in seconds for frames added from now on.
    pub fn set_delay(&mut self, seconds: f64) {
        self.delay = delay_centiseconds(seconds);
    }

    /// `None` plays once, `Some(0)` loops forever.
    pub fn set_repeat(&mut self, repeat: Option<u16>) {
        self.repeat = repeat;
    }

    /// Register a progress callback, called with completed/total after
    /// each frame job. Applies to frames added afterwards.
    pub fn on_render_progress<F>(&mut self, callback: F)
    where
        F: Fn(f32) + Send + Sync + 'static,
    {
        self.scheduler.set_progress(Arc::new(callback));
    }

    pub fn frame_count(&self) -> usize {
        self.frames
    }

    /// Current delay in hundredths of a second.
    pub fn delay(&self) -> u16 {
        self.delay
    }

    pub fn size(&self) -> Option<(u32, u32)> {
        self.width.zip(self.height)
    }

    /// Queue a frame for quantization.
    ///
    /// Returns immediately; the frame is processed on the worker pool.
    pub fn add_frame(&mut self, frame: Frame, options: FrameOptions) -> Result<(), EncoderError> {
        if self.destroyed {
            return Err(EncoderError::ResourceExhausted("encoder destroyed"));
        }
        if self.output.is_some() {
            return Err(EncoderError::Finalized);
        }

        if self.width.is_none() || self.height.is_none() {
            self.width.get_or_insert(frame.width());
            self.height.get_or_insert(frame.height());
        }

        let settings = self.frame_settings(options);
        let index = self.frames;
        self.scheduler
            .submit(move || FrameJob::new(index, frame, settings).run())?;
        self.frames += 1;
        tracing::debug!(frame = index, "Frame queued");
        Ok(())
    }

    fn frame_settings(&self, options: FrameOptions) -> FrameSettings {
        let palette = match options.palette {
            Some(colors) => Some(validate_user_palette(&colors)),
            None => self.global_palette.clone(),
        };
        FrameSettings {
            palette,
            dithering: options.dithering.unwrap_or(self.config.dithering),
            dither_options: self.config.dither_options.clone(),
            disposal: options.disposal.unwrap_or(self.config.disposal),
            transparency_cut_off: options
                .transparency_cut_off
                .unwrap_or(self.config.transparency_cut_off)
                .clamp(0.0, 1.0),
            quantizer: self.config.quantizer,
            histogram: self.config.histogram,
            distance: self.distance,
            max_colors: self.config.max_colors,
            delay: self.delay,
        }
    }

    /// Wait for all frames and return the encoded GIF.
    ///
    /// The first call assembles the file; later calls return the same bytes.
    pub async fn get_blob_gif(&mut self) -> Result<Vec<u8>, EncoderError> {
        if self.destroyed {
            return Err(EncoderError::ResourceExhausted("encoder destroyed"));
        }
        if let Some(output) = &self.output {
            return Ok(output.clone());
        }
        if self.frames == 0 {
            return Err(EncoderError::NoFrames);
        }

        let results = self.scheduler.join().await;
        self.frames = 0;
        let frames = results?.into_iter().collect::<Result<Vec<_>, _>>()?;

        let (first_width, first_height) = frames
            .first()
            .map(|f| (f.width, f.height))
            .ok_or(EncoderError::NoFrames)?;
        let width = self.width.unwrap_or(first_width);
        let height = self.height.unwrap_or(first_height);
        let mut document = GifDocument::new(width, height).with_repeat(self.repeat);
        if let Some(palette) = &self.global_palette {
            document = document.with_global_palette(palette.clone());
        }
        let frame_count = frames.len();
        document.frames = frames;

        let bytes = document.encode()?;
        tracing::info!(
            width,
            height,
            frames = frame_count,
            bytes = bytes.len(),
            "GIF encoded"
        );
        self.frames = frame_count;
        self.output = Some(bytes.clone());
        Ok(bytes)
    }

    /// [`get_blob_gif`](Self::get_blob_gif), base64-encoded.
    pub async fn get_base64_gif(&mut self) -> Result<String, EncoderError> {
        let bytes = self.get_blob_gif().await?;
        Ok(base64::engine::general_purpose::STANDARD.encode(bytes))
    }

    /// Abort outstanding work and release the workers. Any later call
    /// fails with [`EncoderError::ResourceExhausted`].
    pub fn destroy(&mut self) {
        self.scheduler.shutdown();
        self.output = None;
        self.destroyed = true;
        tracing::debug!("Encoder destroyed");
    }
}
