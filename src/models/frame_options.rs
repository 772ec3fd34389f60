use gif_quant::{DisposalMethod, DitherMode, Rgba};

/// Per-frame overrides of the encoder-wide settings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameOptions {
    /// Fixed palette for this frame only
    pub palette: Option<Vec<Rgba>>,
    pub dithering: Option<DitherMode>,
    pub disposal: Option<DisposalMethod>,
    pub transparency_cut_off: Option<f64>,
}

impl FrameOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn palette(mut self, colors: Vec<Rgba>) -> Self {
        self.palette = Some(colors);
        self
    }

    pub fn dithering(mut self, mode: DitherMode) -> Self {
        self.dithering = Some(mode);
        self
    }

    pub fn disposal(mut self, disposal: DisposalMethod) -> Self {
        self.disposal = Some(disposal);
        self
    }

    pub fn transparency_cut_off(mut self, cut_off: f64) -> Self {
        self.transparency_cut_off = Some(cut_off);
        self
    }
}
