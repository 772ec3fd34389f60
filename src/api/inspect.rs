use std::collections::HashSet;
use std::fmt;

use gif_quant::DecodeError;
use serde::Serialize;

/// Structure of a GIF file, as printed by `gifloom inspect`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GifSummary {
    pub width: u16,
    pub height: u16,
    pub repeat: Option<u16>,
    pub global_colors: Option<usize>,
    pub frames: Vec<FrameSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameSummary {
    pub index: usize,
    pub left: u16,
    pub top: u16,
    pub width: u16,
    pub height: u16,
    pub colors: usize,
    pub local_palette: bool,
    /// Distinct palette indices actually drawn
    pub used_colors: usize,
    pub transparent_index: Option<u8>,
    pub disposal: String,
    /// Hundredths of a second
    pub delay: u16,
    pub interlaced: bool,
    pub lzw_min_code_size: u8,
    pub lzw_peak_table_size: usize,
    pub lzw_clear_codes: usize,
}

/// Decode `bytes` and summarize every frame.
pub fn summarize(bytes: &[u8]) -> Result<GifSummary, DecodeError> {
    let gif = gif_quant::decode(bytes)?;
    let frames = gif
        .frames
        .iter()
        .enumerate()
        .map(|(index, f)| FrameSummary {
            index,
            left: f.left,
            top: f.top,
            width: f.width,
            height: f.height,
            colors: f.palette.len(),
            local_palette: f.has_local_palette,
            used_colors: f.indices.iter().collect::<HashSet<_>>().len(),
            transparent_index: f.transparent_index,
            disposal: f.disposal.to_string(),
            delay: f.delay,
            interlaced: f.interlaced,
            lzw_min_code_size: f.min_code_size,
            lzw_peak_table_size: f.lzw.peak_table_size,
            lzw_clear_codes: f.lzw.clear_codes,
        })
        .collect();

    Ok(GifSummary {
        width: gif.width,
        height: gif.height,
        repeat: gif.repeat,
        global_colors: gif.global_palette.as_ref().map(Vec::len),
        frames,
    })
}

impl GifSummary {
    /// Total display time in hundredths of a second.
    pub fn duration(&self) -> u32 {
        self.frames.iter().map(|f| f.delay as u32).sum()
    }
}

impl fmt::Display for GifSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repeat = match self.repeat {
            None => "once".to_string(),
            Some(0) => "forever".to_string(),
            Some(n) => format!("{n} times"),
        };
        writeln!(f, "{}x{}, {} frames, loop {}", self.width, self.height, self.frames.len(), repeat)?;
        if let Some(colors) = self.global_colors {
            writeln!(f, "global color table: {colors} colors")?;
        }
        writeln!(f, "duration: {:.2}s", self.duration() as f64 / 100.0)?;
        for frame in &self.frames {
            write!(
                f,
                "  #{:<3} {}x{}+{}+{} {} colors ({} used){} delay {}cs dispose {} lzw peak {} clears {}",
                frame.index,
                frame.width,
                frame.height,
                frame.left,
                frame.top,
                frame.colors,
                frame.used_colors,
                if frame.local_palette { " local" } else { "" },
                frame.delay,
                frame.disposal,
                frame.lzw_peak_table_size,
                frame.lzw_clear_codes,
            )?;
            if let Some(index) = frame.transparent_index {
                write!(f, " transparent {index}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
