pub mod encoder;
pub mod inspect;

pub use encoder::GifEncoder;
pub use inspect::{summarize, FrameSummary, GifSummary};
