pub mod frame_pipeline;
pub mod scheduler;

pub use frame_pipeline::{FrameJob, FrameSettings};
pub use scheduler::{FrameScheduler, ProgressCallback};
