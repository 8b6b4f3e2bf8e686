//! Vidseo Core Library
//!
//! Samples evenly spaced frames from a video with ffmpeg and asks Gemini for
//! platform-specific SEO recommendations.

pub mod config;
pub mod error;
pub mod format;
pub mod gemini;
pub mod sampler;
pub mod schema;
pub mod types;

// Re-export commonly used items at crate root
pub use config::{AnalysisConfig, Config, SamplerConfig};
pub use error::{Result, VidseoError};
pub use format::{
    default_report_path, format_report_readable, format_timestamp, json_report_path, save_report,
    save_report_json,
};
pub use gemini::{GeminiClient, analyze_frames};
pub use sampler::{FfmpegFrameSource, FrameSource, sample_frames, sample_timestamps};
pub use types::{
    AnalysisResult, FacebookStrategy, PolicyCheck, PolicyStatus, SampledFrame, TiktokStrategy,
    VideoInfo, YoutubeStrategy,
};
