use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VidseoError {
    #[error("Configuration error: {reason}")]
    Configuration { reason: String },

    #[error("Could not decode {video_path}: {reason}")]
    Decode { video_path: PathBuf, reason: String },

    #[error("{tool} was not found on PATH. Please install ffmpeg.")]
    MissingTool { tool: &'static str },

    #[error("No frames to analyze")]
    NoFrames,

    #[error(
        "The AI model returned an empty response. Please try again with a different video."
    )]
    EmptyResponse,

    #[error("The AI model returned a malformed response: {reason}")]
    MalformedResponse { reason: String },

    #[error("API rate limit exceeded. Please wait a minute and try again.")]
    RateLimited,

    #[error("Authentication failed. Please verify your Gemini API key in Google AI Studio.")]
    AuthFailed,

    #[error("The model '{model}' is not available for your API key.")]
    ModelUnavailable { model: String },

    #[error("{message}")]
    Unclassified { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl VidseoError {
    pub(crate) fn decode(video_path: &std::path::Path, reason: impl Into<String>) -> Self {
        Self::Decode {
            video_path: video_path.to_path_buf(),
            reason: reason.into(),
        }
    }

    /// Whether a later attempt may succeed without user action.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RateLimited)
    }
}

pub type Result<T> = std::result::Result<T, VidseoError>;
