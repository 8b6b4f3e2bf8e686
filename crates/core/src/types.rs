use serde::{Deserialize, Serialize};

/// Probed properties of a video file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoInfo {
    pub duration: f64,
    pub width: u32,
    pub height: u32,
}

/// A still image captured from the video, as a base64 JPEG payload.
#[derive(Debug, Clone, PartialEq)]
pub struct SampledFrame {
    pub index: usize,
    pub timestamp: f64,
    pub data: String,
}

impl SampledFrame {
    pub const MIME_TYPE: &'static str = "image/jpeg";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub visual_hook: String,
    pub youtube: YoutubeStrategy,
    pub tiktok: TiktokStrategy,
    pub facebook: FacebookStrategy,
    pub policy_check: PolicyCheck,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YoutubeStrategy {
    pub title: String,
    pub description: String,
    pub tags: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TiktokStrategy {
    pub captions: Vec<String>,
    pub hashtags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacebookStrategy {
    pub caption: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyCheck {
    pub status: PolicyStatus,
    pub notes: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PolicyStatus {
    Safe,
    Warning,
    Violation,
}

impl PolicyStatus {
    pub const ALL: [PolicyStatus; 3] = [Self::Safe, Self::Warning, Self::Violation];

    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyStatus::Safe => "Safe",
            PolicyStatus::Warning => "Warning",
            PolicyStatus::Violation => "Violation",
        }
    }
}

impl std::fmt::Display for PolicyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
