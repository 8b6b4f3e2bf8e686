use std::path::{Path, PathBuf};

use tokio::fs;

use crate::{error::Result, types::AnalysisResult};

/// Format seconds as MM:SS timestamp
pub fn format_timestamp(seconds: f64) -> String {
    let mins = (seconds / 60.0) as u32;
    let secs = (seconds % 60.0) as u32;
    format!("{:02}:{:02}", mins, secs)
}

/// Default report file name for a video, e.g. `vidseo-report-holiday.txt`
pub fn default_report_path(video_path: &Path) -> PathBuf {
    let stem = video_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "video".to_string());
    PathBuf::from(format!("vidseo-report-{}.txt", stem))
}

/// Path of the JSON report saved next to the text report `report`.
///
/// Never equal to `report`, so a text report already named `*.json` keeps its content.
pub fn json_report_path(report: &Path) -> PathBuf {
    let path = report.with_extension("json");
    if path == report {
        report.with_extension("analysis.json")
    } else {
        path
    }
}

/// Format an analysis as a plain-text report, one section per platform
pub fn format_report_readable(result: &AnalysisResult) -> String {
    let mut output = String::new();

    output.push_str("VIDSEO AI REPORT\n\n");

    output.push_str("== Visual Hook ==\n");
    output.push_str(&result.visual_hook);
    output.push_str("\n\n");

    output.push_str("== YouTube ==\n");
    output.push_str(&format!("Title: {}\n\n", result.youtube.title));
    output.push_str("Description:\n");
    output.push_str(&result.youtube.description);
    output.push_str("\n\n");
    output.push_str(&format!("Tags: {}\n\n", result.youtube.tags));

    output.push_str("== TikTok ==\n");
    output.push_str("Captions:\n");
    for (i, caption) in result.tiktok.captions.iter().enumerate() {
        output.push_str(&format!("{}. {}\n", i + 1, caption));
    }
    output.push_str(&format!("Hashtags: {}\n\n", result.tiktok.hashtags.join(" ")));

    output.push_str("== Facebook ==\n");
    output.push_str(&result.facebook.caption);
    output.push_str("\n\n");

    output.push_str("== Policy Check ==\n");
    output.push_str(&format!("Status: {}\n", result.policy_check.status));
    output.push_str(&result.policy_check.notes);
    output.push('\n');

    output
}

/// Save a plain-text report to a file
pub async fn save_report(result: &AnalysisResult, path: &Path) -> Result<()> {
    fs::write(path, format_report_readable(result)).await?;
    Ok(())
}

/// Save the analysis as pretty JSON
pub async fn save_report_json(result: &AnalysisResult, path: &Path) -> Result<()> {
    let pretty_json = serde_json::to_string_pretty(result).map_err(std::io::Error::other)?;
    fs::write(path, &pretty_json).await?;
    Ok(())
}
