//! Terminal rendering of an analysis as one card per platform.

use console::style;
use vidseo_core::{AnalysisResult, PolicyStatus};

enum Value<'a> {
    Text(&'a str),
    List(&'a [String]),
}

struct Card<'a> {
    platform: &'static str,
    items: Vec<(&'static str, Value<'a>)>,
}

fn cards(result: &AnalysisResult) -> Vec<Card<'_>> {
    vec![
        Card {
            platform: "Visual Hook",
            items: vec![("Hook", Value::Text(&result.visual_hook))],
        },
        Card {
            platform: "YouTube",
            items: vec![
                ("Title", Value::Text(&result.youtube.title)),
                ("Description", Value::Text(&result.youtube.description)),
                ("Tags", Value::Text(&result.youtube.tags)),
            ],
        },
        Card {
            platform: "TikTok",
            items: vec![
                ("Captions", Value::List(&result.tiktok.captions)),
                ("Hashtags", Value::List(&result.tiktok.hashtags)),
            ],
        },
        Card {
            platform: "Facebook",
            items: vec![("Caption", Value::Text(&result.facebook.caption))],
        },
    ]
}

fn render_policy(result: &AnalysisResult) -> String {
    let status = result.policy_check.status;
    let badge = match status {
        PolicyStatus::Safe => style(status.as_str()).green().bold(),
        PolicyStatus::Warning => style(status.as_str()).yellow().bold(),
        PolicyStatus::Violation => style(status.as_str()).red().bold(),
    };
    format!(
        "{}  {}\n{}\n",
        style("Policy Check").bold(),
        badge,
        result.policy_check.notes
    )
}

/// Render every card, styled for an interactive terminal.
pub fn render(result: &AnalysisResult) -> String {
    let mut output = String::new();

    for card in cards(result) {
        output.push_str(&format!("{}\n", style(card.platform).cyan().bold()));
        for (label, value) in card.items {
            output.push_str(&format!(
                "  {}\n",
                style(label.to_uppercase()).dim().bold()
            ));
            match value {
                Value::Text(text) => {
                    for line in text.lines() {
                        output.push_str(&format!("  {}\n", line));
                    }
                }
                Value::List(items) => {
                    for item in items {
                        output.push_str(&format!("  • {}\n", item));
                    }
                }
            }
        }
        output.push('\n');
    }

    output.push_str(&render_policy(result));
    output
}
