//! Methodology enhancement
//!
//! One model call that rewrites the methodology section for the investor.
//! The model is asked for a JSON object; the first complete object in the
//! reply is extracted with a bracket-matching scan, so prose or code fences
//! around it are ignored.

use crate::chat::ChatMessage;
use crate::errors::{FolioError, Result};
use crate::model::TextModel;
use crate::portfolio::types::{CopySource, Methodology, PortfolioReport};
use crate::quiz::QuizProfile;
use serde::Deserialize;
use tracing::debug;

const MAX_BULLETS: usize = 6;

const SYSTEM_PROMPT: &str = "You write concise, compliant copy for investment portfolio reports. \
You never promise returns and never give personal financial advice beyond describing the portfolio.";

#[derive(Debug, Deserialize)]
struct GeneratedCopy {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    bullets: Vec<String>,
}

/// Byte range of the first complete top-level JSON object in `text`
///
/// Braces inside string literals are ignored and escapes are honoured.
/// Stray closing braces before the first opening one are skipped.
pub fn find_json_object(text: &str) -> Option<(usize, usize)> {
    let mut depth: usize = 0;
    let mut start: Option<usize> = None;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, byte) in text.bytes().enumerate() {
        if escape_next {
            escape_next = false;
            continue;
        }

        if in_string {
            match byte {
                b'\\' => escape_next = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match byte {
            b'"' if start.is_some() => in_string = true,
            b'{' => {
                if depth == 0 {
                    start = Some(i);
                }
                depth += 1;
            }
            b'}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    return start.map(|s| (s, i));
                }
            }
            _ => {}
        }
    }

    None
}

/// First complete JSON object in `text`
pub fn extract_json_object(text: &str) -> Option<&str> {
    find_json_object(text).map(|(start, end)| &text[start..=end])
}

fn build_prompt(profile: &QuizProfile, report: &PortfolioReport) -> String {
    let holdings = report
        .holdings
        .iter()
        .map(|h| format!("- {} ({}, {}): {}", h.symbol, h.name, h.category, h.allocation))
        .collect::<Vec<_>>()
        .join("\n");

    let topics = profile.topics.all();
    let topics = if topics.is_empty() {
        "none".to_string()
    } else {
        topics.join(", ")
    };

    format!(
        "Write the methodology section of a portfolio report.\n\n\
Investor profile:\n\
- Goal: {goal}\n\
- Time horizon: {horizon}\n\
- Reaction to a 20% drop: {behavior}\n\
- Preferred topics: {topics}\n\n\
Portfolio: {portfolio} (risk profile {risk})\n\
Holdings:\n{holdings}\n\n\
Current copy for reference:\n\
Title: {title}\n\
Description: {description}\n\n\
Reply with only a JSON object of the form \
{{\"title\": \"...\", \"description\": \"...\", \"bullets\": [\"...\", \"...\", \"...\", \"...\"]}}. \
The title is under 12 words, the description 3 to 4 sentences, and there are exactly 4 bullets.",
        goal = profile.goal_label(),
        horizon = profile.horizon_label(),
        behavior = profile.behavior_label(),
        topics = topics,
        portfolio = report.portfolio_type,
        risk = report.risk_profile,
        holdings = if holdings.is_empty() { "- (not available)".to_string() } else { holdings },
        title = report.methodology.title,
        description = report.methodology.description,
    )
}

/// Parse a model reply into methodology copy
pub fn parse_methodology(reply: &str) -> Result<Methodology> {
    let json = extract_json_object(reply)
        .ok_or_else(|| FolioError::EmptyResponse("no JSON object in reply".to_string()))?;

    let copy: GeneratedCopy = serde_json::from_str(json)?;

    let bullets: Vec<String> = copy
        .bullets
        .iter()
        .map(|b| b.trim().to_string())
        .filter(|b| !b.is_empty())
        .take(MAX_BULLETS)
        .collect();

    if copy.title.trim().is_empty() || copy.description.trim().is_empty() || bullets.is_empty() {
        return Err(FolioError::EmptyResponse(
            "methodology reply is missing title, description or bullets".to_string(),
        ));
    }

    Ok(Methodology {
        title: copy.title.trim().to_string(),
        description: copy.description.trim().to_string(),
        bullets,
    })
}

/// Ask the model for methodology copy tailored to the investor
pub async fn enhance_with_gemini<M>(
    model: &M,
    profile: &QuizProfile,
    report: &PortfolioReport,
) -> Result<Methodology>
where
    M: TextModel + ?Sized,
{
    let messages = [
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::human(build_prompt(profile, report)),
    ];

    let reply = model.generate(&messages).await?;
    debug!(model = model.model_name(), reply_len = reply.len(), "methodology reply received");

    parse_methodology(&reply)
}

/// Replace the static copy with generated copy
pub fn apply_methodology(report: &mut PortfolioReport, methodology: Methodology) {
    report.methodology = methodology;
    report.methodology_source = CopySource::Generated;
}
