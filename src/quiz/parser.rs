//! Free-text quiz parsing
//!
//! Keyword and label matching over pasted quiz results. Parsing never
//! fails: anything not found stays `None` or empty.

use crate::quiz::profile::{Goal, QuizProfile, RiskBehavior, TimeHorizon, TopicPreferences};
use regex::Regex;

const GOAL_RULES: &[(&[&str], Goal)] = &[
    (
        &["grow them aggressively", "grow aggressively"],
        Goal::GrowAggressively,
    ),
    (&["grow moderately"], Goal::GrowModerately),
    (&["grow with caution"], Goal::GrowWithCaution),
    (&["avoid losing money"], Goal::AvoidLosingMoney),
];

const HORIZON_RULES: &[(&[&str], TimeHorizon)] = &[
    (&["1-3 year", "in 1-3"], TimeHorizon::OneToThree),
    (&["3-5 year", "in 3-5"], TimeHorizon::ThreeToFive),
    (&["6-10 year", "in 6-10"], TimeHorizon::SixToTen),
    (&["10+ year", "10 year"], TimeHorizon::TenPlus),
];

const BEHAVIOR_RULES: &[(&[&str], RiskBehavior)] = &[
    (&["sell everything"], RiskBehavior::SellEverything),
    (&["sell some"], RiskBehavior::SellSome),
    (&["do nothing"], RiskBehavior::DoNothing),
    (&["buy more"], RiskBehavior::BuyMore),
];

pub const REGIONS: &[&str] = &[
    "World",
    "United States",
    "Europe",
    "Asia",
    "Japan",
    "China",
    "India",
    "Emerging markets",
];

pub const SECTORS: &[&str] = &[
    "Technology",
    "Healthcare",
    "Financials",
    "Real Estate",
    "Consumer",
    "Industrials",
    "Utilities",
];

pub const TRENDS: &[&str] = &[
    "Artificial Intelligence",
    "Clean Energy",
    "Nuclear Energy",
    "Electric Vehicles",
    "Cybersecurity",
    "Robotics",
    "Batteries",
];

pub const COMMODITIES: &[&str] = &["Gold", "Silver", "Oil", "Copper", "Uranium", "Water"];

const NAME_PATTERN: &str = r"(?i)Name:\s*\n?([A-Za-z][A-Za-z \t]*?)(?:\n|Customer|Email|$)";
const EMAIL_PATTERN: &str = r"(?i)Email:\s*\n?([A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,})";
const CUSTOMER_ID_PATTERN: &str = r"(?i)Customer\s*Id:\s*\n?(\d+)";
const AGE_PATTERN: &str = r"(?i)\bAge:\s*\n?(\d+)";
const AMOUNT_PATTERN: &str =
    r"(?i)(?:Investment amount|\bAmount):\s*\n?\s*\$?\s*(\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d+(?:\.\d+)?)";

/// First matching rule wins
fn first_match<T: Copy>(text: &str, rules: &[(&[&str], T)]) -> Option<T> {
    rules
        .iter()
        .find(|(needles, _)| needles.iter().any(|n| text.contains(n)))
        .map(|(_, value)| *value)
}

/// First capture group of `pattern`, trimmed, if non-empty
fn capture(pattern: &str, text: &str) -> Option<String> {
    let re = Regex::new(pattern).ok()?;
    let value = re.captures(text)?.get(1)?.as_str().trim().to_string();
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Keywords from `list` present in `text` as whole words, in list order
fn match_keywords(text: &str, list: &[&str]) -> Vec<String> {
    list.iter()
        .filter(|keyword| {
            let pattern = format!(r"(?i)\b{}\b", regex::escape(keyword));
            Regex::new(&pattern).map(|re| re.is_match(text)).unwrap_or(false)
        })
        .map(|k| k.to_string())
        .collect()
}

/// Parse `"$25,000"`-style amounts
pub fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| *c != '$' && *c != ',')
        .collect();
    cleaned.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse pasted quiz results into a profile
pub fn parse_user_input(input: &str) -> QuizProfile {
    let lower = input.to_lowercase();

    QuizProfile {
        goal: first_match(&lower, GOAL_RULES),
        time_horizon: first_match(&lower, HORIZON_RULES),
        risk_behavior: first_match(&lower, BEHAVIOR_RULES),
        user_name: capture(NAME_PATTERN, input),
        user_email: capture(EMAIL_PATTERN, input),
        customer_id: capture(CUSTOMER_ID_PATTERN, input),
        age: capture(AGE_PATTERN, input),
        amount: capture(AMOUNT_PATTERN, input).and_then(|a| parse_amount(&a)),
        topics: TopicPreferences {
            regions: match_keywords(input, REGIONS),
            sectors: match_keywords(input, SECTORS),
            trends: match_keywords(input, TRENDS),
            commodities: match_keywords(input, COMMODITIES),
        },
    }
}
