//! Risk tier classification
//!
//! Additive score over the quiz answers:
//!
//! ```text
//! score = goal (0..=3, missing 2) + behavior (0..=3, missing 2) + horizon
//! horizon: 1-3 years -1, 10+ years +1, otherwise 0
//!
//! score <= 2  -> Preservation
//! score 3..=4 -> Balanced
//! score >= 5  -> Growth
//! ```

use crate::quiz::profile::{Goal, PortfolioType, QuizProfile, RiskBehavior, TimeHorizon};

const MISSING_SCORE: i32 = 2;

fn goal_score(goal: Option<Goal>) -> i32 {
    match goal {
        Some(Goal::AvoidLosingMoney) => 0,
        Some(Goal::GrowWithCaution) => 1,
        Some(Goal::GrowModerately) => 2,
        Some(Goal::GrowAggressively) => 3,
        None => MISSING_SCORE,
    }
}

fn behavior_score(behavior: Option<RiskBehavior>) -> i32 {
    match behavior {
        Some(RiskBehavior::SellEverything) => 0,
        Some(RiskBehavior::SellSome) => 1,
        Some(RiskBehavior::DoNothing) => 2,
        Some(RiskBehavior::BuyMore) => 3,
        None => MISSING_SCORE,
    }
}

fn horizon_adjustment(horizon: Option<TimeHorizon>) -> i32 {
    match horizon {
        Some(TimeHorizon::OneToThree) => -1,
        Some(TimeHorizon::TenPlus) => 1,
        _ => 0,
    }
}

/// Raw risk score of a profile
pub fn risk_score(profile: &QuizProfile) -> i32 {
    goal_score(profile.goal)
        + behavior_score(profile.risk_behavior)
        + horizon_adjustment(profile.time_horizon)
}

/// Pick the portfolio tier for a profile
pub fn get_portfolio_id(profile: &QuizProfile) -> PortfolioType {
    match risk_score(profile) {
        i32::MIN..=2 => PortfolioType::Preservation,
        3..=4 => PortfolioType::Balanced,
        _ => PortfolioType::Growth,
    }
}
