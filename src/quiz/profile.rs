//! Quiz profile types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Investment goal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Goal {
    AvoidLosingMoney,
    GrowWithCaution,
    GrowModerately,
    GrowAggressively,
}

impl Goal {
    pub fn label(&self) -> &'static str {
        match self {
            Goal::AvoidLosingMoney => "Avoid losing money",
            Goal::GrowWithCaution => "Grow with caution",
            Goal::GrowModerately => "Grow moderately",
            Goal::GrowAggressively => "Grow aggressively",
        }
    }
}

/// Investment time horizon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeHorizon {
    OneToThree,
    ThreeToFive,
    SixToTen,
    TenPlus,
}

impl TimeHorizon {
    pub fn label(&self) -> &'static str {
        match self {
            TimeHorizon::OneToThree => "1-3 years",
            TimeHorizon::ThreeToFive => "3-5 years",
            TimeHorizon::SixToTen => "6-10 years",
            TimeHorizon::TenPlus => "10+ years",
        }
    }
}

/// Reaction to a market drop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskBehavior {
    SellEverything,
    SellSome,
    DoNothing,
    BuyMore,
}

impl RiskBehavior {
    pub fn label(&self) -> &'static str {
        match self {
            RiskBehavior::SellEverything => "I'd sell everything",
            RiskBehavior::SellSome => "I'd sell some",
            RiskBehavior::DoNothing => "I'll do nothing",
            RiskBehavior::BuyMore => "I'd buy more",
        }
    }
}

macro_rules! display_via_label {
    ($($t:ty),*) => {
        $(impl fmt::Display for $t {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        })*
    };
}

display_via_label!(Goal, TimeHorizon, RiskBehavior);

/// Topic preferences mentioned in the quiz
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicPreferences {
    pub regions: Vec<String>,
    pub sectors: Vec<String>,
    pub trends: Vec<String>,
    pub commodities: Vec<String>,
}

impl TopicPreferences {
    /// All topics in region, sector, trend, commodity order
    pub fn all(&self) -> Vec<String> {
        self.regions
            .iter()
            .chain(&self.sectors)
            .chain(&self.trends)
            .chain(&self.commodities)
            .cloned()
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
            && self.sectors.is_empty()
            && self.trends.is_empty()
            && self.commodities.is_empty()
    }
}

/// Structured quiz answers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuizProfile {
    pub goal: Option<Goal>,
    pub time_horizon: Option<TimeHorizon>,
    pub risk_behavior: Option<RiskBehavior>,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    pub customer_id: Option<String>,
    pub age: Option<String>,
    pub amount: Option<f64>,
    #[serde(default)]
    pub topics: TopicPreferences,
}

impl QuizProfile {
    pub fn goal_label(&self) -> &str {
        self.goal.map(|g| g.label()).unwrap_or("-")
    }

    pub fn horizon_label(&self) -> &str {
        self.time_horizon.map(|h| h.label()).unwrap_or("-")
    }

    pub fn behavior_label(&self) -> &str {
        self.risk_behavior.map(|b| b.label()).unwrap_or("-")
    }
}

/// Fixed risk tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortfolioType {
    Preservation,
    Balanced,
    Growth,
}

impl PortfolioType {
    /// Portfolio id used by the portfolio-data API
    pub fn id(&self) -> u32 {
        match self {
            PortfolioType::Preservation => 1,
            PortfolioType::Balanced => 2,
            PortfolioType::Growth => 3,
        }
    }

    pub fn from_id(id: u32) -> Option<Self> {
        match id {
            1 => Some(PortfolioType::Preservation),
            2 => Some(PortfolioType::Balanced),
            3 => Some(PortfolioType::Growth),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PortfolioType::Preservation => "Preservation",
            PortfolioType::Balanced => "Balanced",
            PortfolioType::Growth => "Growth",
        }
    }
}

impl fmt::Display for PortfolioType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (#{})", self.label(), self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels() {
        assert_eq!(TimeHorizon::TenPlus.to_string(), "10+ years");
        assert_eq!(RiskBehavior::DoNothing.label(), "I'll do nothing");
        assert_eq!(Goal::GrowWithCaution.to_string(), "Grow with caution");
        assert_eq!(PortfolioType::Growth.to_string(), "Growth (#3)");
    }

    #[test]
    fn test_portfolio_type_ids() {
        for t in [
            PortfolioType::Preservation,
            PortfolioType::Balanced,
            PortfolioType::Growth,
        ] {
            assert_eq!(PortfolioType::from_id(t.id()), Some(t));
        }
        assert_eq!(PortfolioType::from_id(4), None);
        assert_eq!(PortfolioType::from_id(7), None);
    }

    #[test]
    fn test_missing_labels_are_dash() {
        let profile = QuizProfile::default();
        assert_eq!(profile.goal_label(), "-");
        assert_eq!(profile.horizon_label(), "-");
        assert!(profile.topics.is_empty());
    }
}
