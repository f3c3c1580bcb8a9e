//! Quiz profile parsing and risk classification

pub mod classify;
pub mod parser;
pub mod profile;

pub use classify::{get_portfolio_id, risk_score};
pub use parser::{parse_amount, parse_user_input};
pub use profile::{Goal, PortfolioType, QuizProfile, RiskBehavior, TimeHorizon, TopicPreferences};
