//! Static methodology copy
//!
//! Chosen by risk profile and a coarse time category derived from the
//! horizon label. Used as-is when enhancement is off or fails.

use crate::portfolio::types::{Methodology, RiskProfile};

/// Coarse investment horizon
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeCategory {
    Short,
    Medium,
    Long,
}

const MEDIUM_MARKERS: &[&str] = &[
    "5+", "5-7", "5-10", "6-10", "7-10", "5 years", "7 years", "10 years",
];

/// Categorise a horizon label such as `"6-10 years"`
pub fn time_category(horizon: &str) -> TimeCategory {
    let lower = horizon.to_lowercase();
    if lower.contains("10+") || lower.contains("more than 10") {
        TimeCategory::Long
    } else if MEDIUM_MARKERS.iter().any(|m| lower.contains(m)) {
        TimeCategory::Medium
    } else {
        TimeCategory::Short
    }
}

struct MethodologyCopy {
    title: &'static str,
    description: &'static str,
    bullets: [&'static str; 4],
}

impl MethodologyCopy {
    fn to_methodology(&self) -> Methodology {
        Methodology {
            title: self.title.to_string(),
            description: self.description.to_string(),
            bullets: self.bullets.iter().map(|b| b.to_string()).collect(),
        }
    }
}

const LOW: MethodologyCopy = MethodologyCopy {
    title: "Global Diversification for Short-Term Preservation",
    description: "We construct this conservative portfolio with 50% global markets exposure and 40% bond allocation to prioritize capital preservation. The allocation emphasizes stability through fixed-income securities while maintaining modest growth potential through globally diversified equity ETFs. This balanced approach mitigates market volatility while providing steady, predictable returns.",
    bullets: [
        "Prioritizes capital preservation and low volatility.",
        "Globally diversified across equities, bonds, and stable assets.",
        "Utilizes cost-effective Exchange Traded Funds (ETFs).",
        "Strategic asset allocation tailored for 1-3 year horizons.",
    ],
};

const MODERATE_SHORT: MethodologyCopy = MethodologyCopy {
    title: "Global Diversification for Short-Term Preservation",
    description: "We construct this balanced portfolio with 50% US equities as the core holding, complemented by strategic allocations to technology and emerging markets (10% each), and 30% bonds for stability. This mix targets steady growth while managing downside risk through diversified bond exposure and sector allocation across domestic and international markets.",
    bullets: [
        "Balances growth potential with capital preservation.",
        "Globally diversified across equities, bonds, and growth sectors.",
        "Utilizes cost-effective Exchange Traded Funds (ETFs).",
        "Strategic asset allocation tailored for 1-3 year horizons.",
    ],
};

const MODERATE_MEDIUM: MethodologyCopy = MethodologyCopy {
    title: "Global Diversification for Mid-Term Preservation",
    description: "We construct this balanced portfolio with 50% US equities as the core holding, strategically enhanced by technology and emerging market exposure (10% each), and stabilized with 30% bonds. This allocation balances growth potential with risk management, providing steady wealth accumulation through diversified sector and geographic exposure.",
    bullets: [
        "Balances growth and stability for mid-term goals.",
        "Globally diversified across equities, bonds, and emerging markets.",
        "Utilizes cost-effective Exchange Traded Funds (ETFs).",
        "Strategic asset allocation tailored for 5-10 year horizons.",
    ],
};

const MODERATE_LONG: MethodologyCopy = MethodologyCopy {
    title: "Global Diversification for Long-Term Preservation",
    description: "We construct this balanced portfolio with 50% US equities as the foundation, augmented by technology and emerging market allocations (10% each), and anchored by 30% bonds. This long-term allocation emphasizes consistent growth through diversified equity exposure while maintaining stability through strategic fixed-income positioning.",
    bullets: [
        "Balances growth and stability for long-term horizons.",
        "Globally diversified across equities, bonds, and international markets.",
        "Utilizes cost-effective Exchange Traded Funds (ETFs).",
        "Strategic asset allocation optimized for 10+ year horizons.",
    ],
};

const HIGH_SHORT: MethodologyCopy = MethodologyCopy {
    title: "Global Diversification for Short-Term Preservation",
    description: "We construct this growth-focused portfolio with 50% US equities and 30% technology exposure to maximize capital appreciation. Strategic allocation to emerging markets (10%) provides additional growth potential, with minimal bond exposure (10%) for stability during market volatility. This aggressive positioning targets maximum returns through concentrated exposure to high-growth sectors.",
    bullets: [
        "Maximizes growth potential through strategic concentration.",
        "Globally diversified across technology and emerging markets.",
        "Utilizes cost-effective Exchange Traded Funds (ETFs).",
        "Aggressive asset allocation optimized for 1-3 year horizons.",
    ],
};

const HIGH_MEDIUM: MethodologyCopy = MethodologyCopy {
    title: "Global Diversification for Mid-Term Aggressive Growth",
    description: "This aggressive growth portfolio combines high-growth emerging markets, technology innovation, and alternative assets (commodities) to maximize capital appreciation over a 5+ year horizon. By maintaining equal weightings across these three pillars, we capture growth from technological advancement, emerging economy expansion, and inflation-hedging commodities. This concentrated strategy foregoes bonds entirely in favor of maximum growth potential, suitable for investors with high risk tolerance and long-term wealth-building goals.",
    bullets: [
        "Maximizes long-term growth through high-conviction asset classes.",
        "Globally diversified across emerging markets, technology, and commodities.",
        "Utilizes cost-effective Exchange Traded Funds (ETFs).",
        "Aggressive 100% equity allocation optimized for 5+ year horizons.",
    ],
};

const HIGH_LONG: MethodologyCopy = MethodologyCopy {
    title: "Global Diversification for Long-Term Preservation",
    description: "We construct this growth-focused portfolio with 50% US equities and 30% technology exposure to maximize long-term capital appreciation. Strategic emerging markets allocation (10%) captures high-growth opportunities, while minimal bond exposure (10%) provides stability. This aggressive positioning leverages technology innovation and emerging market growth for maximum wealth accumulation.",
    bullets: [
        "Maximizes long-term growth through aggressive positioning.",
        "Globally diversified across technology and emerging markets.",
        "Utilizes cost-effective Exchange Traded Funds (ETFs).",
        "Aggressive asset allocation optimized for 10+ year horizons.",
    ],
};

const CUSTOM_MEDIUM: MethodologyCopy = MethodologyCopy {
    title: "Custom Diversified Portfolio for Mid-Term Growth",
    description: "This custom portfolio is strategically designed with a balanced allocation across multiple asset classes to optimize risk-adjusted returns. The portfolio combines growth-oriented equities with stability-focused bonds and alternative assets, creating a diversified approach suitable for investors seeking balanced growth with managed risk over a 5+ year horizon.",
    bullets: [
        "Custom asset allocation tailored to specific investment goals.",
        "Globally diversified across equities, bonds, and alternative assets.",
        "Utilizes cost-effective Exchange Traded Funds (ETFs).",
        "Strategic balance between growth and stability for 5+ year horizons.",
    ],
};

/// Static methodology copy for a risk profile and horizon label
pub fn methodology_content(risk: RiskProfile, horizon: &str) -> Methodology {
    let category = time_category(horizon);
    let copy = match (risk, category) {
        (RiskProfile::Low, _) => &LOW,
        (RiskProfile::Moderate, TimeCategory::Short) => &MODERATE_SHORT,
        (RiskProfile::Moderate, TimeCategory::Medium) => &MODERATE_MEDIUM,
        (RiskProfile::Moderate, TimeCategory::Long) => &MODERATE_LONG,
        (RiskProfile::High, TimeCategory::Short) => &HIGH_SHORT,
        (RiskProfile::High, TimeCategory::Medium) => &HIGH_MEDIUM,
        (RiskProfile::High, TimeCategory::Long) => &HIGH_LONG,
        // Only a mid-term entry exists for custom portfolios
        (RiskProfile::Custom, _) => &CUSTOM_MEDIUM,
    };
    copy.to_methodology()
}
