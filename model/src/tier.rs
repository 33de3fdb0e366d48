use std::fmt;

use serde::{Deserialize, Serialize};

/// Rating band used for marker styling, best first.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tier {
    Excellent,
    VeryGood,
    Good,
    Fair,
}

// inclusive lower bounds
const EXCELLENT: f64 = 4.6;
const VERY_GOOD: f64 = 4.4;
const GOOD: f64 = 4.2;

impl Tier {
    pub fn all() -> [Self; 4] {
        [Self::Excellent, Self::VeryGood, Self::Good, Self::Fair]
    }

    pub fn of(rating: f64) -> Self {
        if rating >= EXCELLENT {
            Self::Excellent
        } else if rating >= VERY_GOOD {
            Self::VeryGood
        } else if rating >= GOOD {
            Self::Good
        } else {
            Self::Fair
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Self::Excellent => "darkgreen",
            Self::VeryGood => "green",
            Self::Good => "blue",
            Self::Fair => "orange",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::VeryGood => "Very Good",
            Self::Good => "Good",
            Self::Fair => "Fair",
        }
    }

    /// Human readable rating range, e.g. `4.4–4.6`.
    pub fn range(&self) -> String {
        match self {
            Self::Excellent => format!("≥ {EXCELLENT}"),
            Self::VeryGood => format!("{VERY_GOOD}–{EXCELLENT}"),
            Self::Good => format!("{GOOD}–{VERY_GOOD}"),
            Self::Fair => format!("< {GOOD}"),
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
