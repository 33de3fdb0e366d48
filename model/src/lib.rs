use core::fmt;
use std::str::FromStr;

use serde_with::{DeserializeFromStr, SerializeDisplay};

mod id;
mod tier;
mod venue;

pub use id::PlaceId;
pub use tier::Tier;
pub use venue::{Provenance, Venue};

/// Which search strategy produced a record.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, SerializeDisplay, DeserializeFromStr)]
pub enum Source {
    Quick,
    Nearby,
    Text,
    Seed,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Source {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "quick" => Self::Quick,
            "nearby" => Self::Nearby,
            "text" => Self::Text,
            "seed" => Self::Seed,
            _ => return Err(format!("Unknown source: {s}")),
        })
    }
}

impl Source {
    pub fn all() -> Vec<Self> {
        vec![Self::Quick, Self::Nearby, Self::Text, Self::Seed]
    }

    pub fn slug(&self) -> &'static str {
        match self {
            Self::Quick => "quick",
            Self::Nearby => "nearby",
            Self::Text => "text",
            Self::Seed => "seed",
        }
    }
}
