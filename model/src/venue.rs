use geo::Point;
use serde::{Deserialize, Serialize};

use crate::{PlaceId, Source, Tier};

/// One discovered point of interest, flat so it maps onto a single CSV row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Venue {
    pub place_id: PlaceId,
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub rating: f64,
    pub review_count: u32,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub open_now: Option<bool>,
    pub source: Option<Source>,
    pub zone: Option<u32>,
    pub keyword: Option<String>,
}

/// Where a record came from. Informational only.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Provenance {
    pub source: Option<Source>,
    pub zone: Option<u32>,
    pub keyword: Option<String>,
}

impl Provenance {
    pub fn new(source: Source) -> Self {
        Self {
            source: Some(source),
            ..Self::default()
        }
    }

    pub fn zone(mut self, zone: u32) -> Self {
        self.zone = Some(zone);
        self
    }

    pub fn keyword(mut self, keyword: &str) -> Self {
        self.keyword = Some(keyword.to_string());
        self
    }
}

impl Venue {
    pub fn point(&self) -> Point {
        Point::new(self.longitude, self.latitude)
    }

    pub fn tier(&self) -> Tier {
        Tier::of(self.rating)
    }

    pub fn with_provenance(mut self, provenance: &Provenance) -> Self {
        self.source = provenance.source;
        self.zone = provenance.zone;
        self.keyword = provenance.keyword.clone();
        self
    }

    /// City segment of a comma separated address: the third part from the
    /// end, since addresses close with "<city>, <state> <pin>, <country>".
    pub fn locality(&self) -> Option<&str> {
        let parts: Vec<_> = self.address.split(',').collect();
        if parts.len() < 3 {
            return None;
        }
        let x = parts[parts.len() - 3].trim();
        if x.is_empty() {
            None
        } else {
            Some(x)
        }
    }
}
