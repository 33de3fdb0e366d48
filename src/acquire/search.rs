use std::fmt;

use _model::{PlaceId, Provenance, Venue};
use serde::Deserialize;

use super::grid::Zone;
use crate::error::SearchError;

/// The external places capability. One call per page; implementations do
/// their own pacing.
pub trait PlaceSearch {
    fn nearby(
        &mut self,
        zone: &Zone,
        keyword: &str,
        place_type: Option<&str>,
        page_token: Option<&str>,
    ) -> Result<Page, SearchError>;

    fn text(&mut self, query: &str, page_token: Option<&str>) -> Result<Page, SearchError>;

    fn details(&mut self, place_id: &PlaceId) -> Result<RawPlace, SearchError>;
}

#[derive(Debug, Default)]
pub struct Page {
    pub places: Vec<RawPlace>,
    pub next_page_token: Option<String>,
}

/// A place as the provider reports it, every field optional.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawPlace {
    pub place_id: Option<String>,
    pub name: Option<String>,
    pub formatted_address: Option<String>,
    pub vicinity: Option<String>,
    pub geometry: Option<RawGeometry>,
    pub rating: Option<f64>,
    pub user_ratings_total: Option<u32>,
    pub formatted_phone_number: Option<String>,
    pub website: Option<String>,
    pub opening_hours: Option<RawOpeningHours>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RawGeometry {
    pub location: RawPosition,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RawPosition {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RawOpeningHours {
    pub open_now: Option<bool>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum RejectReason {
    MissingId,
    MissingName,
    MissingCoordinates,
    MissingRating,
    RatingOutOfRange(f64),
    OutsideMetro { distance_m: f64 },
    TooFewReviews { count: u32, min: u32 },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingId => write!(f, "missing place id"),
            Self::MissingName => write!(f, "missing name"),
            Self::MissingCoordinates => write!(f, "missing coordinates"),
            Self::MissingRating => write!(f, "missing rating"),
            Self::RatingOutOfRange(x) => write!(f, "rating {x} outside 0-5"),
            Self::OutsideMetro { distance_m } => {
                write!(f, "{:.1}km from the city center", distance_m / 1000.0)
            }
            Self::TooFewReviews { count, min } => write!(f, "{count} reviews, need {min}"),
        }
    }
}

impl RejectReason {
    /// Stable short name for grouping in summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingId => "missing-id",
            Self::MissingName => "missing-name",
            Self::MissingCoordinates => "missing-coordinates",
            Self::MissingRating => "missing-rating",
            Self::RatingOutOfRange(_) => "rating-out-of-range",
            Self::OutsideMetro { .. } => "outside-metro",
            Self::TooFewReviews { .. } => "too-few-reviews",
        }
    }
}

impl RawPlace {
    pub fn id(&self) -> Option<PlaceId> {
        self.place_id
            .as_deref()
            .filter(|x| !x.is_empty())
            .map(PlaceId::new)
    }

    pub fn position(&self) -> Option<(f64, f64)> {
        self.geometry
            .as_ref()
            .map(|x| (x.location.lat, x.location.lng))
            .filter(|(lat, lng)| lat.is_finite() && lng.is_finite())
    }

    /// Fills every field the summary entry lacks from a details lookup.
    /// Details win where both are present.
    pub fn merge(self, details: RawPlace) -> RawPlace {
        RawPlace {
            place_id: self.place_id.or(details.place_id),
            name: details.name.or(self.name),
            formatted_address: details.formatted_address.or(self.formatted_address),
            vicinity: details.vicinity.or(self.vicinity),
            geometry: details.geometry.or(self.geometry),
            rating: details.rating.or(self.rating),
            user_ratings_total: details.user_ratings_total.or(self.user_ratings_total),
            formatted_phone_number: details
                .formatted_phone_number
                .or(self.formatted_phone_number),
            website: details.website.or(self.website),
            opening_hours: details.opening_hours.or(self.opening_hours),
        }
    }

    pub fn refine(self, provenance: &Provenance) -> Result<Venue, RejectReason> {
        let place_id = self.id().ok_or(RejectReason::MissingId)?;
        let (latitude, longitude) = self.position().ok_or(RejectReason::MissingCoordinates)?;
        let name = self
            .name
            .filter(|x| !x.trim().is_empty())
            .ok_or(RejectReason::MissingName)?;
        let rating = self.rating.ok_or(RejectReason::MissingRating)?;
        if !(0.0..=5.0).contains(&rating) {
            return Err(RejectReason::RatingOutOfRange(rating));
        }

        Ok(Venue {
            place_id,
            name,
            address: self
                .formatted_address
                .or(self.vicinity)
                .unwrap_or_default(),
            latitude,
            longitude,
            rating,
            review_count: self.user_ratings_total.unwrap_or(0),
            phone: self.formatted_phone_number.filter(|x| !x.is_empty()),
            website: self.website.filter(|x| !x.is_empty()),
            open_now: self.opening_hours.and_then(|x| x.open_now),
            source: None,
            zone: None,
            keyword: None,
        }
        .with_provenance(provenance))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::VecDeque;

    use _model::Source;

    use super::*;

    pub fn raw(id: &str, reviews: u32) -> RawPlace {
        RawPlace {
            place_id: Some(id.to_string()),
            name: Some(format!("Eye Hospital {id}")),
            vicinity: Some("Bangalore".to_string()),
            geometry: Some(RawGeometry {
                location: RawPosition {
                    lat: 12.97,
                    lng: 77.59,
                },
            }),
            rating: Some(4.5),
            user_ratings_total: Some(reviews),
            ..RawPlace::default()
        }
    }

    pub fn raw_at(id: &str, reviews: u32, lat: f64, lng: f64) -> RawPlace {
        RawPlace {
            geometry: Some(RawGeometry {
                location: RawPosition { lat, lng },
            }),
            ..raw(id, reviews)
        }
    }

    /// Scripted provider: every call pops the next response for its kind,
    /// an exhausted script answers with an empty page.
    #[derive(Default)]
    pub struct FakeSearch {
        pub nearby: VecDeque<Result<Page, SearchError>>,
        pub text: VecDeque<Result<Page, SearchError>>,
        pub details: Vec<(String, Result<RawPlace, SearchError>)>,
        pub calls: Vec<String>,
    }

    impl PlaceSearch for FakeSearch {
        fn nearby(
            &mut self,
            zone: &Zone,
            keyword: &str,
            _place_type: Option<&str>,
            page_token: Option<&str>,
        ) -> Result<Page, SearchError> {
            self.calls.push(format!(
                "nearby {} {keyword} {}",
                zone.index,
                page_token.unwrap_or("-")
            ));
            self.nearby.pop_front().unwrap_or_else(|| Ok(Page::default()))
        }

        fn text(&mut self, query: &str, page_token: Option<&str>) -> Result<Page, SearchError> {
            self.calls
                .push(format!("text {query} {}", page_token.unwrap_or("-")));
            self.text.pop_front().unwrap_or_else(|| Ok(Page::default()))
        }

        fn details(&mut self, place_id: &PlaceId) -> Result<RawPlace, SearchError> {
            self.calls.push(format!("details {place_id}"));
            self.details
                .iter()
                .find(|(id, _)| id == place_id.as_str())
                .map(|(_, x)| x.clone())
                .unwrap_or_else(|| Ok(RawPlace::default()))
        }
    }

    pub fn page(places: Vec<RawPlace>, next: Option<&str>) -> Result<Page, SearchError> {
        Ok(Page {
            places,
            next_page_token: next.map(|x| x.to_string()),
        })
    }

    #[test]
    fn refine_keeps_provenance() {
        let provenance = Provenance::new(Source::Nearby).zone(2).keyword("eye clinic");
        let venue = raw("A", 150).refine(&provenance).unwrap();
        assert_eq!(venue.place_id, PlaceId::new("A"));
        assert_eq!(venue.address, "Bangalore");
        assert_eq!(venue.review_count, 150);
        assert_eq!(venue.zone, Some(2));
        assert_eq!(venue.keyword.as_deref(), Some("eye clinic"));
    }

    #[test]
    fn refine_rejects_malformed() {
        let p = Provenance::default();
        let no_coords = RawPlace {
            geometry: None,
            ..raw("A", 150)
        };
        assert_eq!(no_coords.refine(&p), Err(RejectReason::MissingCoordinates));

        let no_id = RawPlace {
            place_id: Some(String::new()),
            ..raw("A", 150)
        };
        assert_eq!(no_id.refine(&p), Err(RejectReason::MissingId));

        let bad_rating = RawPlace {
            rating: Some(7.0),
            ..raw("A", 150)
        };
        assert_eq!(bad_rating.refine(&p), Err(RejectReason::RatingOutOfRange(7.0)));

        let blank_name = RawPlace {
            name: Some("  ".to_string()),
            ..raw("A", 150)
        };
        assert_eq!(blank_name.refine(&p), Err(RejectReason::MissingName));
    }

    #[test]
    fn details_fill_gaps() {
        let details = RawPlace {
            formatted_address: Some("80 Feet Road, Bangalore".to_string()),
            website: Some("https://example.org".to_string()),
            user_ratings_total: Some(160),
            opening_hours: Some(RawOpeningHours {
                open_now: Some(false),
            }),
            ..RawPlace::default()
        };
        let venue = raw("A", 150)
            .merge(details)
            .refine(&Provenance::default())
            .unwrap();
        assert_eq!(venue.address, "80 Feet Road, Bangalore");
        assert_eq!(venue.website.as_deref(), Some("https://example.org"));
        assert_eq!(venue.review_count, 160);
        assert_eq!(venue.open_now, Some(false));
        assert_eq!(venue.name, "Eye Hospital A");
    }
}
