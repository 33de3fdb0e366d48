use std::collections::{btree_map::Entry, BTreeMap, BTreeSet};

use _model::{PlaceId, Provenance, Venue};
use itertools::Itertools;

use super::search::{RawPlace, RejectReason};
use crate::error::SearchError;

#[derive(Clone, Debug, PartialEq)]
pub struct Rejection {
    pub place_id: Option<PlaceId>,
    pub reason: RejectReason,
}

/// A query (or page of one) that produced nothing because the provider
/// failed. The run carries on without it.
#[derive(Clone, Debug, PartialEq)]
pub struct Gap {
    pub query: String,
    pub page: usize,
    pub error: SearchError,
}

/// Everything gathered during one acquisition run. Records are keyed by id
/// and the first sighting of an id wins; later sightings only bump
/// `duplicates`. That holds for rejected ids too.
#[derive(Debug, Default)]
pub struct Harvest {
    venues: BTreeMap<PlaceId, Venue>,
    rejected: BTreeSet<PlaceId>,
    pub rejections: Vec<Rejection>,
    pub gaps: Vec<Gap>,
    pub duplicates: usize,
    /// provider calls that returned a response
    pub requests: usize,
}

/// Final, filtered result of a run.
#[derive(Debug)]
pub struct Outcome {
    /// most reviewed first
    pub venues: Vec<Venue>,
    pub rejections: Vec<Rejection>,
    pub gaps: Vec<Gap>,
    pub duplicates: usize,
    pub requests: usize,
}

impl Harvest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &PlaceId) -> bool {
        self.venues.contains_key(id)
    }

    /// Whether `id` was already kept or rejected.
    pub fn seen(&self, id: &PlaceId) -> bool {
        self.contains(id) || self.rejected.contains(id)
    }

    pub fn len(&self) -> usize {
        self.venues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.venues.is_empty()
    }

    /// Returns true when the place was new and accepted.
    pub fn offer(&mut self, raw: RawPlace, provenance: &Provenance) -> bool {
        let id = raw.id();
        match raw.refine(provenance) {
            Ok(venue) => self.insert(venue),
            Err(reason) => {
                self.reject(id, reason);
                false
            }
        }
    }

    pub fn insert(&mut self, venue: Venue) -> bool {
        if self.rejected.contains(&venue.place_id) {
            self.duplicates += 1;
            return false;
        }
        match self.venues.entry(venue.place_id.clone()) {
            Entry::Vacant(x) => {
                x.insert(venue);
                true
            }
            Entry::Occupied(_) => {
                self.duplicates += 1;
                false
            }
        }
    }

    pub fn reject(&mut self, place_id: Option<PlaceId>, reason: RejectReason) {
        if let Some(id) = &place_id {
            if !self.rejected.insert(id.clone()) {
                self.duplicates += 1;
                return;
            }
        }
        self.rejections.push(Rejection { place_id, reason });
    }

    pub fn gap(&mut self, query: impl Into<String>, page: usize, error: SearchError) {
        self.gaps.push(Gap {
            query: query.into(),
            page,
            error,
        });
    }

    /// Drops every record with fewer than `min_reviews` reviews.
    pub fn finish(mut self, min_reviews: u32) -> Outcome {
        let mut venues = Vec::with_capacity(self.venues.len());
        for (id, venue) in self.venues {
            if venue.review_count >= min_reviews {
                venues.push(venue);
            } else {
                self.rejections.push(Rejection {
                    place_id: Some(id),
                    reason: RejectReason::TooFewReviews {
                        count: venue.review_count,
                        min: min_reviews,
                    },
                });
            }
        }
        venues.sort_by(|a, b| {
            b.review_count
                .cmp(&a.review_count)
                .then_with(|| a.place_id.cmp(&b.place_id))
        });

        Outcome {
            venues,
            rejections: self.rejections,
            gaps: self.gaps,
            duplicates: self.duplicates,
            requests: self.requests,
        }
    }
}

impl Outcome {
    /// Rejection counts per reason kind, most common first.
    pub fn rejections_by_kind(&self) -> Vec<(&'static str, usize)> {
        self.rejections
            .iter()
            .map(|x| x.reason.kind())
            .counts()
            .into_iter()
            .sorted_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use _model::Source;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::acquire::search::tests::raw;

    fn nearby() -> Provenance {
        Provenance::new(Source::Nearby)
    }

    #[test]
    fn first_sighting_wins() {
        let mut harvest = Harvest::new();
        assert!(harvest.offer(raw("A", 150), &nearby()));
        assert!(!harvest.offer(raw("A", 200), &nearby()));
        assert!(harvest.offer(raw("B", 300), &nearby()));

        let outcome = harvest.finish(100);
        let ids: Vec<_> = outcome.venues.iter().map(|x| x.place_id.as_str()).collect();
        assert_eq!(ids, vec!["B", "A"]);
        assert_eq!(outcome.venues[1].review_count, 150);
        assert_eq!(outcome.duplicates, 1);
    }

    #[test]
    fn ids_are_unique() {
        let mut harvest = Harvest::new();
        for (i, id) in ["A", "B", "A", "C", "B", "A"].iter().enumerate() {
            harvest.offer(raw(id, 100 + i as u32), &nearby());
        }
        let outcome = harvest.finish(0);
        let ids: BTreeSet<_> = outcome.venues.iter().map(|x| &x.place_id).collect();
        assert_eq!(ids.len(), outcome.venues.len());
        assert_eq!(outcome.venues.len(), 3);
        assert_eq!(outcome.duplicates, 3);
    }

    #[test]
    fn threshold() {
        let mut harvest = Harvest::new();
        for (id, reviews) in [("A", 99), ("B", 100), ("C", 5000), ("D", 0)] {
            harvest.offer(raw(id, reviews), &nearby());
        }
        let outcome = harvest.finish(100);
        assert!(outcome.venues.iter().all(|x| x.review_count >= 100));
        assert_eq!(outcome.venues.len(), 2);
        assert_eq!(outcome.rejections_by_kind(), vec![("too-few-reviews", 2)]);
    }

    #[test]
    fn malformed_records_are_counted_not_kept() {
        let mut harvest = Harvest::new();
        harvest.offer(
            RawPlace {
                geometry: None,
                ..raw("A", 150)
            },
            &nearby(),
        );
        harvest.offer(
            RawPlace {
                place_id: None,
                ..raw("B", 150)
            },
            &nearby(),
        );
        harvest.offer(raw("C", 150), &nearby());

        let outcome = harvest.finish(100);
        assert_eq!(outcome.venues.len(), 1);
        assert_eq!(
            outcome.rejections,
            vec![
                Rejection {
                    place_id: Some(PlaceId::new("A")),
                    reason: RejectReason::MissingCoordinates,
                },
                Rejection {
                    place_id: None,
                    reason: RejectReason::MissingId,
                },
            ]
        );
    }

    #[test]
    fn rejected_ids_are_counted_once() {
        let mut harvest = Harvest::new();
        let unrated = || RawPlace {
            rating: None,
            ..raw("X", 150)
        };
        assert!(!harvest.offer(unrated(), &nearby()));
        assert!(!harvest.offer(unrated(), &nearby()));
        assert!(harvest.seen(&PlaceId::new("X")));
        // a rated sighting later on does not resurrect it
        assert!(!harvest.offer(raw("X", 150), &nearby()));

        let outcome = harvest.finish(100);
        assert!(outcome.venues.is_empty());
        assert_eq!(outcome.rejections.len(), 1);
        assert_eq!(outcome.duplicates, 2);
    }

    #[test]
    fn ties_order_by_id() {
        let mut harvest = Harvest::new();
        harvest.offer(raw("B", 200), &nearby());
        harvest.offer(raw("A", 200), &nearby());
        let outcome = harvest.finish(100);
        assert_eq!(outcome.venues[0].place_id, PlaceId::new("A"));
    }
}
