use std::{cmp::Ordering, collections::BTreeSet};

use _model::{PlaceId, Venue};
use clap::ValueEnum;
use url::form_urlencoded;

pub const DEFAULT_MIN_RATING: f64 = 4.0;
pub const DEFAULT_MIN_REVIEWS: u32 = 500;

/// Criteria a venue has to meet to be shown. All of them apply.
#[derive(Clone, Debug, PartialEq)]
pub struct Filter {
    pub min_rating: f64,
    pub min_reviews: u32,
    /// removed for this session only
    pub excluded: BTreeSet<PlaceId>,
}

impl Default for Filter {
    fn default() -> Self {
        Self {
            min_rating: DEFAULT_MIN_RATING,
            min_reviews: DEFAULT_MIN_REVIEWS,
            excluded: BTreeSet::new(),
        }
    }
}

impl Filter {
    pub fn matches(&self, venue: &Venue) -> bool {
        venue.rating >= self.min_rating
            && venue.review_count >= self.min_reviews
            && !self.excluded.contains(&venue.place_id)
    }

    pub fn apply<'a>(&self, venues: impl IntoIterator<Item = &'a Venue>) -> Vec<&'a Venue> {
        venues.into_iter().filter(|x| self.matches(x)).collect()
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum SortKey {
    Name,
    Address,
    Locality,
    Rating,
    #[default]
    Reviews,
    Phone,
    Website,
    Latitude,
    Longitude,
    OpenNow,
    Tier,
}

impl SortKey {
    pub fn all() -> [Self; 11] {
        [
            Self::Name,
            Self::Address,
            Self::Locality,
            Self::Rating,
            Self::Reviews,
            Self::Phone,
            Self::Website,
            Self::Latitude,
            Self::Longitude,
            Self::OpenNow,
            Self::Tier,
        ]
    }

    pub fn slug(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Address => "address",
            Self::Locality => "locality",
            Self::Rating => "rating",
            Self::Reviews => "reviews",
            Self::Phone => "phone",
            Self::Website => "website",
            Self::Latitude => "latitude",
            Self::Longitude => "longitude",
            Self::OpenNow => "open-now",
            Self::Tier => "tier",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::all().into_iter().find(|x| x.slug() == slug)
    }

    fn compare(&self, a: &Venue, b: &Venue) -> Ordering {
        match self {
            Self::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            Self::Address => a.address.cmp(&b.address),
            Self::Locality => a.locality().cmp(&b.locality()),
            Self::Rating => a.rating.total_cmp(&b.rating),
            Self::Reviews => a.review_count.cmp(&b.review_count),
            Self::Phone => a.phone.cmp(&b.phone),
            Self::Website => a.website.cmp(&b.website),
            Self::Latitude => a.latitude.total_cmp(&b.latitude),
            Self::Longitude => a.longitude.total_cmp(&b.longitude),
            Self::OpenNow => a.open_now.cmp(&b.open_now),
            // best tier first when ascending
            Self::Tier => a.tier().cmp(&b.tier()),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Sort {
    pub key: SortKey,
    pub descending: bool,
}

impl Default for Sort {
    fn default() -> Self {
        Self {
            key: SortKey::Reviews,
            descending: true,
        }
    }
}

impl Sort {
    /// Sorts in place; equal keys fall back to ascending id so the order
    /// never depends on input order.
    pub fn apply(&self, venues: &mut [&Venue]) {
        venues.sort_by(|a, b| {
            let order = self.key.compare(a, b);
            let order = if self.descending { order.reverse() } else { order };
            order.then_with(|| a.place_id.cmp(&b.place_id))
        });
    }
}

/// Filter and sort for one rendering of the dashboard.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct View {
    pub filter: Filter,
    pub sort: Sort,
}

impl View {
    /// Filtered and sorted rows.
    pub fn select<'a>(&self, venues: &'a [Venue]) -> Vec<&'a Venue> {
        let mut rows = self.filter.apply(venues);
        self.sort.apply(&mut rows);
        rows
    }

    /// Reads a view from a query string, starting from `base`. Values that
    /// don't parse keep the base value.
    pub fn from_query(base: &View, query: &str) -> View {
        let mut view = base.clone();
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match &*key {
                "min_rating" => {
                    if let Some(x) = value.parse::<f64>().ok().filter(|x| x.is_finite()) {
                        view.filter.min_rating = x;
                    }
                }
                "min_reviews" => {
                    if let Ok(x) = value.parse() {
                        view.filter.min_reviews = x;
                    }
                }
                "exclude" => {
                    view.filter.excluded.extend(
                        value
                            .split(',')
                            .filter(|x| !x.is_empty())
                            .map(PlaceId::new),
                    );
                }
                "sort" => {
                    if let Some(x) = SortKey::from_slug(&value) {
                        view.sort.key = x;
                    }
                }
                "order" => match &*value {
                    "asc" => view.sort.descending = false,
                    "desc" => view.sort.descending = true,
                    _ => {}
                },
                _ => {}
            }
        }
        view
    }

    pub fn to_query(&self) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        query
            .append_pair("min_rating", &self.filter.min_rating.to_string())
            .append_pair("min_reviews", &self.filter.min_reviews.to_string())
            .append_pair("sort", self.sort.key.slug())
            .append_pair("order", if self.sort.descending { "desc" } else { "asc" });
        if !self.filter.excluded.is_empty() {
            let excluded = self.filter.excluded.iter().map(PlaceId::as_str);
            query.append_pair("exclude", &itertools::join(excluded, ","));
        }
        query.finish()
    }

    /// Same view sorted by `key`; picking the current key flips the order.
    pub fn sorted_by(&self, key: SortKey) -> View {
        let mut view = self.clone();
        if view.sort.key == key {
            view.sort.descending = !view.sort.descending;
        } else {
            view.sort = Sort {
                key,
                descending: matches!(key, SortKey::Rating | SortKey::Reviews),
            };
        }
        view
    }

    /// Same view with one more venue removed.
    pub fn without(&self, id: &PlaceId) -> View {
        let mut view = self.clone();
        view.filter.excluded.insert(id.clone());
        view
    }
}
