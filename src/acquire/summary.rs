use std::fmt::{self, Write};

use _model::Venue;
use itertools::Itertools;

use super::merge::Outcome;
use crate::dashboard::table;

/// Headline numbers over a set of venues.
#[derive(Debug, PartialEq)]
pub struct Stats {
    pub count: usize,
    pub avg_rating: f64,
    pub max_rating: f64,
    pub min_rating: f64,
    pub total_reviews: u64,
    pub avg_reviews: f64,
    pub median_reviews: f64,
}

impl Stats {
    pub fn of(venues: &[Venue]) -> Option<Self> {
        if venues.is_empty() {
            return None;
        }
        let count = venues.len();
        let ratings = venues.iter().map(|x| x.rating);
        let total_reviews: u64 = venues.iter().map(|x| x.review_count as u64).sum();

        let reviews: Vec<_> = venues.iter().map(|x| x.review_count).sorted().collect();
        let median_reviews = if count % 2 == 1 {
            reviews[count / 2] as f64
        } else {
            (reviews[count / 2 - 1] as f64 + reviews[count / 2] as f64) / 2.0
        };

        Some(Self {
            count,
            avg_rating: ratings.clone().sum::<f64>() / count as f64,
            max_rating: ratings.clone().fold(f64::MIN, f64::max),
            min_rating: ratings.fold(f64::MAX, f64::min),
            total_reviews,
            avg_reviews: total_reviews as f64 / count as f64,
            median_reviews,
        })
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "venues:          {}", self.count)?;
        writeln!(
            f,
            "rating:          avg {:.2}, max {:.1}, min {:.1}",
            self.avg_rating, self.max_rating, self.min_rating
        )?;
        write!(
            f,
            "reviews:         total {}, avg {:.0}, median {:.0}",
            self.total_reviews, self.avg_reviews, self.median_reviews
        )
    }
}

/// Plain text report of a finished run.
pub fn report(outcome: &Outcome) -> String {
    Report(outcome).to_string()
}

struct Report<'a>(&'a Outcome);

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_report(f, self.0)
    }
}

fn write_report(f: &mut impl Write, outcome: &Outcome) -> fmt::Result {
    match Stats::of(&outcome.venues) {
        Some(stats) => writeln!(f, "{stats}")?,
        None => writeln!(f, "venues:          0")?,
    }
    writeln!(
        f,
        "requests:        {} ({} duplicate sightings)",
        outcome.requests, outcome.duplicates
    )?;

    if !outcome.venues.is_empty() {
        let rows: Vec<_> = outcome
            .venues
            .iter()
            .take(10)
            .enumerate()
            .map(|(i, x)| {
                vec![
                    (i + 1).to_string(),
                    table::truncate(&x.name, 40),
                    format!("{:.1}", x.rating),
                    x.review_count.to_string(),
                ]
            })
            .collect();
        writeln!(f, "\ntop {} by reviews:", rows.len())?;
        writeln!(f, "{}", table::render(&["#", "name", "rating", "reviews"], &rows))?;
    }

    if !outcome.gaps.is_empty() {
        writeln!(f, "\n{} queries incomplete:", outcome.gaps.len())?;
        for gap in &outcome.gaps {
            writeln!(f, "  {} (page {}): {}", gap.query, gap.page, gap.error)?;
        }
    }

    let rejections = outcome.rejections_by_kind();
    if !rejections.is_empty() {
        writeln!(f, "\nrejected:")?;
        for (kind, count) in rejections {
            writeln!(f, "  {kind}: {count}")?;
        }
    }
    Ok(())
}
