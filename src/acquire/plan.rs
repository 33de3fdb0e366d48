use clap::ValueEnum;
use geo::Point;

use super::{grid, grid::Zone, places};
use crate::config::Config;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// one nearby query at the city center
    Quick,
    /// nearby queries from every zone with every keyword
    Grid,
    /// unbiased text queries for every keyword
    Text,
    /// grid, then text
    #[default]
    Comprehensive,
}

impl Mode {
    pub fn nearby(&self) -> bool {
        matches!(self, Self::Quick | Self::Grid | Self::Comprehensive)
    }

    pub fn text(&self) -> bool {
        matches!(self, Self::Text | Self::Comprehensive)
    }
}

/// Everything a run needs to know, resolved from configuration up front so
/// the search itself works on plain data.
#[derive(Clone, Debug)]
pub struct SearchPlan {
    pub mode: Mode,
    pub city: String,
    pub center: Point,
    pub zones: Vec<Zone>,
    pub keywords: Vec<String>,
    pub place_type: Option<String>,
    pub max_pages: usize,
    pub text_max_pages: usize,
    pub metro_radius_m: f64,
    pub min_reviews: u32,
}

impl SearchPlan {
    pub fn new(config: &Config, mode: Mode) -> Self {
        let center = config.center.point();
        let (zones, keywords) = match mode {
            Mode::Quick => (
                grid::generate(center, 1, 0.0, config.quick_radius_m),
                config.keywords.iter().take(1).cloned().collect(),
            ),
            Mode::Text => (Vec::new(), config.keywords.clone()),
            Mode::Grid | Mode::Comprehensive => (
                grid::generate(
                    center,
                    config.zone_count,
                    config.zone_spacing_m,
                    config.zone_radius_m,
                ),
                config.keywords.clone(),
            ),
        };

        Self {
            mode,
            city: config.city.clone(),
            center,
            zones,
            keywords,
            place_type: config.place_type.clone().filter(|x| !x.is_empty()),
            max_pages: config.max_pages.clamp(1, places::MAX_PAGES),
            text_max_pages: config.text_max_pages.clamp(1, places::MAX_PAGES),
            metro_radius_m: config.metro_radius_m,
            min_reviews: config.min_reviews,
        }
    }

    /// Number of (zone, keyword) and text queries the plan issues.
    pub fn query_count(&self) -> usize {
        let nearby = if self.mode.nearby() {
            self.zones.len() * self.keywords.len()
        } else {
            0
        };
        let text = if self.mode.text() {
            self.keywords.len()
        } else {
            0
        };
        nearby + text
    }
}
