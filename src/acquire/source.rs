use tracing::{info, warn};

use super::{harvest, merge::Harvest, plan::SearchPlan, search::PlaceSearch, seed};
use crate::error::SearchError;

/// Something that can produce a harvest for a plan.
pub trait VenueSource {
    fn name(&self) -> &'static str;

    fn collect(&mut self, plan: &SearchPlan) -> Result<Harvest, SearchError>;
}

/// Queries a live provider.
pub struct Live<S> {
    search: S,
}

impl<S: PlaceSearch> Live<S> {
    pub fn new(search: S) -> Self {
        Self { search }
    }
}

impl<S: PlaceSearch> VenueSource for Live<S> {
    fn name(&self) -> &'static str {
        "live"
    }

    fn collect(&mut self, plan: &SearchPlan) -> Result<Harvest, SearchError> {
        let harvest = harvest::run(&mut self.search, plan)?;
        if harvest.requests == 0 {
            // every query failed, report the first failure
            if let Some(gap) = harvest.gaps.first() {
                return Err(gap.error.clone());
            }
        }
        Ok(harvest)
    }
}

/// Collects from `source`, or from the built-in list when it fails outright.
pub fn collect_or_seed(source: Option<&mut dyn VenueSource>, plan: &SearchPlan) -> Harvest {
    let Some(source) = source else {
        warn!("no API key configured; using built-in sample data");
        return seed::harvest();
    };

    match source.collect(plan) {
        Ok(x) => {
            if x.is_empty() {
                warn!("{} source found no venues", source.name());
            } else {
                info!("{} source returned {} venues", source.name(), x.len());
            }
            x
        }
        Err(err) => {
            warn!("{} source failed: {err}; using built-in sample data", source.name());
            seed::harvest()
        }
    }
}
