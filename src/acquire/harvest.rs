use _model::{Provenance, Source};
use geo::{HaversineDistance, Point};
use indicatif::ProgressBar;
use tracing::{debug, info, warn};

use super::{
    merge::Harvest,
    plan::{Mode, SearchPlan},
    search::{Page, PlaceSearch, RawPlace, RejectReason},
};
use crate::{error::SearchError, utils::progress_bar};

/// Runs every query in `plan` against `search`, one after the other.
///
/// Rate limits and outages only cost the query they hit; it is recorded as a
/// gap and the run moves on. A denial (bad key, billing) ends the run with
/// an error since no later query can succeed either.
pub fn run<S: PlaceSearch>(search: &mut S, plan: &SearchPlan) -> Result<Harvest, SearchError> {
    let mut harvester = Harvester {
        search,
        harvest: Harvest::new(),
        pb: progress_bar(plan.query_count() as u64),
    };

    if plan.mode.nearby() {
        harvester.nearby_pass(plan)?;
    }
    if plan.mode.text() {
        harvester.text_pass(plan)?;
    }
    harvester.pb.finish_and_clear();

    info!(
        "search complete: {} unique venues, {} requests, {} gaps",
        harvester.harvest.len(),
        harvester.harvest.requests,
        harvester.harvest.gaps.len()
    );
    Ok(harvester.harvest)
}

struct Harvester<'a, S> {
    search: &'a mut S,
    harvest: Harvest,
    pb: ProgressBar,
}

/// Results must lie within `radius_m` of `center`.
#[derive(Clone, Copy)]
struct Bound {
    center: Point,
    radius_m: f64,
}

impl Bound {
    /// Distance from the center when `raw` lies outside.
    fn exceeded_by(&self, raw: &RawPlace) -> Option<f64> {
        let (lat, lng) = raw.position()?;
        let distance_m = self.center.haversine_distance(&Point::new(lng, lat));
        (distance_m > self.radius_m).then_some(distance_m)
    }
}

impl<'a, S: PlaceSearch> Harvester<'a, S> {
    fn nearby_pass(&mut self, plan: &SearchPlan) -> Result<(), SearchError> {
        let place_type = plan.place_type.as_deref();
        for zone in &plan.zones {
            let before = self.harvest.len();
            self.pb.set_message(format!("zone {}/{}", zone.index, plan.zones.len()));

            for keyword in &plan.keywords {
                let provenance = match plan.mode {
                    Mode::Quick => Provenance::new(Source::Quick),
                    _ => Provenance::new(Source::Nearby).zone(zone.index),
                }
                .keyword(keyword);

                self.paginate(
                    &format!("zone {} / {keyword}", zone.index),
                    plan.max_pages,
                    &provenance,
                    None,
                    |s, token| s.nearby(zone, keyword, place_type, token),
                )?;
                self.pb.inc(1);
            }

            let new = self.harvest.len() - before;
            if new > 0 {
                info!(
                    "zone {}/{} ({:.4}, {:.4}): {new} new venues",
                    zone.index,
                    plan.zones.len(),
                    zone.center.y(),
                    zone.center.x()
                );
            }
        }
        Ok(())
    }

    fn text_pass(&mut self, plan: &SearchPlan) -> Result<(), SearchError> {
        let bound = Bound {
            center: plan.center,
            radius_m: plan.metro_radius_m,
        };
        for keyword in &plan.keywords {
            let before = self.harvest.len();
            let query = format!("{keyword} {}", plan.city);
            self.pb.set_message(format!("text \"{query}\""));

            self.paginate(
                &format!("text / {keyword}"),
                plan.text_max_pages,
                &Provenance::new(Source::Text).keyword(keyword),
                Some(bound),
                |s, token| s.text(&query, token),
            )?;
            self.pb.inc(1);

            let new = self.harvest.len() - before;
            if new > 0 {
                info!("text \"{query}\": {new} new venues");
            }
        }
        Ok(())
    }

    fn paginate<F>(
        &mut self,
        label: &str,
        max_pages: usize,
        provenance: &Provenance,
        bound: Option<Bound>,
        mut fetch: F,
    ) -> Result<(), SearchError>
    where
        F: FnMut(&mut S, Option<&str>) -> Result<Page, SearchError>,
    {
        let mut token: Option<String> = None;
        for page in 1..=max_pages {
            let result = fetch(&mut *self.search, token.as_deref());
            let Page {
                places,
                next_page_token,
            } = match result {
                Ok(x) => x,
                Err(err) if err.is_denied() => return Err(err),
                Err(err) => {
                    warn!("{label}, page {page}: {err}; skipping");
                    self.harvest.gap(label, page, err);
                    break;
                }
            };
            self.harvest.requests += 1;
            debug!("{label}, page {page}: {} results", places.len());

            for raw in places {
                self.accept(raw, provenance, bound)?;
            }

            match next_page_token {
                Some(x) if !x.is_empty() => token = Some(x),
                _ => break,
            }
        }
        Ok(())
    }

    fn accept(
        &mut self,
        raw: RawPlace,
        provenance: &Provenance,
        bound: Option<Bound>,
    ) -> Result<(), SearchError> {
        let Some(id) = raw.id() else {
            self.harvest.reject(None, RejectReason::MissingId);
            return Ok(());
        };
        if self.harvest.seen(&id) {
            self.harvest.duplicates += 1;
            return Ok(());
        }

        // checked before details when possible to save the lookup
        if let Some(distance_m) = bound.and_then(|x| x.exceeded_by(&raw)) {
            self.harvest
                .reject(Some(id), RejectReason::OutsideMetro { distance_m });
            return Ok(());
        }

        let raw = match self.search.details(&id) {
            Ok(details) => {
                self.harvest.requests += 1;
                raw.merge(details)
            }
            Err(err) if err.is_denied() => return Err(err),
            Err(err) => {
                warn!("details for {id}: {err}; keeping search result");
                self.harvest.gap(format!("details {id}"), 1, err);
                raw
            }
        };
        if let Some(distance_m) = bound.and_then(|x| x.exceeded_by(&raw)) {
            self.harvest
                .reject(Some(id), RejectReason::OutsideMetro { distance_m });
            return Ok(());
        }
        self.harvest.offer(raw, provenance);
        Ok(())
    }
}
