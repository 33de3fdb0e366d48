use std::path::PathBuf;

use _model::PlaceId;
use anyhow::{bail, Context, Result};
use clap::{Args, ValueEnum};
use tracing::{info, warn};

use crate::{config::Config, dataset};

use self::{
    grid::Zone,
    places::GooglePlaces,
    plan::{Mode, SearchPlan},
    search::PlaceSearch,
    seed::Seed,
    source::{Live, VenueSource},
};

mod grid;
mod harvest;
mod merge;
mod places;
mod plan;
mod search;
pub(crate) mod seed;
mod source;
mod summary;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum SourceKind {
    /// query Google Places, falling back to the built-in list on failure
    #[default]
    Live,
    /// the built-in list only
    Seed,
}

#[derive(Clone, Debug, Args)]
pub struct FetchArgs {
    #[arg(long, value_enum, default_value_t)]
    pub mode: Mode,
    #[arg(long, value_enum, default_value_t)]
    pub source: SourceKind,
    /// Drop venues with fewer reviews [default: from config]
    #[arg(long)]
    pub min_reviews: Option<u32>,
    /// Number of grid zones [default: from config]
    #[arg(long)]
    pub zones: Option<usize>,
    /// Dataset to write [default: from config]
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn main(args: FetchArgs, mut config: Config) -> Result<()> {
    if let Some(x) = args.min_reviews {
        config.min_reviews = x;
    }
    if let Some(x) = args.zones {
        config.zone_count = x;
    }
    let output = args.output.unwrap_or_else(|| config.dataset.clone());

    let plan = SearchPlan::new(&config, args.mode);
    info!(
        "{:?} search around {} ({} zones, {} keywords, {} queries)",
        plan.mode,
        plan.city,
        plan.zones.len(),
        plan.keywords.len(),
        plan.query_count()
    );

    let harvest = match args.source {
        SourceKind::Seed => Seed.collect(&plan)?,
        SourceKind::Live => match config.api_key() {
            Some(key) => {
                let mut live = Live::new(GooglePlaces::new(key, &config));
                source::collect_or_seed(Some(&mut live), &plan)
            }
            None => source::collect_or_seed(None, &plan),
        },
    };

    let outcome = harvest.finish(plan.min_reviews);
    print!("{}", summary::report(&outcome));

    if outcome.venues.is_empty() {
        warn!(
            "no venues with at least {} reviews; leaving {} untouched",
            plan.min_reviews,
            output.display()
        );
        return Ok(());
    }

    dataset::write(&output, &outcome.venues)
        .with_context(|| format!("Failed to save {}", output.display()))?;
    println!("\nsaved {} venues to {}", outcome.venues.len(), output.display());

    Ok(())
}

/// Issues one small nearby query to confirm the key works.
pub fn check(config: Config) -> Result<()> {
    let Some(key) = config.api_key() else {
        bail!("no API key; set GOOGLE_MAPS_API_KEY or ATLAS_API_KEY");
    };

    let mut places = GooglePlaces::new(key, &config);
    let zone = Zone {
        index: 1,
        center: config.center.point(),
        radius_m: 5_000.0,
    };
    let keyword = config
        .keywords
        .first()
        .context("no search keywords configured")?;

    let page = places
        .nearby(&zone, keyword, config.place_type.as_deref(), None)
        .context("Places API check failed")?;
    println!(
        "Places API OK: {} results for \"{keyword}\" within 5km of {}",
        page.places.len(),
        config.city
    );
    for x in page.places.iter().take(3) {
        let name = x.name.as_deref().unwrap_or("?");
        let id = x.id().map(|x| PlaceId::link(&x)).unwrap_or_default();
        println!("  {name} {id}");
    }

    Ok(())
}
