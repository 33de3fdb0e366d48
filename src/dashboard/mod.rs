use std::{collections::BTreeSet, fs, path::PathBuf};

use _model::PlaceId;
use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use crate::{config::Config, dataset};

use self::{
    filter::{Filter, Sort, SortKey, View, DEFAULT_MIN_RATING, DEFAULT_MIN_REVIEWS},
    render::Links,
    serve::Dashboard,
};

mod filter;
mod render;
mod serve;
pub mod table;

#[derive(Clone, Debug, Args)]
pub struct DashboardArgs {
    /// Dataset to read [default: from config]
    #[arg(short, long)]
    pub input: Option<PathBuf>,
    #[arg(long, default_value_t = DEFAULT_MIN_RATING)]
    pub min_rating: f64,
    #[arg(long, default_value_t = DEFAULT_MIN_REVIEWS)]
    pub min_reviews: u32,
    #[arg(long, value_enum, default_value_t)]
    pub sort: SortKey,
    /// Sort ascending instead of descending
    #[arg(long)]
    pub ascending: bool,
    /// Hide a venue by place id (repeatable)
    #[arg(long)]
    pub exclude: Vec<String>,
    /// Write the filtered rows as CSV
    #[arg(long)]
    pub export: Option<PathBuf>,
    /// Write a static HTML page with the map and table
    #[arg(long)]
    pub html: Option<PathBuf>,
    /// Serve the dashboard, e.g. 127.0.0.1:8501
    #[arg(long)]
    pub serve: Option<String>,
}

impl DashboardArgs {
    fn view(&self) -> View {
        View {
            filter: Filter {
                min_rating: self.min_rating,
                min_reviews: self.min_reviews,
                excluded: self
                    .exclude
                    .iter()
                    .map(|x| PlaceId::new(x.as_str()))
                    .collect::<BTreeSet<_>>(),
            },
            sort: Sort {
                key: self.sort,
                descending: !self.ascending,
            },
        }
    }
}

pub fn main(args: DashboardArgs, config: Config) -> Result<()> {
    let input = args.input.clone().unwrap_or_else(|| config.dataset.clone());
    let loaded = dataset::load(&input)?;
    info!("loaded {} venues from {}", loaded.venues.len(), input.display());

    let view = args.view();
    let rows = view.select(&loaded.venues);

    if let Some(path) = &args.export {
        dataset::write(path, rows.iter().copied())
            .with_context(|| format!("Failed to export {}", path.display()))?;
        println!("exported {} venues to {}", rows.len(), path.display());
    }

    if let Some(path) = &args.html {
        let links = Links { interactive: false };
        let html = render::page(&rows, loaded.venues.len(), &view, config.center.point(), &links)?;
        fs::write(path, html).with_context(|| format!("Failed to write {}", path.display()))?;
        println!("wrote {}", path.display());
    }

    match &args.serve {
        Some(addr) => {
            let dashboard = Dashboard {
                venues: loaded.venues,
                base: view,
                center: config.center.point(),
            };
            dashboard.serve(addr)
        }
        None => {
            println!("Showing {}/{} venues", rows.len(), loaded.venues.len());
            if rows.is_empty() {
                println!("No venues match the selected filters");
            } else {
                println!("{}", table::venues(&rows));
            }
            Ok(())
        }
    }
}
