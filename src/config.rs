//! Layered configuration: built-in defaults, then `atlas.yaml` in the working
//! directory, then `ATLAS_*` environment variables (`__` separates nested
//! keys, e.g. `ATLAS_CENTER__LAT`). The provider key is also read from
//! `GOOGLE_MAPS_API_KEY`; `ATLAS_API_KEY` wins when both are set.

use std::{path::PathBuf, time::Duration};

use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use geo::Point;
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const CONFIG_FILE: &str = "atlas.yaml";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    pub api_key: Option<String>,
    pub city: String,
    pub center: Coordinate,
    pub zone_count: usize,
    /// metres between neighbouring zone centers
    pub zone_spacing_m: f64,
    pub zone_radius_m: f64,
    pub quick_radius_m: f64,
    /// text search results farther than this from `center` are dropped
    pub metro_radius_m: f64,
    pub keywords: Vec<String>,
    pub place_type: Option<String>,
    pub min_reviews: u32,
    pub max_pages: usize,
    pub text_max_pages: usize,
    pub dataset: PathBuf,
    pub request_pause_ms: u64,
    pub page_token_delay_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn point(&self) -> Point {
        Point::new(self.lon, self.lat)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            city: "Bangalore".to_string(),
            center: Coordinate {
                lat: 12.9716,
                lon: 77.5946,
            },
            zone_count: 13,
            zone_spacing_m: 9_000.0,
            zone_radius_m: 15_000.0,
            quick_radius_m: 30_000.0,
            metro_radius_m: 50_000.0,
            keywords: [
                "eye hospital",
                "ophthalmology hospital",
                "eye clinic",
                "eye care center",
                "eye institute",
                "cornea hospital",
                "retina hospital",
                "cataract hospital",
            ]
            .iter()
            .map(|x| x.to_string())
            .collect(),
            place_type: Some("hospital".to_string()),
            min_reviews: 100,
            max_pages: 3,
            text_max_pages: 2,
            dataset: PathBuf::from("eye_hospitals_bangalore_comprehensive.csv"),
            request_pause_ms: 1_000,
            page_token_delay_ms: 2_000,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, figment::Error> {
        Self::figment().extract()
    }

    /// Like [`Config::load`], after reading `.env` from the working directory
    /// if there is one.
    pub fn load_with_dotenv() -> Result<Self, figment::Error> {
        dotenv_loaded(dotenvy::dotenv());
        Self::load()
    }

    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        let file = PathBuf::from(CONFIG_FILE);
        if file.exists() {
            figment = figment.merge(Yaml::file(file));
        }

        figment
            .merge(
                Env::raw()
                    .only(&["GOOGLE_MAPS_API_KEY"])
                    .map(|_| "api_key".into()),
            )
            .merge(Env::prefixed("ATLAS_").split("__"))
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|x| !x.is_empty())
    }

    pub fn request_pause(&self) -> Duration {
        Duration::from_millis(self.request_pause_ms)
    }

    pub fn page_token_delay(&self) -> Duration {
        Duration::from_millis(self.page_token_delay_ms)
    }
}

/// A missing `.env` is fine, a malformed one is logged and skipped.
fn dotenv_loaded<T>(result: dotenvy::Result<T>) -> bool {
    match result {
        Ok(_) => true,
        Err(err) if err.not_found() => false,
        Err(err) => {
            warn!("ignoring .env: {err}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use figment::Jail;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn defaults_match_the_bangalore_setup() {
        let config = Config::default();
        assert_eq!(config.zone_count, 13);
        assert_eq!(config.keywords.len(), 8);
        assert_eq!(config.min_reviews, 100);
        assert_eq!(config.center.point().y(), 12.9716);
    }

    #[test]
    fn file_then_env() {
        Jail::expect_with(|jail| {
            jail.create_file(CONFIG_FILE, "city: Chennai\nmin_reviews: 250\nzone_count: 7\n")?;
            jail.set_env("ATLAS_ZONE_COUNT", "5");
            jail.set_env("ATLAS_CENTER__LAT", "13.0827");

            let config: Config = Config::figment().extract()?;
            assert_eq!(config.city, "Chennai");
            assert_eq!(config.min_reviews, 250);
            assert_eq!(config.zone_count, 5);
            assert_eq!(config.center.lat, 13.0827);
            assert_eq!(config.center.lon, 77.5946);
            Ok(())
        });
    }

    #[test]
    fn prefixed_key_wins_over_provider_variable() {
        Jail::expect_with(|jail| {
            jail.set_env("GOOGLE_MAPS_API_KEY", "from-google");
            jail.set_env("ATLAS_API_KEY", "from-atlas");

            let config: Config = Config::figment().extract()?;
            assert_eq!(config.api_key(), Some("from-atlas"));
            Ok(())
        });
    }

    #[test]
    fn dotenv_errors() {
        Jail::expect_with(|jail| {
            let missing = jail.directory().join("missing.env");
            let err = dotenvy::from_path(&missing).unwrap_err();
            assert!(err.not_found());
            assert!(!dotenv_loaded(Err::<(), _>(err)));

            jail.create_file("broken.env", "ATLAS_BROKEN='unterminated\n")?;
            let err = dotenvy::from_path(jail.directory().join("broken.env")).unwrap_err();
            assert!(!err.not_found());
            assert!(!dotenv_loaded(Err::<(), _>(err)));

            jail.create_file("good.env", "# nothing\n")?;
            assert!(dotenv_loaded(dotenvy::from_path(jail.directory().join("good.env"))));
            Ok(())
        });
    }

    #[test]
    fn blank_key_counts_as_missing() {
        let config = Config {
            api_key: Some("  ".to_string()),
            ..Config::default()
        };
        assert_eq!(config.api_key(), None);
    }
}
