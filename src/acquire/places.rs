use std::{thread::sleep, time::Duration};

use _model::PlaceId;
use serde::{de::DeserializeOwned, Deserialize};
use tracing::debug;
use ureq::{Agent, AgentBuilder, Request};

use super::{
    grid::Zone,
    search::{Page, PlaceSearch, RawPlace},
};
use crate::{config::Config, error::SearchError};

const NEARBY_URL: &str = "https://maps.googleapis.com/maps/api/place/nearbysearch/json";
const TEXT_URL: &str = "https://maps.googleapis.com/maps/api/place/textsearch/json";
const DETAILS_URL: &str = "https://maps.googleapis.com/maps/api/place/details/json";

/// The provider never returns more than three pages per query.
pub const MAX_PAGES: usize = 3;
pub const PAGE_SIZE: usize = 20;
/// Largest radius the nearby endpoint accepts.
pub const MAX_RADIUS_M: f64 = 50_000.0;

const DETAIL_FIELDS: &str = "place_id,name,formatted_address,geometry,rating,user_ratings_total,formatted_phone_number,website,opening_hours";
/// Pause for `request_pause` after this many requests.
const PAUSE_EVERY: usize = 10;

/// Google Places web service client. Calls block and are paced: a short
/// sleep every few requests, and a longer one before a page token is used
/// since fresh tokens are rejected.
pub struct GooglePlaces {
    agent: Agent,
    key: String,
    requests: usize,
    pause: Duration,
    page_token_delay: Duration,
}

impl GooglePlaces {
    pub fn new(key: &str, config: &Config) -> Self {
        let agent = AgentBuilder::new()
            .user_agent(concat!("atlas/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build();
        Self {
            agent,
            key: key.to_string(),
            requests: 0,
            pause: config.request_pause(),
            page_token_delay: config.page_token_delay(),
        }
    }

    fn pace(&mut self, page_token: Option<&str>) {
        if page_token.is_some() {
            sleep(self.page_token_delay);
        }
        self.requests += 1;
        if self.requests % PAUSE_EVERY == 0 {
            sleep(self.pause);
        }
    }

    fn get<T: DeserializeOwned>(&self, request: Request) -> Result<T, SearchError> {
        let response = match request.query("key", &self.key).call() {
            Ok(x) => x,
            Err(ureq::Error::Status(code, _)) => return Err(status_error(code)),
            Err(ureq::Error::Transport(x)) => return Err(SearchError::unavailable(x.to_string())),
        };
        let envelope: Envelope<T> = response
            .into_json()
            .map_err(|x| SearchError::unavailable(format!("malformed response: {x}")))?;
        envelope.into_result()
    }

    fn search(&mut self, request: Request, page_token: Option<&str>) -> Result<Page, SearchError> {
        self.pace(page_token);
        let request = match page_token {
            Some(token) => request.query("pagetoken", token),
            None => request,
        };
        let body: SearchBody = self.get(request)?;
        debug!(
            "{}/{PAGE_SIZE} results, more: {}",
            body.results.len(),
            body.next_page_token.is_some()
        );
        Ok(Page {
            places: body.results,
            next_page_token: body.next_page_token,
        })
    }
}

impl PlaceSearch for GooglePlaces {
    fn nearby(
        &mut self,
        zone: &Zone,
        keyword: &str,
        place_type: Option<&str>,
        page_token: Option<&str>,
    ) -> Result<Page, SearchError> {
        let mut request = self
            .agent
            .get(NEARBY_URL)
            .query(
                "location",
                &format!("{},{}", zone.center.y(), zone.center.x()),
            )
            .query("radius", &format!("{:.0}", zone.radius_m.min(MAX_RADIUS_M)))
            .query("keyword", keyword);
        if let Some(x) = place_type {
            request = request.query("type", x);
        }
        self.search(request, page_token)
    }

    fn text(&mut self, query: &str, page_token: Option<&str>) -> Result<Page, SearchError> {
        let request = self.agent.get(TEXT_URL).query("query", query);
        self.search(request, page_token)
    }

    fn details(&mut self, place_id: &PlaceId) -> Result<RawPlace, SearchError> {
        self.pace(None);
        let request = self
            .agent
            .get(DETAILS_URL)
            .query("place_id", place_id.as_str())
            .query("fields", DETAIL_FIELDS);
        let body: DetailsBody = self.get(request)?;
        Ok(body.result.unwrap_or_default())
    }
}

fn status_error(code: u16) -> SearchError {
    match code {
        429 => SearchError::RateLimitExceeded,
        401 | 403 => SearchError::denied(format!("HTTP {code}")),
        _ => SearchError::unavailable(format!("HTTP {code}")),
    }
}

#[derive(Deserialize)]
struct Envelope<T> {
    status: Status,
    error_message: Option<String>,
    #[serde(flatten)]
    body: T,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
enum Status {
    Ok,
    ZeroResults,
    OverQueryLimit,
    RequestDenied,
    InvalidRequest,
    NotFound,
    UnknownError,
    #[serde(other)]
    Other,
}

impl<T> Envelope<T> {
    fn into_result(self) -> Result<T, SearchError> {
        let reason = || {
            let status = format!("{:?}", self.status);
            match &self.error_message {
                Some(x) => format!("{status}: {x}"),
                None => status,
            }
        };
        match self.status {
            Status::Ok | Status::ZeroResults => Ok(self.body),
            Status::OverQueryLimit => Err(SearchError::RateLimitExceeded),
            Status::RequestDenied => Err(SearchError::denied(reason())),
            _ => Err(SearchError::unavailable(reason())),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchBody {
    #[serde(default)]
    results: Vec<RawPlace>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DetailsBody {
    result: Option<RawPlace>,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn parse<T: DeserializeOwned>(json: &str) -> Result<T, SearchError> {
        serde_json::from_str::<Envelope<T>>(json)
            .unwrap()
            .into_result()
    }

    #[test]
    fn search_page() {
        let body: SearchBody = parse(
            r#"{
                "status": "OK",
                "html_attributions": [],
                "next_page_token": "abc",
                "results": [{
                    "place_id": "ChIJ1",
                    "name": "Narayana Nethralaya",
                    "vicinity": "Rajajinagar, Bengaluru",
                    "geometry": {"location": {"lat": 13.0065, "lng": 77.5956}, "viewport": {}},
                    "rating": 4.5,
                    "user_ratings_total": 2150,
                    "opening_hours": {"open_now": true},
                    "types": ["hospital", "health"]
                }]
            }"#,
        )
        .unwrap();
        assert_eq!(body.next_page_token.as_deref(), Some("abc"));
        assert_eq!(body.results.len(), 1);
        let place = &body.results[0];
        assert_eq!(place.position(), Some((13.0065, 77.5956)));
        assert_eq!(place.user_ratings_total, Some(2150));
    }

    #[test]
    fn zero_results_is_an_empty_page() {
        let body: SearchBody = parse(r#"{"status": "ZERO_RESULTS", "results": []}"#).unwrap();
        assert!(body.results.is_empty());
        let body: SearchBody = parse(r#"{"status": "ZERO_RESULTS"}"#).unwrap();
        assert!(body.next_page_token.is_none());
    }

    #[test]
    fn status_mapping() {
        let err = parse::<SearchBody>(r#"{"status": "OVER_QUERY_LIMIT"}"#).unwrap_err();
        assert_eq!(err, SearchError::RateLimitExceeded);

        let err = parse::<SearchBody>(
            r#"{"status": "REQUEST_DENIED", "error_message": "The provided API key is invalid."}"#,
        )
        .unwrap_err();
        assert!(err.is_denied());
        assert_eq!(
            err.to_string(),
            "search unavailable: RequestDenied: The provided API key is invalid."
        );

        let err = parse::<SearchBody>(r#"{"status": "INVALID_REQUEST"}"#).unwrap_err();
        assert!(!err.is_denied());

        let err = parse::<SearchBody>(r#"{"status": "SOMETHING_NEW"}"#).unwrap_err();
        assert_eq!(err, SearchError::unavailable("Other"));
    }

    #[test]
    fn http_status_mapping() {
        assert_eq!(status_error(429), SearchError::RateLimitExceeded);
        assert!(status_error(403).is_denied());
        assert!(!status_error(502).is_denied());
    }

    #[test]
    fn details_result() {
        let body: DetailsBody = parse(
            r#"{"status": "OK", "result": {"formatted_phone_number": "080 6612 1643", "website": "http://www.narayananethralaya.org/"}}"#,
        )
        .unwrap();
        let place = body.result.unwrap();
        assert_eq!(place.formatted_phone_number.as_deref(), Some("080 6612 1643"));
        assert!(place.place_id.is_none());
    }
}
