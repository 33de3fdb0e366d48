use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use _model::Venue;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::DatasetError;

/// Rows read from a dataset file. Rows that fail to parse are skipped and
/// counted, never fatal.
#[derive(Debug)]
pub struct Loaded {
    pub venues: Vec<Venue>,
    pub skipped: Vec<(u64, String)>,
}

pub fn load(path: &Path) -> Result<Loaded, DatasetError> {
    if !path.exists() {
        return Err(DatasetError::DatasetMissing {
            path: path.to_path_buf(),
        });
    }

    let file = fs::File::open(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(file);

    let mut venues = Vec::new();
    let mut skipped = Vec::new();
    for (row, record) in reader.deserialize::<Venue>().enumerate() {
        let line = row as u64 + 2; // header is line 1
        match record {
            Ok(x) => venues.push(x),
            Err(err) if err.is_io_error() => {
                return Err(DatasetError::Csv {
                    path: path.to_path_buf(),
                    source: err,
                })
            }
            Err(err) => {
                debug!("skipping row {line} of {}: {err}", path.display());
                skipped.push((line, err.to_string()));
            }
        }
    }

    if !skipped.is_empty() {
        warn!(
            "skipped {} malformed rows in {}",
            skipped.len(),
            path.display()
        );
    }

    Ok(Loaded { venues, skipped })
}

pub fn write_to<'a, W: Write>(
    writer: W,
    venues: impl IntoIterator<Item = &'a Venue>,
) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(writer);
    for x in venues {
        writer.serialize(x)?;
    }
    writer.flush()?;
    Ok(())
}

/// Replaces `path` with the given rows. The rows go to a temporary file next
/// to `path` first, which is then renamed over it, so readers only ever see
/// the old or the new file.
pub fn write<'a>(
    path: &Path,
    venues: impl IntoIterator<Item = &'a Venue>,
) -> Result<(), DatasetError> {
    let io_err = |source: io::Error| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(x) if !x.as_os_str().is_empty() => x.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir).map_err(io_err)?;

    let mut tmp = NamedTempFile::new_in(&dir).map_err(io_err)?;
    write_to(tmp.as_file_mut(), venues).map_err(|source| DatasetError::Csv {
        path: path.to_path_buf(),
        source,
    })?;
    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(path).map_err(|x| io_err(x.error))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use _model::{PlaceId, Provenance, Source};
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    use super::*;

    fn venues() -> Vec<Venue> {
        vec![
            Venue {
                place_id: PlaceId::new("ChIJa"),
                name: "Narayana Nethralaya".to_string(),
                address: "#121, Chord Road, Bangalore 560001".to_string(),
                latitude: 13.0065,
                longitude: 77.5956,
                rating: 4.5,
                review_count: 2150,
                phone: Some("+91 80 4055 2000".to_string()),
                website: Some("https://www.narayananethralaya.org".to_string()),
                open_now: Some(true),
                source: None,
                zone: None,
                keyword: None,
            }
            .with_provenance(&Provenance::new(Source::Nearby).zone(4).keyword("eye clinic")),
            Venue {
                place_id: PlaceId::new("ChIJb"),
                name: "Clinic, \"quoted\"".to_string(),
                address: "Koramangala".to_string(),
                latitude: 12.932_012_345_678,
                longitude: 77.620_098_765_432,
                rating: 4.3,
                review_count: 750,
                phone: None,
                website: None,
                open_now: None,
                source: None,
                zone: None,
                keyword: None,
            },
        ]
    }

    #[test]
    fn round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("venues.csv");
        let original = venues();

        write(&path, &original).unwrap();
        let loaded = load(&path).unwrap();

        assert!(loaded.skipped.is_empty());
        assert_eq!(loaded.venues.len(), original.len());
        for (a, b) in original.iter().zip(&loaded.venues) {
            assert!((a.latitude - b.latitude).abs() < 1e-9);
            assert!((a.longitude - b.longitude).abs() < 1e-9);
            assert!((a.rating - b.rating).abs() < 1e-9);
            assert_eq!(a, b);
        }
    }

    #[test]
    fn header_has_stable_field_names() {
        let mut out = Vec::new();
        write_to(&mut out, &venues()).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text.lines().next().unwrap(),
            "place_id,name,address,latitude,longitude,rating,review_count,phone,website,open_now,source,zone,keyword"
        );
    }

    #[test]
    fn missing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nope.csv");
        assert!(matches!(
            load(&path),
            Err(DatasetError::DatasetMissing { path: p }) if p == path
        ));
    }

    #[test]
    fn malformed_rows_are_skipped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("venues.csv");
        let mut out = Vec::new();
        write_to(&mut out, &venues()).unwrap();
        let mut text = String::from_utf8(out).unwrap();
        text.push_str("ChIJc,Broken,Somewhere,not-a-number,77.1,4.0,100,,,,,,\n");
        fs::write(&path, text).unwrap();

        let loaded = load(&path).unwrap();
        assert_eq!(loaded.venues.len(), 2);
        assert_eq!(loaded.skipped.len(), 1);
        assert_eq!(loaded.skipped[0].0, 4);
    }

    #[test]
    fn write_replaces_previous_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("venues.csv");
        let all = venues();

        write(&path, &all).unwrap();
        write(&path, &all[..1]).unwrap();

        assert_eq!(load(&path).unwrap().venues, all[..1].to_vec());
        // only the dataset itself is left behind
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
