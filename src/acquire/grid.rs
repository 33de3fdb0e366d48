use geo::{HaversineDestination, Point};

/// A search origin with its own radius.
#[derive(Clone, Debug, PartialEq)]
pub struct Zone {
    /// 1-based, in generation order
    pub index: u32,
    pub center: Point,
    pub radius_m: f64,
}

/// Lays `count` zone centers on a square lattice around `center`, nearest
/// first. Lattice offsets are ordered by distance from the origin, ties by
/// bearing clockwise from north, so 13 zones give the center, its four axis
/// neighbours, the four diagonals and the four second-ring axis points.
pub fn generate(center: Point, count: usize, spacing_m: f64, radius_m: f64) -> Vec<Zone> {
    offsets(count)
        .into_iter()
        .enumerate()
        .map(|(i, (dx, dy))| Zone {
            index: i as u32 + 1,
            center: project(center, dx, dy, spacing_m),
            radius_m,
        })
        .collect()
}

fn offsets(count: usize) -> Vec<(i64, i64)> {
    // every lattice point within distance k lies in the square, and there are
    // more than `count` of them
    let k = (count as f64).sqrt().ceil() as i64 + 1;

    let mut all = Vec::new();
    for dx in -k..=k {
        for dy in -k..=k {
            all.push((dx, dy));
        }
    }
    all.sort_by(|a, b| {
        let da = a.0 * a.0 + a.1 * a.1;
        let db = b.0 * b.0 + b.1 * b.1;
        da.cmp(&db).then_with(|| bearing(*a).total_cmp(&bearing(*b)))
    });
    all.truncate(count);
    all
}

fn bearing((dx, dy): (i64, i64)) -> f64 {
    (dx as f64).atan2(dy as f64).to_degrees().rem_euclid(360.0)
}

fn project(center: Point, dx: i64, dy: i64, spacing_m: f64) -> Point {
    let north = if dy >= 0 { 0.0 } else { 180.0 };
    let east = if dx >= 0 { 90.0 } else { 270.0 };
    center
        .haversine_destination(north, dy.unsigned_abs() as f64 * spacing_m)
        .haversine_destination(east, dx.unsigned_abs() as f64 * spacing_m)
}
