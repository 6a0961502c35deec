use crate::models::Coordinate;

pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance in meters on a spherical Earth.
///
/// Uses the `asin` form of the haversine so identical points give exactly `0.0`.
pub fn haversine_m(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let sin_dlat = (dlat / 2.0).sin();
    let sin_dlon = (dlon / 2.0).sin();

    let h = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlon * sin_dlon;
    // Rounding can push h a hair above 1 for antipodal points.
    2.0 * EARTH_RADIUS_M * h.clamp(0.0, 1.0).sqrt().asin()
}

/// Running distance from the first vertex through each vertex of `path`.
///
/// Same length as `path`; `[]` for an empty path and `[0.0]` for a single point.
pub fn cumulative_distances(path: &[Coordinate]) -> Vec<f64> {
    let Some(first) = path.first() else {
        return Vec::new();
    };

    let mut cumulative = Vec::with_capacity(path.len());
    let mut total = 0.0;
    let mut previous = *first;
    cumulative.push(total);
    for &coord in &path[1..] {
        total += haversine_m(previous, coord);
        cumulative.push(total);
        previous = coord;
    }
    cumulative
}

/// Index of the vertex of `path` closest to `point`, earliest index on ties.
///
/// Brute-force scan; see [`crate::spatial::VertexIndex`] for long paths.
pub fn nearest_index(path: &[Coordinate], point: Coordinate) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, &coord) in path.iter().enumerate() {
        let d = haversine_m(coord, point);
        match best {
            Some((_, min)) if d >= min => {}
            _ => best = Some((idx, d)),
        }
    }
    best.map(|(idx, _)| idx)
}
