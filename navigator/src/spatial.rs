use kdtree::KdTree;
use kdtree::distance::squared_euclidean;

use crate::{error::NavigatorError, geometry, models::Coordinate};

/// Candidates whose squared chord is within this margin of the k-d tree hit are
/// re-ranked with the haversine, so float noise between the two metrics cannot
/// change the answer.
const CHORD_SQ_REL_TOLERANCE: f64 = 1e-9;
const CHORD_SQ_ABS_TOLERANCE: f64 = 1e-16;

/// Snaps a position to the nearest vertex of a flattened route.
///
/// Implementations must agree with [`geometry::nearest_index`]: haversine
/// metric, earliest index on ties, `None` only for an empty path.
pub trait PathProjector: Send + Sync {
    fn nearest_index(&self, point: Coordinate) -> Option<usize>;
}

/// Brute-force projector, fine for the tens-to-hundreds of vertices of a campus route.
#[derive(Debug, Clone)]
pub struct LinearScan {
    path: Vec<Coordinate>,
}

impl LinearScan {
    pub fn new(path: Vec<Coordinate>) -> Self {
        Self { path }
    }
}

impl PathProjector for LinearScan {
    fn nearest_index(&self, point: Coordinate) -> Option<usize> {
        geometry::nearest_index(&self.path, point)
    }
}

/// K-d tree over route vertices mapped onto the unit sphere.
///
/// Chord length is monotone in great-circle distance, so the Euclidean
/// nearest neighbour in 3-D is the haversine nearest neighbour.
#[derive(Clone)]
pub struct VertexIndex {
    path: Vec<Coordinate>,
    tree: KdTree<f64, usize, [f64; 3]>,
}

impl VertexIndex {
    /// Complexity: O(N log N) to build, O(log N) to query
    pub fn new(path: Vec<Coordinate>) -> Result<Self, NavigatorError> {
        let mut tree = KdTree::new(3);
        for (idx, coord) in path.iter().enumerate() {
            tree.add(unit_vector(*coord), idx)
                .map_err(|_| NavigatorError::NonFiniteInput("route geometry"))?;
        }
        Ok(Self { path, tree })
    }
}

impl PathProjector for VertexIndex {
    fn nearest_index(&self, point: Coordinate) -> Option<usize> {
        let target = unit_vector(point);
        let nearest = self.tree.nearest(&target, 1, &squared_euclidean).ok()?;
        let &(best_chord_sq, _) = nearest.first()?;

        let radius = best_chord_sq * (1.0 + CHORD_SQ_REL_TOLERANCE) + CHORD_SQ_ABS_TOLERANCE;
        let candidates = self.tree.within(&target, radius, &squared_euclidean).ok()?;

        candidates
            .into_iter()
            .map(|(_, &idx)| (idx, geometry::haversine_m(self.path[idx], point)))
            .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)))
            .map(|(idx, _)| idx)
    }
}

/// Picks the linear scan for short paths and the k-d tree from `threshold` vertices up.
pub fn projector_for(
    path: Vec<Coordinate>,
    threshold: usize,
) -> Result<Box<dyn PathProjector>, NavigatorError> {
    if path.len() >= threshold && !path.is_empty() {
        tracing::debug!("indexing {} route vertices in a k-d tree", path.len());
        Ok(Box::new(VertexIndex::new(path)?))
    } else {
        Ok(Box::new(LinearScan::new(path)))
    }
}

fn unit_vector(coord: Coordinate) -> [f64; 3] {
    let lat = coord.lat.to_radians();
    let lon = coord.lon.to_radians();
    [lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin()]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(lon: f64, lat: f64) -> Coordinate {
        Coordinate::new(lon, lat)
    }

    fn campus_path() -> Vec<Coordinate> {
        vec![
            coord(-73.5789, 45.4973),
            coord(-73.5791, 45.4969),
            coord(-73.5791, 45.4969),
            coord(-73.5795, 45.4962),
            coord(-73.5802, 45.4958),
            coord(-73.5810, 45.4955),
        ]
    }

    #[test]
    fn index_matches_linear_scan_on_vertices() {
        let path = campus_path();
        let index = VertexIndex::new(path.clone()).unwrap();
        let scan = LinearScan::new(path.clone());
        for &vertex in &path {
            assert_eq!(index.nearest_index(vertex), scan.nearest_index(vertex));
        }
    }

    #[test]
    fn index_keeps_earliest_duplicate() {
        let index = VertexIndex::new(campus_path()).unwrap();
        assert_eq!(index.nearest_index(coord(-73.5791, 45.4969)), Some(1));
    }

    #[test]
    fn equidistant_vertices_resolve_to_earliest_index() {
        let path = vec![coord(0.0, 0.001), coord(0.0, -0.001)];
        let origin = coord(0.0, 0.0);
        assert_eq!(
            geometry::haversine_m(path[0], origin),
            geometry::haversine_m(path[1], origin)
        );

        let index = VertexIndex::new(path.clone()).unwrap();
        let scan = LinearScan::new(path.clone());
        assert_eq!(index.nearest_index(origin), Some(0));
        assert_eq!(scan.nearest_index(origin), Some(0));

        let reversed: Vec<_> = path.into_iter().rev().collect();
        let index = VertexIndex::new(reversed.clone()).unwrap();
        assert_eq!(index.nearest_index(origin), Some(0));
        assert_eq!(LinearScan::new(reversed).nearest_index(origin), Some(0));
    }

    #[test]
    fn empty_index_has_no_nearest_vertex() {
        let index = VertexIndex::new(Vec::new()).unwrap();
        assert_eq!(index.nearest_index(coord(0.0, 0.0)), None);
    }

    #[test]
    fn non_finite_vertex_is_rejected() {
        let result = VertexIndex::new(vec![coord(0.0, 0.0), coord(f64::NAN, 1.0)]);
        assert!(matches!(result, Err(NavigatorError::NonFiniteInput(_))));
    }

    #[test]
    fn projector_for_switches_on_threshold() {
        let short = projector_for(campus_path(), 100).unwrap();
        let long = projector_for(campus_path(), 3).unwrap();
        let probe = coord(-73.5800, 45.4959);
        assert_eq!(short.nearest_index(probe), Some(4));
        assert_eq!(long.nearest_index(probe), Some(4));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn campus_coord() -> impl Strategy<Value = Coordinate> {
            (-73.60..-73.55, 45.45..45.50).prop_map(|(lon, lat)| Coordinate { lon, lat })
        }

        proptest! {
            #[test]
            fn prop_index_agrees_with_linear_scan(
                path in prop::collection::vec(campus_coord(), 1..200),
                probe in campus_coord()
            ) {
                let index = VertexIndex::new(path.clone()).unwrap();
                prop_assert_eq!(
                    index.nearest_index(probe),
                    geometry::nearest_index(&path, probe)
                );
            }
        }
    }
}
