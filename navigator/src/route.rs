use std::{fs::File, io::Read, path::Path};

use crate::{
    error::NavigatorError,
    models::{Coordinate, Route},
};

/// Concatenates the polylines of every step, in route order.
///
/// Shared boundary vertices are kept twice: cumulative distances are keyed by
/// traversal order, not by unique points.
pub fn flatten(route: &Route) -> Vec<Coordinate> {
    let len = route.steps.iter().map(|step| step.coordinates.len()).sum();
    let mut path = Vec::with_capacity(len);
    for step in &route.steps {
        path.extend_from_slice(&step.coordinates);
    }
    path
}

/// Sum of the step distances reported by the directions service, in meters.
pub fn total_step_distance(route: &Route) -> f64 {
    route.steps.iter().map(|step| step.distance).sum()
}

pub fn load_route(reader: impl Read) -> Result<Route, NavigatorError> {
    let route: Route = serde_json::from_reader(reader)?;
    tracing::debug!(
        "loaded route with {} steps, {} vertices",
        route.steps.len(),
        route.steps.iter().map(|s| s.coordinates.len()).sum::<usize>()
    );
    Ok(route)
}

pub fn load_route_file(path: impl AsRef<Path>) -> Result<Route, NavigatorError> {
    let file = File::open(path)?;
    load_route(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Step;

    fn two_step_route() -> Route {
        Route::new(vec![
            Step::new(
                "Walk north",
                100.0,
                vec![Coordinate::new(-73.6, 45.5), Coordinate::new(-73.59, 45.51)],
            ),
            Step::new(
                "Turn right",
                150.0,
                vec![Coordinate::new(-73.59, 45.51), Coordinate::new(-73.58, 45.52)],
            ),
        ])
    }

    #[test]
    fn flattens_step_coordinates_in_order() {
        let path = flatten(&two_step_route());
        assert_eq!(
            path,
            vec![
                Coordinate::new(-73.6, 45.5),
                Coordinate::new(-73.59, 45.51),
                Coordinate::new(-73.59, 45.51),
                Coordinate::new(-73.58, 45.52),
            ]
        );
    }

    #[test]
    fn flatten_of_empty_route_is_empty() {
        assert!(flatten(&Route::default()).is_empty());
    }

    #[test]
    fn total_distance_sums_steps() {
        assert_eq!(total_step_distance(&two_step_route()), 250.0);
    }

    #[test]
    fn load_route_reads_backend_json() {
        let json = r#"{"steps": [
            {"instruction": "Head east", "distance": 12.5, "coordinates": [[0.0, 0.0], [0.0001, 0.0]]}
        ]}"#;
        let route = load_route(json.as_bytes()).expect("route");
        assert_eq!(route.steps.len(), 1);
        assert_eq!(route.steps[0].instruction, "Head east");
    }

    #[test]
    fn load_route_rejects_malformed_json() {
        let err = load_route("{\"steps\": 3}".as_bytes()).unwrap_err();
        assert!(matches!(err, NavigatorError::Json(_)));
    }

    #[test]
    fn load_route_file_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_route_file(dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, NavigatorError::Io(_)));
    }
}
