use serde::{Deserialize, Serialize};

pub const PLACEHOLDER_INSTRUCTION: &str = "Fetching instruction...";
pub const ARRIVAL_INSTRUCTION: &str = "Arrived at your destination";

/// WGS-84 position in decimal degrees. Travels over the wire as `[lon, lat]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coordinate {
    pub lon: f64,
    pub lat: f64,
}

impl Coordinate {
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    pub fn is_finite(&self) -> bool {
        self.lon.is_finite() && self.lat.is_finite()
    }
}

impl From<[f64; 2]> for Coordinate {
    fn from([lon, lat]: [f64; 2]) -> Self {
        Self { lon, lat }
    }
}

impl From<Coordinate> for [f64; 2] {
    fn from(coord: Coordinate) -> Self {
        [coord.lon, coord.lat]
    }
}

impl From<Coordinate> for geo_types::Point<f64> {
    fn from(coord: Coordinate) -> Self {
        geo_types::Point::new(coord.lon, coord.lat)
    }
}

impl From<geo_types::Point<f64>> for Coordinate {
    fn from(point: geo_types::Point<f64>) -> Self {
        Self {
            lon: point.x(),
            lat: point.y(),
        }
    }
}

/// One maneuver of a route: what to do, how long it is, and the geometry it covers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub instruction: String,
    /// Meters. Authoritative length of the step, independent of `coordinates`.
    pub distance: f64,
    #[serde(default)]
    pub coordinates: Vec<Coordinate>,
    /// Seconds, as estimated by the directions service.
    #[serde(default)]
    pub duration: f64,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub maneuver: Option<i32>,
}

impl Step {
    pub fn new(instruction: impl Into<String>, distance: f64, coordinates: Vec<Coordinate>) -> Self {
        Self {
            instruction: instruction.into(),
            distance,
            coordinates,
            duration: 0.0,
            maneuver: None,
        }
    }
}

/// Directions payload as produced by the routing backend.
///
/// Only `steps` matters for progress tracking; the summary fields are carried
/// through so the same value can feed the rest of the client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Route {
    #[serde(default)]
    pub steps: Vec<Step>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    #[serde(
        default,
        rename = "startingCoordinates",
        skip_serializing_if = "Option::is_none"
    )]
    pub starting_coordinates: Option<Coordinate>,
    #[serde(
        default,
        rename = "destinationCoordinates",
        skip_serializing_if = "Option::is_none"
    )]
    pub destination_coordinates: Option<Coordinate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_distance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bbox: Vec<f64>,
}

impl Route {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps,
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// A location update as delivered by the device provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionFix {
    pub position: Coordinate,
    /// Monotonic delivery order assigned by the location feed.
    pub sequence: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressKind {
    /// No route or no fix yet.
    Pending,
    Navigating { step_index: usize },
    Arrived,
}

/// What the UI should show right now.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressState {
    pub instruction: String,
    /// Meters left in the current step.
    pub distance: f64,
    pub kind: ProgressKind,
}

impl ProgressState {
    pub fn pending(instruction: impl Into<String>) -> Self {
        Self {
            instruction: instruction.into(),
            distance: 0.0,
            kind: ProgressKind::Pending,
        }
    }

    pub fn arrived(instruction: impl Into<String>) -> Self {
        Self {
            instruction: instruction.into(),
            distance: 0.0,
            kind: ProgressKind::Arrived,
        }
    }

    pub fn navigating(step_index: usize, instruction: impl Into<String>, distance: f64) -> Self {
        Self {
            instruction: instruction.into(),
            distance,
            kind: ProgressKind::Navigating { step_index },
        }
    }

    pub fn is_pending(&self) -> bool {
        self.kind == ProgressKind::Pending
    }
}

impl Default for ProgressState {
    fn default() -> Self {
        Self::pending(PLACEHOLDER_INSTRUCTION)
    }
}
