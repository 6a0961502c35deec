use std::sync::Arc;

use crate::{
    config::NavigatorConfig,
    error::NavigatorError,
    geometry::cumulative_distances,
    models::{Coordinate, ProgressState, Route},
    route::flatten,
    spatial::{PathProjector, projector_for},
};

/// Resolves the instruction for `position` on `route` with the default configuration.
///
/// Total: a missing route, an empty route or a missing fix yields the
/// placeholder, and so does input the resolver refuses (non-finite values).
pub fn resolve_progress(route: Option<&Route>, position: Option<Coordinate>) -> ProgressState {
    let resolver = Resolver::default();
    resolver.try_resolve(route, position).unwrap_or_else(|err| {
        tracing::warn!("cannot resolve progress: {err}");
        resolver.placeholder()
    })
}

/// Walks the steps accumulating their distances; the first step whose running
/// total reaches `travelled` is current. Past the last step the user has arrived.
pub fn step_at_distance(route: &Route, travelled: f64, arrival: &str) -> ProgressState {
    let mut accumulated = 0.0;
    for (step_index, step) in route.steps.iter().enumerate() {
        accumulated += step.distance;
        // `<=` so zero-length steps and exact boundaries resolve to the earlier step.
        if travelled <= accumulated {
            return ProgressState::navigating(
                step_index,
                step.instruction.clone(),
                accumulated - travelled,
            );
        }
    }
    ProgressState::arrived(arrival)
}

/// Flattened geometry of one route: a projector plus its cumulative distance table.
pub struct RouteGeometry {
    projector: Box<dyn PathProjector>,
    cumulative: Vec<f64>,
}

impl RouteGeometry {
    pub fn build(route: &Route, spatial_index_threshold: usize) -> Result<Self, NavigatorError> {
        validate_route(route)?;
        let path = flatten(route);
        let cumulative = cumulative_distances(&path);
        let projector = projector_for(path, spatial_index_threshold)?;
        Ok(Self {
            projector,
            cumulative,
        })
    }

    pub fn vertex_count(&self) -> usize {
        self.cumulative.len()
    }

    /// Distance along the route of the vertex nearest to `position`.
    ///
    /// A route without any geometry keeps the user at its start.
    pub fn travelled(&self, position: Coordinate) -> f64 {
        self.projector
            .nearest_index(position)
            .map_or(0.0, |idx| self.cumulative[idx])
    }
}

/// A route paired with its geometry, built once per route instance.
///
/// Holds nothing derived from user positions, so resolving against it is
/// still a pure function of (route, position).
pub struct PreparedRoute {
    route: Arc<Route>,
    geometry: RouteGeometry,
}

#[derive(Debug, Clone, Default)]
pub struct Resolver {
    config: NavigatorConfig,
}

impl Resolver {
    pub fn new(config: NavigatorConfig) -> Self {
        Self { config }
    }

    pub fn placeholder(&self) -> ProgressState {
        ProgressState::pending(self.config.placeholder_instruction.clone())
    }

    pub fn prepare(&self, route: Arc<Route>) -> Result<PreparedRoute, NavigatorError> {
        let geometry = RouteGeometry::build(&route, self.config.spatial_index_threshold)?;
        tracing::info!(
            "prepared route: {} steps, {} vertices, {:.1} m",
            route.steps.len(),
            geometry.vertex_count(),
            crate::route::total_step_distance(&route)
        );
        Ok(PreparedRoute { route, geometry })
    }

    pub fn try_resolve(
        &self,
        route: Option<&Route>,
        position: Option<Coordinate>,
    ) -> Result<ProgressState, NavigatorError> {
        let (Some(route), Some(position)) = (route, position) else {
            return Ok(self.placeholder());
        };
        if route.is_empty() {
            return Ok(self.placeholder());
        }
        validate_position(position)?;
        let geometry = RouteGeometry::build(route, self.config.spatial_index_threshold)?;
        Ok(self.progress_on(route, &geometry, position))
    }

    pub fn resolve_prepared(
        &self,
        prepared: &PreparedRoute,
        position: Option<Coordinate>,
    ) -> Result<ProgressState, NavigatorError> {
        let Some(position) = position else {
            return Ok(self.placeholder());
        };
        if prepared.route.is_empty() {
            return Ok(self.placeholder());
        }
        validate_position(position)?;
        Ok(self.progress_on(&prepared.route, &prepared.geometry, position))
    }

    fn progress_on(
        &self,
        route: &Route,
        geometry: &RouteGeometry,
        position: Coordinate,
    ) -> ProgressState {
        let travelled = geometry.travelled(position);
        let state = step_at_distance(route, travelled, &self.config.arrival_instruction);
        tracing::debug!(
            "fix {:?} projected to {:.1} m along route -> {:?} ({:.1} m left)",
            position,
            travelled,
            state.kind,
            state.distance
        );
        state
    }
}

fn validate_position(position: Coordinate) -> Result<(), NavigatorError> {
    if position.is_finite() {
        Ok(())
    } else {
        Err(NavigatorError::NonFiniteInput("user position"))
    }
}

fn validate_route(route: &Route) -> Result<(), NavigatorError> {
    for step in &route.steps {
        if !step.distance.is_finite() {
            return Err(NavigatorError::NonFiniteInput("step distance"));
        }
        if !step.coordinates.iter().all(Coordinate::is_finite) {
            return Err(NavigatorError::NonFiniteInput("route geometry"));
        }
    }
    Ok(())
}
