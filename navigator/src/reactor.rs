use std::sync::Arc;

use tokio::sync::watch;

use crate::{
    error::NavigatorError,
    location::PositionSource,
    models::{Coordinate, PositionFix, ProgressState, Route},
    progress::{PreparedRoute, Resolver},
};

enum ActiveRoute {
    None,
    Ready(PreparedRoute),
    /// The route was refused (non-finite values).
    Invalid,
}

/// Latest route and latest usable position, and the instruction derived from them.
///
/// Every change to either input triggers a full resolution. Nothing derived
/// from earlier fixes is carried over, only the last accepted sequence number
/// used to drop fixes that arrive out of order. A refused fix leaves the
/// instruction for the current route untouched; a route that cannot be resolved
/// falls back to the placeholder, never to the previous route's instruction.
pub struct ReactorState {
    resolver: Resolver,
    route: ActiveRoute,
    last_sequence: Option<u64>,
    position: Option<Coordinate>,
    current: ProgressState,
}

impl ReactorState {
    pub fn new(resolver: Resolver) -> Self {
        let current = resolver.placeholder();
        Self {
            resolver,
            route: ActiveRoute::None,
            last_sequence: None,
            position: None,
            current,
        }
    }

    pub fn current(&self) -> &ProgressState {
        &self.current
    }

    pub fn last_sequence(&self) -> Option<u64> {
        self.last_sequence
    }

    /// Replaces the route wholesale (or clears it with `None`) and recomputes.
    pub fn set_route(&mut self, route: Option<Arc<Route>>) -> &ProgressState {
        self.route = match route {
            None => {
                tracing::info!("route cleared");
                ActiveRoute::None
            }
            Some(route) => match self.resolver.prepare(route) {
                Ok(prepared) => ActiveRoute::Ready(prepared),
                Err(err) => {
                    tracing::warn!("rejecting route: {err}");
                    ActiveRoute::Invalid
                }
            },
        };
        self.current = self.resolve().unwrap_or_else(|err| {
            tracing::warn!("no instruction for the new route: {err}");
            self.resolver.placeholder()
        });
        &self.current
    }

    /// Applies a fix and recomputes; `None` if the fix is not newer than the last one.
    pub fn apply_fix(&mut self, fix: PositionFix) -> Option<&ProgressState> {
        if let Some(last) = self.last_sequence {
            if fix.sequence <= last {
                tracing::debug!("dropping stale fix #{} (already at #{last})", fix.sequence);
                return None;
            }
        }
        self.last_sequence = Some(fix.sequence);
        if !fix.position.is_finite() {
            tracing::warn!(
                "ignoring non-finite fix #{}, keeping {:?}",
                fix.sequence,
                self.current.instruction
            );
            return Some(&self.current);
        }
        self.position = Some(fix.position);
        match self.resolve() {
            Ok(state) => self.current = state,
            Err(err) => tracing::warn!(
                "keeping previous instruction {:?}: {err}",
                self.current.instruction
            ),
        }
        Some(&self.current)
    }

    fn resolve(&self) -> Result<ProgressState, NavigatorError> {
        match &self.route {
            ActiveRoute::None => Ok(self.resolver.placeholder()),
            ActiveRoute::Ready(prepared) => self.resolver.resolve_prepared(prepared, self.position),
            ActiveRoute::Invalid => Err(NavigatorError::NonFiniteInput("route geometry")),
        }
    }
}

/// Drives a [`ReactorState`] from an injected position source and a route channel,
/// publishing every new [`ProgressState`] on a watch channel.
pub struct InstructionReactor<P> {
    state: ReactorState,
    positions: P,
    routes: watch::Receiver<Option<Arc<Route>>>,
    output: watch::Sender<ProgressState>,
}

impl<P: PositionSource> InstructionReactor<P> {
    /// The returned receiver holds the placeholder until the first resolution.
    pub fn new(
        resolver: Resolver,
        positions: P,
        routes: watch::Receiver<Option<Arc<Route>>>,
    ) -> (Self, watch::Receiver<ProgressState>) {
        let state = ReactorState::new(resolver);
        let (output, progress) = watch::channel(state.current().clone());
        let reactor = Self {
            state,
            positions,
            routes,
            output,
        };
        (reactor, progress)
    }

    /// Runs until the position source ends or the route sender is dropped,
    /// returning the last published state.
    pub async fn run(mut self) -> ProgressState {
        let initial = self.routes.borrow_and_update().clone();
        if initial.is_some() {
            self.state.set_route(initial);
            self.publish();
        }

        loop {
            tokio::select! {
                fix = self.positions.next_fix() => match fix {
                    Some(fix) => {
                        if self.state.apply_fix(fix).is_some() {
                            self.publish();
                        }
                    }
                    None => {
                        tracing::info!("position stream ended");
                        break;
                    }
                },
                changed = self.routes.changed() => match changed {
                    Ok(()) => {
                        let route = self.routes.borrow_and_update().clone();
                        self.state.set_route(route);
                        self.publish();
                    }
                    Err(_) => {
                        tracing::info!("route source closed");
                        break;
                    }
                },
            }
        }

        self.state.current().clone()
    }

    fn publish(&self) {
        let next = self.state.current();
        self.output.send_if_modified(|shown| {
            if shown == next {
                false
            } else {
                *shown = next.clone();
                true
            }
        });
    }
}
