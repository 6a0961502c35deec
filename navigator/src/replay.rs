use std::{
    fs::File,
    io::{BufRead, BufReader, Read},
    path::Path,
    sync::Arc,
};

use crate::{
    error::NavigatorError,
    location::sequenced,
    models::{Coordinate, PositionFix, ProgressState, Route},
    progress::Resolver,
    reactor::ReactorState,
};

/// Reads every track point of a GPX file, in track/segment order.
pub fn load_fixes_gpx(reader: impl Read) -> Result<Vec<PositionFix>, NavigatorError> {
    let gpx = gpx::read(reader)?;
    let positions = gpx
        .tracks
        .iter()
        .flat_map(|track| track.segments.iter())
        .flat_map(|segment| segment.points.iter())
        .map(|waypoint| Coordinate::from(waypoint.point()));
    Ok(sequenced(positions))
}

/// Reads one `[lon, lat]` pair per line; blank lines are skipped.
pub fn load_fixes_json(reader: impl Read) -> Result<Vec<PositionFix>, NavigatorError> {
    let mut positions = Vec::new();
    for line in BufReader::new(reader).lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        positions.push(serde_json::from_str::<Coordinate>(&line)?);
    }
    Ok(sequenced(positions))
}

/// Picks the parser from the file extension: `.gpx` or JSON lines otherwise.
pub fn load_fixes_file(path: impl AsRef<Path>) -> Result<Vec<PositionFix>, NavigatorError> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let is_gpx = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("gpx"));
    if is_gpx {
        load_fixes_gpx(file)
    } else {
        load_fixes_json(file)
    }
}

/// Feeds `fixes` through a fresh reactor session, one state per accepted fix.
pub fn replay_route(
    resolver: Resolver,
    route: Arc<Route>,
    fixes: impl IntoIterator<Item = PositionFix>,
) -> Vec<ProgressState> {
    let mut session = ReactorState::new(resolver);
    session.set_route(Some(route));
    let states: Vec<ProgressState> = fixes
        .into_iter()
        .filter_map(|fix| session.apply_fix(fix).cloned())
        .collect();
    tracing::info!("replayed {} fixes", states.len());
    states
}
