pub use shared::{
    ARRIVAL_INSTRUCTION, Coordinate, PLACEHOLDER_INSTRUCTION, PositionFix, ProgressKind,
    ProgressState, Route, Step,
};
