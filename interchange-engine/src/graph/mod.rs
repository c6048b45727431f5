//! Schedule graph and its builder.

mod builder;
mod schedule_graph;

pub use builder::{BuildError, BuildReport, GraphBuilder};
pub use schedule_graph::{PartialGraph, ScheduleGraph};
