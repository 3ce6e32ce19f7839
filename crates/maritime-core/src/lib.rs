pub mod config;
pub mod error;
pub mod fetcher;
pub mod invocation;
pub mod normalizer;
pub mod notifier;
pub mod persister;
pub mod pipeline;
pub mod snapshot;
pub mod vessel;

pub use pipeline::{RunReport, VesselOutcome, VesselSnapshotPipeline};
pub use snapshot::VesselSnapshot;
pub use vessel::{VesselLookup, VesselQuery, VesselRoster};
