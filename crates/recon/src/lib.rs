//! `combmap-recon`: conflict adjudication for the combined habitat map.
//!
//! Pure engine crate: receives pre-loaded attribute, confidence and
//! intersection rows, returns adjudicated comparisons plus the projections
//! an erase step needs. No CLI or file IO.

pub mod aggregate;
pub mod audit;
pub mod classify;
pub mod confidence;
pub mod config;
pub mod decision;
pub mod engine;
pub mod error;
pub mod eunis;
pub mod evidence;
pub mod model;
pub mod pairing;
pub mod projection;

pub use classify::classify;
pub use config::RunConfig;
pub use decision::{adjudicate, decide};
pub use engine::run;
pub use error::ReconError;
pub use model::{ComparisonRecord, Decision, MapUnit, RunInput, RunResult, Zone};
pub use projection::Projection;
