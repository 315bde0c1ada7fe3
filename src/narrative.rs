pub mod brief;
pub mod generator;

pub use brief::{NarrativeBrief, RiskLevel, SECTIONS};
pub use generator::{NarrativeError, NarrativeGenerator, FAILURE_PREFIX};
