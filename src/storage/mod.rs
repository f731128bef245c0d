//! Battery storage and multi-store apportionment.

pub mod apportion;
pub mod battery;

pub use apportion::Apportionment;
pub use battery::EnergyStore;
