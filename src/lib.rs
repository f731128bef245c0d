//! Power and energy balancing for Mars settlements.
//!
//! Each settlement owns a [`grid::PowerGrid`] that, once per tick, sums
//! generation and demand across its buildings and runs a surplus or deficit
//! cascade over reactors, batteries, fuel generators and building power
//! modes. Life support is shed last and restored first.

pub mod building;
pub mod cli;
pub mod config;
pub mod environment;
pub mod grid;
pub mod inventory;
pub mod io;
pub mod scenario;
pub mod settlement;
pub mod sources;
pub mod storage;

#[cfg(feature = "api")]
pub mod api;
