pub mod adjust;
pub mod balance;
pub mod clock;
pub mod controller;
pub mod engine;
pub mod event;
pub mod kpi;
pub mod types;

pub use controller::PowerGrid;
pub use event::GridEvent;
pub use types::{CascadeStep, TickReport};
