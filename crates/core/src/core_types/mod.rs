//! Core types and utilities

pub mod units;
pub mod window;

pub use units::*;
pub use window::DateWindow;
