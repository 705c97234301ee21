//! Type definitions for ridecompare

mod error;
mod location;
mod ride;

pub use error::*;
pub use location::*;
pub use ride::*; // includes Provider, RideOption, sort/filter controls
