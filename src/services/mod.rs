//! Services for fetching, normalizing and ranking ride prices

pub mod comparison;
pub mod links;
pub mod normalizer;
pub mod price_source;
pub mod ranking;
#[doc(hidden)]
pub mod test_support;
pub mod tracker;

pub use comparison::{Comparison, ComparisonService, FetchOutcome};
pub use links::{build_deep_link, RapidoData, RideLinks};
pub use normalizer::{normalize, normalize_strict};
pub use price_source::{HttpPriceSource, PriceSource};
pub use ranking::{rank, recommended};
pub use tracker::{RequestToken, RequestTracker};
