pub mod cache;
pub mod google;
pub mod provider;
pub mod straight_line;

pub use cache::CachedDirections;
pub use google::GoogleDirections;
pub use provider::{canonical_key, DirectionsProvider, Leg, ProviderError, RouteLegs};
pub use straight_line::StraightLineDirections;
