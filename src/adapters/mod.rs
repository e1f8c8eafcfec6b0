// Adapters layer: concrete implementations for external systems.

pub mod cookie;
pub mod http;

pub use http::{OpenTableClient, RestaurantLookup};
