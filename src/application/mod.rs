//! Application services: aggregation, search, caching, and the query surface.

pub mod cache;
pub mod error;
pub mod mentions;
pub mod pagination;
pub mod recommendations;
pub mod search;
pub mod store;
pub mod views;
