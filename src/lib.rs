//! Directory core for a gaming podcast site.
//!
//! Episode and game records live in a namespaced key-value store; this crate
//! turns that flat record set into the derived views the site serves: home
//! page aggregates, paginated listings, unified search, and per-host
//! recommendation extraction, memoized behind a time-bounded query cache.
//!
//! HTTP routing, page rendering, authentication, feed ingestion, and the
//! external game-metadata client are collaborators outside this crate; they
//! consume [`application::views::DirectoryService`] and the store trait in
//! [`application::store`].

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
