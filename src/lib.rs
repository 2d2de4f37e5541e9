//! Client-side core for a recycling collection marketplace.
//!
//! The marketplace connects clients (waste generators) with partners
//! (collectors); every business decision lives on the server behind a REST
//! API. This crate is the client's data layer:
//!
//! - [`api`]: typed HTTP access to the API, with wire records parsed into
//!   domain types at the boundary
//! - [`cache`]: session-scoped lookup caches so redisplaying a record does
//!   not refetch it
//! - [`session`]: the injection root owning the client, the caches, and the
//!   refresh bus, built at login and cleared at logout
//! - [`events`]: broadcast refresh signaling between consumers
//! - [`ordering`]: display ordering for request lists
//!
//! Screens and navigation belong to the embedding application, not here.

pub mod api;
pub mod cache;
pub mod config;
pub mod events;
pub mod logging;
pub mod ordering;
pub mod session;

pub use config::Config;
pub use session::Session;
