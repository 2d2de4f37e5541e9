//! Typed access to the marketplace server API.
//!
//! [`client::ApiClient`] performs the HTTP calls, [`api_types`] mirrors the
//! wire format, and [`types`] holds the parsed domain records everything
//! else consumes.

pub mod api_types;
pub mod client;
pub mod types;

pub use client::ApiClient;
