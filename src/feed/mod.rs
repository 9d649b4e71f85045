//! Feed Client (C1) — fetches and coerces the upstream pilot/controller
//! snapshot and transceiver document (§4.1).

pub mod client;
pub mod types;

pub use client::{FeedClient, Snapshot};
