//! Remote photo API module
//!
//! This module handles all network access: list pages, single photo
//! records and raw image bytes.

pub mod client;

pub use client::ApiClient;
