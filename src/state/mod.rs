//! State management module
//!
//! This module handles all session state, including:
//! - Shared data structures (data.rs)
//! - The in-memory image cache (cache.rs)
//! - Pagination and debounced search (pagination.rs)
//! - Debounce/cooldown timer handles (timer.rs)
//! - The session store owning all of the above (session.rs)

pub mod cache;
pub mod data;
pub mod pagination;
pub mod session;
pub mod timer;
