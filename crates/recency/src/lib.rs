//! # recency
//!
//! Ordered recency list used by the `recache` LRU cache.
//!
//! ## Architecture
//! - **Arena**: entries live in a `Vec` of slots, vacated slots are reused
//! - **Links**: each entry stores the slot indices of its neighbours
//! - **Handles**: `Copy` references (slot + generation + owning list) that go
//!   stale when their entry is removed
//!
//! The head of the list is the least recently used end, the tail the most
//! recently used end.

#![warn(missing_docs)]

mod error;
mod list;

pub use error::{Error, Result};
pub use list::{Handle, Iter, RecencyList};
