//! Sokoban rules engine: a level catalog, a deterministic push/win state
//! machine, and a progress tracker backed by a pluggable key-value store.
//!
//! The `pushbox` binary is a terminal host built on top of [`sim::session::Session`].

pub mod config;
pub mod domain;
pub mod error;
pub mod sim;
