//! Shared library surface for the windloop server and its tests.

pub mod api;
pub mod cache;
pub mod config;
pub mod state;
pub mod wind;
