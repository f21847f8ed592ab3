// Library root: exposes internal modules for integration tests in `tests/`.
// Production entry point remains `src/main.rs`.

pub mod api;
pub mod benchmark;
pub mod db;
pub mod error;
pub mod fixture;
pub mod ingest;
pub mod metrics;
pub mod repository;
pub mod store;

// Startup plumbing used by the binary.
pub mod cli;
pub mod config;
pub mod logging;
