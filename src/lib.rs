// Library crate for integration tests.
// main.rs declares the same modules for the binary.

pub mod activity;
pub mod config;
pub mod datasets;
pub mod error;
pub mod routes;
pub mod server;
pub mod settings;
pub mod state;
pub mod workbench;
