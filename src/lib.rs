pub mod chart;
pub mod config;
pub mod error;
pub mod loader;
pub mod model;
pub mod server;
pub mod stream;
pub mod timestamp;
