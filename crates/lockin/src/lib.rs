pub mod cli;
pub mod config;
pub mod env;
pub mod level;
pub mod meter;
pub mod payload;
pub mod relay;
pub mod server;
pub mod submit;
pub mod telemetry;
