//! Team registration pipeline for the Hacksprint hackathon.

pub mod config;
pub mod error;
pub mod registration;
pub mod telemetry;
