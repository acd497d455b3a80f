// wallet_flow_service/src/lib.rs

//! HTTP service exposing the wallet_flow fulfillment operations.

pub mod config;
pub mod errors;
pub mod seed;
pub mod services;
pub mod state;
pub mod store;
pub mod web;

pub use crate::config::{AppConfig, LogFormat};
pub use crate::errors::AppError;
pub use crate::state::AppState;
