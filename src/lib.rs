//! mint_settlement Library
//!
//! Re-exports modules for integration testing and external use.

pub mod api;
pub mod domain;
pub mod handlers;
pub mod jobs;
pub mod queue;
pub mod settlement;
pub mod store;

pub mod config;
pub mod db;
pub mod error;

pub use config::Config;
pub use error::{ApiError, AppError, AppResult};
pub use domain::{MintAmount, MintRecord, MintStatus, Token, ValidationError};
