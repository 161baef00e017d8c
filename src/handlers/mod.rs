//! Handlers module
//!
//! Services that orchestrate the mint pipeline. Each handler holds its
//! injected store, queue and settlement clients and nothing else.

mod commands;
mod create_handler;
mod list_handler;
mod process_handler;


pub use commands::*;
pub use create_handler::CreateMintHandler;
pub use list_handler::ListMintsHandler;
pub use process_handler::{ProcessError, ProcessMintHandler, ProcessOutcome};
