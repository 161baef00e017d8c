//! Domain module
//!
//! Core mint types and the status state machine.

pub mod amount;
pub mod error;
pub mod record;
pub mod status;
pub mod token;

pub use amount::{AmountError, MintAmount};
pub use error::{ValidationError, MAX_PAGE_LIMIT};
pub use record::{MintRecord, StatusUpdate, MINT_ENTITY_TYPE};
pub use status::{MintStatus, UnknownStatus};
pub use token::{Token, UnsupportedToken};
