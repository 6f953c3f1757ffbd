//! Account management module.
//!
//! Provides the account model, URL conversions and connection matching.

mod matcher;
mod model;
mod uri;

pub use matcher::matches;
pub use model::{Account, AccountFlag, AccountFlags, MAX_FIELD_LEN, Protocol};
pub use uri::AccountUrl;
