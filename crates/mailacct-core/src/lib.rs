//! # mailacct-core
//!
//! Credential handling for mail accounts.
//!
//! This crate provides:
//! - **Account model** - host, port, protocol and credentials with
//!   per-field "resolved" flags
//! - **URL conversion** - `imaps://user@host:993` to account and back
//! - **Connection matching** - whether two accounts can share a connection
//! - **Credential resolution** - fill in user, login and password from
//!   settings or by asking the user
//! - **OAUTHBEARER** - build SASL tokens from an external refresh command
//!
//! ## Example
//!
//! ```ignore
//! use mailacct_core::{Account, CredentialConfig, Resolver};
//! use mailacct_oauth::ShellRunner;
//!
//! let config = CredentialConfig::load_default()?;
//! let mut account = Account::parse("imaps://imap.example.com")?;
//! let mut resolver = Resolver::new(&config, my_prompter);
//!
//! if config.refresh_command(account.protocol()).is_some() {
//!     let token = resolver.oauth_bearer(&mut account, &mut ShellRunner)?;
//!     // AUTHENTICATE OAUTHBEARER {token}
//! } else {
//!     resolver.credentials(&mut account)?;
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod account;
pub mod config;
mod error;
pub mod resolver;

pub use account::{Account, AccountFlag, AccountFlags, AccountUrl, Protocol};
pub use config::{CredentialConfig, ProtocolConfig};
pub use error::{Error, Result};
pub use resolver::{NoPrompt, Prompter, Resolver};
