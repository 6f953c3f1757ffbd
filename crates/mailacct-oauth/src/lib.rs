//! # mailacct-oauth
//!
//! `OAuth2` building blocks for mail protocols (IMAP/POP/SMTP).
//!
//! ## Features
//!
//! - **Refresh commands**: run a user-configured shell command and take the
//!   first line of its output as the token
//! - **SASL framing**: OAUTHBEARER (RFC 7628) initial responses, including the
//!   `host` and `port` key/value pairs
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailacct_oauth::{CommandRunner, ShellRunner};
//! use mailacct_oauth::sasl::{oauthbearer_response, BearerParams};
//!
//! let token = ShellRunner.read_first_line("oauth2-helper --refresh")?;
//! let params = BearerParams {
//!     login: "user@example.com",
//!     host: "imap.example.com",
//!     port: 993,
//!     token: &token.unwrap_or_default(),
//! };
//! let response = oauthbearer_response(&params);
//! // Send: AUTHENTICATE OAUTHBEARER {response}
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod error;
pub mod refresh;
pub mod sasl;

pub use error::{Error, Result};
pub use refresh::{CommandRunner, ShellRunner};
pub use sasl::{BearerParams, oauthbearer_response};
