//! SASL authentication mechanisms.
//!
//! Implements OAUTHBEARER (RFC 7628), the standard `OAuth2` SASL mechanism.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Separator between OAUTHBEARER key/value pairs (`^A`).
const KV_SEP: char = '\x01';

/// Inputs for an OAUTHBEARER initial response.
#[derive(Clone, Copy)]
pub struct BearerParams<'a> {
    /// Authorization identity sent in the GS2 header (`a=`).
    pub login: &'a str,
    /// Server hostname.
    pub host: &'a str,
    /// Server port. Zero when the caller never resolved one.
    pub port: u16,
    /// Bearer token.
    pub token: &'a str,
}

impl std::fmt::Debug for BearerParams<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerParams")
            .field("login", &self.login)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Assembles the unencoded OAUTHBEARER message.
///
/// Format: `n,a=<login>,^Ahost=<host>^Aport=<port>^Aauth=Bearer <token>^A^A`
fn oauthbearer_message(params: &BearerParams<'_>) -> String {
    let BearerParams {
        login,
        host,
        port,
        token,
    } = *params;
    format!("n,a={login},{KV_SEP}host={host}{KV_SEP}port={port}{KV_SEP}auth=Bearer {token}{KV_SEP}{KV_SEP}")
}

/// Generates OAUTHBEARER initial response (RFC 7628), base64 encoded.
///
/// The intermediate message is dropped as soon as it has been encoded.
///
/// # Example
///
/// ```
/// use mailacct_oauth::sasl::{BearerParams, oauthbearer_response};
///
/// let response = oauthbearer_response(&BearerParams {
///     login: "user@example.com",
///     host: "imap.example.com",
///     port: 993,
///     token: "ya29.a0...",
/// });
/// // Can be used with IMAP AUTHENTICATE OAUTHBEARER or SMTP AUTH OAUTHBEARER
/// assert!(!response.ends_with('\n'));
/// ```
#[must_use]
pub fn oauthbearer_response(params: &BearerParams<'_>) -> String {
    let message = oauthbearer_message(params);
    STANDARD.encode(message.as_bytes())
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    fn params<'a>(login: &'a str, host: &'a str, port: u16, token: &'a str) -> BearerParams<'a> {
        BearerParams {
            login,
            host,
            port,
            token,
        }
    }

    fn decode(response: &str) -> String {
        String::from_utf8(STANDARD.decode(response).unwrap()).unwrap()
    }

    #[test]
    fn test_oauthbearer_format() {
        let response = oauthbearer_response(&params("bob", "mail.example.com", 993, "tok123"));

        // Check exact format per RFC 7628
        assert_eq!(
            decode(&response),
            "n,a=bob,\x01host=mail.example.com\x01port=993\x01auth=Bearer tok123\x01\x01"
        );
    }

    #[test]
    fn test_oauthbearer_encoding_is_standard_padded() {
        let response = oauthbearer_response(&params("bob", "mail.example.com", 993, "tok123"));
        let expected = STANDARD.encode(
            b"n,a=bob,\x01host=mail.example.com\x01port=993\x01auth=Bearer tok123\x01\x01",
        );
        assert_eq!(response, expected);
        assert_eq!(response.len() % 4, 0);
        assert!(!response.ends_with('\n'));
    }

    #[test]
    fn test_oauthbearer_unset_port_renders_zero() {
        let response = oauthbearer_response(&params("bob", "h", 0, "t"));
        assert!(decode(&response).contains("\x01port=0\x01"));
    }

    #[test]
    fn test_responses_are_base64() {
        let response = oauthbearer_response(&params("user@example.com", "h", 1, "token"));
        // Should not contain raw text, only base64 characters
        assert!(!response.contains("user@example.com"));
        assert!(!response.contains("token"));
        assert!(STANDARD.decode(&response).is_ok());
    }

    #[test]
    fn test_debug_hides_token() {
        let p = params("bob", "h", 1, "secret-token");
        let rendered = format!("{p:?}");
        assert!(rendered.contains("bob"));
        assert!(!rendered.contains("secret-token"));
    }
}
