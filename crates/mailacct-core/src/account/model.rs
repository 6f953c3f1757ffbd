//! Account model types.

use crate::{Error, Result};

/// Maximum length, in bytes, of the `user`, `login` and `pass` fields.
pub const MAX_FIELD_LEN: usize = 128;

/// Mail protocol an account connects with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    /// IMAP message store.
    Imap,
    /// POP3 message store.
    Pop,
    /// SMTP submission.
    Smtp,
    /// NNTP news server.
    Nntp,
}

impl Protocol {
    /// All supported protocols.
    pub const ALL: [Self; 4] = [Self::Imap, Self::Pop, Self::Smtp, Self::Nntp];

    /// Get display name for the protocol.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Imap => "IMAP",
            Self::Pop => "POP",
            Self::Smtp => "SMTP",
            Self::Nntp => "NNTP",
        }
    }

    /// Returns the URL scheme for plain or secure connections.
    #[must_use]
    pub const fn scheme(self, ssl: bool) -> &'static str {
        match (self, ssl) {
            (Self::Imap, false) => "imap",
            (Self::Imap, true) => "imaps",
            (Self::Pop, false) => "pop",
            (Self::Pop, true) => "pops",
            (Self::Smtp, false) => "smtp",
            (Self::Smtp, true) => "smtps",
            (Self::Nntp, false) => "news",
            (Self::Nntp, true) => "snews",
        }
    }

    /// Maps a URL scheme to its protocol and whether it implies TLS.
    ///
    /// Matching is case-insensitive. `nntp`/`nntps` are accepted as aliases
    /// of `news`/`snews`.
    #[must_use]
    pub fn from_scheme(scheme: &str) -> Option<(Self, bool)> {
        match scheme.to_ascii_lowercase().as_str() {
            "imap" => Some((Self::Imap, false)),
            "imaps" => Some((Self::Imap, true)),
            "pop" => Some((Self::Pop, false)),
            "pops" => Some((Self::Pop, true)),
            "smtp" => Some((Self::Smtp, false)),
            "smtps" => Some((Self::Smtp, true)),
            "news" | "nntp" => Some((Self::Nntp, false)),
            "snews" | "nntps" => Some((Self::Nntp, true)),
            _ => None,
        }
    }

    /// Get default port for plain or secure connections.
    #[must_use]
    pub const fn default_port(self, ssl: bool) -> u16 {
        match (self, ssl) {
            (Self::Imap, false) => 143,
            (Self::Imap, true) => 993,
            (Self::Pop, false) => 110,
            (Self::Pop, true) => 995,
            (Self::Smtp, false) => 25,
            (Self::Smtp, true) => 465,
            (Self::Nntp, false) => 119,
            (Self::Nntp, true) => 563,
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Marks an account field as authoritatively known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountFlag {
    /// `user` is resolved.
    User,
    /// `login` is resolved.
    Login,
    /// `pass` is resolved.
    Pass,
    /// `port` was given explicitly.
    Port,
    /// Connection uses implicit TLS.
    Ssl,
}

/// Set of [`AccountFlag`]s.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct AccountFlags {
    user: bool,
    login: bool,
    pass: bool,
    port: bool,
    ssl: bool,
}

impl AccountFlags {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    const fn slot(&mut self, flag: AccountFlag) -> &mut bool {
        match flag {
            AccountFlag::User => &mut self.user,
            AccountFlag::Login => &mut self.login,
            AccountFlag::Pass => &mut self.pass,
            AccountFlag::Port => &mut self.port,
            AccountFlag::Ssl => &mut self.ssl,
        }
    }

    /// Adds a flag.
    pub const fn insert(&mut self, flag: AccountFlag) {
        *self.slot(flag) = true;
    }

    /// Removes a flag.
    pub const fn remove(&mut self, flag: AccountFlag) {
        *self.slot(flag) = false;
    }

    /// Returns true if the flag is present.
    #[must_use]
    pub const fn contains(&self, flag: AccountFlag) -> bool {
        match flag {
            AccountFlag::User => self.user,
            AccountFlag::Login => self.login,
            AccountFlag::Pass => self.pass,
            AccountFlag::Port => self.port,
            AccountFlag::Ssl => self.ssl,
        }
    }
}

/// Truncates `value` to [`MAX_FIELD_LEN`] bytes on a character boundary.
pub(crate) fn bounded(value: &str) -> String {
    if value.len() <= MAX_FIELD_LEN {
        return value.to_string();
    }
    let mut end = MAX_FIELD_LEN;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    value[..end].to_string()
}

/// Connection target and credentials for one mail service.
///
/// Credential fields are only readable through accessors that return `None`
/// while the matching flag is clear, so a stale password left behind by
/// [`Account::unset_pass`] is never handed out.
#[derive(Clone, PartialEq, Eq)]
pub struct Account {
    protocol: Protocol,
    host: String,
    port: u16,
    user: String,
    login: String,
    pass: String,
    flags: AccountFlags,
}

impl Account {
    /// Creates an account with only a protocol and host known.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingHost`] if `host` is empty.
    pub fn new(protocol: Protocol, host: impl Into<String>) -> Result<Self> {
        let host = host.into();
        if host.is_empty() {
            return Err(Error::MissingHost);
        }
        Ok(Self {
            protocol,
            host,
            port: 0,
            user: String::new(),
            login: String::new(),
            pass: String::new(),
            flags: AccountFlags::new(),
        })
    }

    /// Protocol of this account.
    #[must_use]
    pub const fn protocol(&self) -> Protocol {
        self.protocol
    }

    /// Server hostname.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Validity flags.
    #[must_use]
    pub const fn flags(&self) -> AccountFlags {
        self.flags
    }

    /// Returns true if the flag is set.
    #[must_use]
    pub const fn has(&self, flag: AccountFlag) -> bool {
        self.flags.contains(flag)
    }

    /// Explicit port, if one was given.
    #[must_use]
    pub const fn port(&self) -> Option<u16> {
        if self.flags.contains(AccountFlag::Port) {
            Some(self.port)
        } else {
            None
        }
    }

    /// Raw port number; zero when no port was given.
    #[must_use]
    pub const fn port_number(&self) -> u16 {
        self.port
    }

    /// Explicit port, or the protocol default for the TLS mode.
    #[must_use]
    pub const fn effective_port(&self) -> u16 {
        match self.port() {
            Some(port) => port,
            None => self
                .protocol
                .default_port(self.flags.contains(AccountFlag::Ssl)),
        }
    }

    /// Whether the connection uses implicit TLS.
    #[must_use]
    pub const fn is_ssl(&self) -> bool {
        self.flags.contains(AccountFlag::Ssl)
    }

    /// Resolved username.
    #[must_use]
    pub fn user(&self) -> Option<&str> {
        self.flags
            .contains(AccountFlag::User)
            .then_some(self.user.as_str())
    }

    /// Resolved login identity.
    #[must_use]
    pub fn login(&self) -> Option<&str> {
        self.flags
            .contains(AccountFlag::Login)
            .then_some(self.login.as_str())
    }

    /// Resolved password.
    #[must_use]
    pub fn pass(&self) -> Option<&str> {
        self.flags
            .contains(AccountFlag::Pass)
            .then_some(self.pass.as_str())
    }

    /// Sets an explicit port.
    pub const fn set_port(&mut self, port: u16) {
        self.port = port;
        self.flags.insert(AccountFlag::Port);
    }

    /// Enables or disables implicit TLS.
    pub const fn set_ssl(&mut self, ssl: bool) {
        if ssl {
            self.flags.insert(AccountFlag::Ssl);
        } else {
            self.flags.remove(AccountFlag::Ssl);
        }
    }

    /// Sets the username and marks it resolved.
    pub fn set_user(&mut self, user: &str) {
        self.user = bounded(user);
        self.flags.insert(AccountFlag::User);
    }

    /// Sets the login identity and marks it resolved.
    pub fn set_login(&mut self, login: &str) {
        self.login = bounded(login);
        self.flags.insert(AccountFlag::Login);
    }

    /// Sets the password and marks it resolved.
    pub fn set_pass(&mut self, pass: &str) {
        self.pass = bounded(pass);
        self.flags.insert(AccountFlag::Pass);
    }

    /// Forgets the password so the next resolution asks again.
    ///
    /// Call after the server rejects the credentials. The stored characters
    /// stay until overwritten but are no longer reachable through
    /// [`Account::pass`].
    pub const fn unset_pass(&mut self) {
        self.flags.remove(AccountFlag::Pass);
    }
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("protocol", &self.protocol)
            .field("host", &self.host)
            .field("port", &self.port())
            .field("user", &self.user())
            .field("login", &self.login())
            .field("pass", &self.pass().map(|_| "<redacted>"))
            .field("flags", &self.flags)
            .finish()
    }
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

    mod protocol_tests {
        use super::*;

        #[test]
        fn default_ports() {
            assert_eq!(Protocol::Imap.default_port(false), 143);
            assert_eq!(Protocol::Imap.default_port(true), 993);
            assert_eq!(Protocol::Pop.default_port(false), 110);
            assert_eq!(Protocol::Pop.default_port(true), 995);
            assert_eq!(Protocol::Smtp.default_port(false), 25);
            assert_eq!(Protocol::Smtp.default_port(true), 465);
            assert_eq!(Protocol::Nntp.default_port(false), 119);
            assert_eq!(Protocol::Nntp.default_port(true), 563);
        }

        #[test]
        fn schemes_are_distinct() {
            let mut schemes: Vec<_> = Protocol::ALL
                .iter()
                .flat_map(|p| [p.scheme(false), p.scheme(true)])
                .collect();
            schemes.sort_unstable();
            schemes.dedup();
            assert_eq!(schemes.len(), 8);
        }

        #[test]
        fn scheme_lookup_inverts_table() {
            for protocol in Protocol::ALL {
                for ssl in [false, true] {
                    assert_eq!(
                        Protocol::from_scheme(protocol.scheme(ssl)),
                        Some((protocol, ssl))
                    );
                }
            }
        }

        #[test]
        fn scheme_aliases() {
            assert_eq!(Protocol::from_scheme("NNTPS"), Some((Protocol::Nntp, true)));
            assert_eq!(Protocol::from_scheme("nntp"), Some((Protocol::Nntp, false)));
            assert_eq!(Protocol::from_scheme("http"), None);
        }
    }

    mod flags_tests {
        use super::*;

        #[test]
        fn insert_and_remove() {
            let mut flags = AccountFlags::new();
            assert!(!flags.contains(AccountFlag::Pass));
            flags.insert(AccountFlag::Pass);
            flags.insert(AccountFlag::Ssl);
            assert!(flags.contains(AccountFlag::Pass));
            assert!(flags.contains(AccountFlag::Ssl));
            flags.remove(AccountFlag::Pass);
            assert!(!flags.contains(AccountFlag::Pass));
            assert!(flags.contains(AccountFlag::Ssl));
        }
    }

    mod account_tests {
        use super::*;

        #[test]
        fn new_requires_host() {
            assert!(matches!(
                Account::new(Protocol::Imap, ""),
                Err(Error::MissingHost)
            ));
        }

        #[test]
        fn new_has_nothing_resolved() {
            let account = Account::new(Protocol::Smtp, "smtp.example.com").unwrap();
            assert_eq!(account.host(), "smtp.example.com");
            assert_eq!(account.flags(), AccountFlags::new());
            assert!(account.user().is_none());
            assert!(account.login().is_none());
            assert!(account.pass().is_none());
            assert!(account.port().is_none());
            assert_eq!(account.port_number(), 0);
        }

        #[test]
        fn effective_port_falls_back_to_default() {
            let mut account = Account::new(Protocol::Imap, "h").unwrap();
            assert_eq!(account.effective_port(), 143);
            account.set_ssl(true);
            assert_eq!(account.effective_port(), 993);
            account.set_port(1143);
            assert_eq!(account.effective_port(), 1143);
        }

        #[test]
        fn unset_pass_hides_stale_password() {
            let mut account = Account::new(Protocol::Pop, "h").unwrap();
            account.set_pass("secret");
            assert_eq!(account.pass(), Some("secret"));
            account.unset_pass();
            assert!(account.pass().is_none());
            assert!(!account.has(AccountFlag::Pass));
        }

        #[test]
        fn fields_are_bounded() {
            let mut account = Account::new(Protocol::Imap, "h").unwrap();
            account.set_user(&"x".repeat(300));
            assert_eq!(account.user().unwrap().len(), MAX_FIELD_LEN);

            // Multi-byte characters are never split.
            account.set_login(&"é".repeat(100));
            let login = account.login().unwrap();
            assert!(login.len() <= MAX_FIELD_LEN);
            assert!(login.chars().all(|c| c == 'é'));
        }

        #[test]
        fn host_is_never_truncated() {
            let host = format!("{}.example.com", "a".repeat(200));
            let account = Account::new(Protocol::Imap, host.clone()).unwrap();
            assert_eq!(account.host(), host);
        }

        #[test]
        fn debug_redacts_password() {
            let mut account = Account::new(Protocol::Imap, "h").unwrap();
            account.set_pass("hunter2");
            let rendered = format!("{account:?}");
            assert!(!rendered.contains("hunter2"));
            assert!(rendered.contains("<redacted>"));
        }
    }
}
