//! Credential resolution.
//!
//! Missing credentials are filled in from, in order: what the account
//! already knows, the per-protocol settings, and finally the user. Each step
//! is gated on the account's flags, so resolving twice never prompts twice.
//! In non-interactive mode the prompt step fails instead of blocking.

mod bearer;
mod prompt;

pub use prompt::{NoPrompt, Prompter};

use tracing::{debug, warn};

use crate::account::{Account, AccountFlag};
use crate::config::CredentialConfig;
use crate::{Error, Result};

/// Fills in an account's user, login and password.
#[derive(Debug)]
pub struct Resolver<'a, P> {
    config: &'a CredentialConfig,
    prompter: P,
}

impl<'a, P: Prompter> Resolver<'a, P> {
    /// Creates a resolver reading `config` and asking through `prompter`.
    pub const fn new(config: &'a CredentialConfig, prompter: P) -> Self {
        Self { config, prompter }
    }

    /// Settings in use.
    #[must_use]
    pub const fn config(&self) -> &'a CredentialConfig {
        self.config
    }

    /// The prompter in use.
    pub const fn prompter(&self) -> &P {
        &self.prompter
    }

    /// Resolves the username.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInteractive`] if a prompt is needed but disabled,
    /// or [`Error::PromptFailed`] if the prompt is cancelled.
    pub fn user(&mut self, account: &mut Account) -> Result<()> {
        if account.has(AccountFlag::User) {
            return Ok(());
        }

        let protocol = account.protocol();
        if let Some(user) = self.config.user(protocol) {
            debug!("Using configured {protocol} user for {}", account.host());
            account.set_user(user);
            return Ok(());
        }

        self.ensure_interactive("username")?;
        let message = format!("Username at {}: ", account.host());
        let user = self
            .prompter
            .prompt_line(&message, self.config.system_user())
            .map_err(|e| {
                warn!("Username prompt failed: {e}");
                Error::PromptFailed("username")
            })?;
        account.set_user(&user);
        Ok(())
    }

    /// Resolves the login identity.
    ///
    /// IMAP may configure a login distinct from the username; everything
    /// else logs in as the user.
    ///
    /// # Errors
    ///
    /// Propagates failures from [`Resolver::user`].
    pub fn login(&mut self, account: &mut Account) -> Result<()> {
        if account.has(AccountFlag::Login) {
            return Ok(());
        }

        if let Some(login) = self.config.login(account.protocol()) {
            debug!("Using configured login for {}", account.host());
            account.set_login(login);
            return Ok(());
        }

        if let Err(e) = self.user(account) {
            debug!("Couldn't get user info: {e}");
            return Err(e);
        }
        let user = account.user().unwrap_or_default().to_string();
        account.set_login(&user);
        Ok(())
    }

    /// Resolves the password.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInteractive`] if a prompt is needed but disabled,
    /// or [`Error::PromptFailed`] if the prompt is cancelled or left empty.
    pub fn pass(&mut self, account: &mut Account) -> Result<()> {
        if account.has(AccountFlag::Pass) {
            return Ok(());
        }

        let protocol = account.protocol();
        if let Some(pass) = self.config.pass(protocol) {
            debug!("Using configured {protocol} password for {}", account.host());
            account.set_pass(pass);
            return Ok(());
        }

        self.ensure_interactive("password")?;
        let who = account
            .login()
            .or_else(|| account.user())
            .unwrap_or_default();
        let message = format!("Password for {who}@{}: ", account.host());
        let pass = self.prompter.prompt_password(&message).map_err(|e| {
            warn!("Password prompt failed: {e}");
            Error::PromptFailed("password")
        })?;
        if pass.is_empty() {
            return Err(Error::PromptFailed("password"));
        }
        account.set_pass(&pass);
        Ok(())
    }

    /// Resolves login and password, the pair needed for a plain login.
    ///
    /// # Errors
    ///
    /// Returns the first failure from [`Resolver::login`] or
    /// [`Resolver::pass`].
    pub fn credentials(&mut self, account: &mut Account) -> Result<()> {
        self.login(account)?;
        self.pass(account)
    }

    fn ensure_interactive(&self, what: &'static str) -> Result<()> {
        if self.config.interactive {
            Ok(())
        } else {
            debug!("Not prompting for {what}: non-interactive mode");
            Err(Error::NotInteractive(what))
        }
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
    use std::collections::VecDeque;
    use std::io;

    use super::*;
    use crate::account::Protocol;

    /// Scripted prompter that records every message it shows.
    #[derive(Default)]
    struct Scripted {
        answers: VecDeque<io::Result<String>>,
        shown: Vec<(String, Option<String>)>,
    }

    impl Scripted {
        fn answering(answers: impl IntoIterator<Item = &'static str>) -> Self {
            Self {
                answers: answers.into_iter().map(|a| Ok(a.to_string())).collect(),
                shown: Vec::new(),
            }
        }

        fn next(&mut self) -> io::Result<String> {
            self.answers
                .pop_front()
                .unwrap_or_else(|| Err(io::Error::from(io::ErrorKind::Interrupted)))
        }
    }

    impl Prompter for Scripted {
        fn prompt_line(&mut self, message: &str, default: &str) -> io::Result<String> {
            self.shown
                .push((message.to_string(), Some(default.to_string())));
            self.next()
        }

        fn prompt_password(&mut self, message: &str) -> io::Result<String> {
            self.shown.push((message.to_string(), None));
            self.next()
        }
    }

    fn config() -> CredentialConfig {
        CredentialConfig::new().with_system_user("local")
    }

    fn imap() -> Account {
        Account::new(Protocol::Imap, "imap.example.com").unwrap()
    }

    mod user_tests {
        use super::*;

        #[test]
        fn explicit_user_short_circuits() {
            let cfg = config();
            let mut resolver = Resolver::new(&cfg, Scripted::default());
            let mut account = imap();
            account.set_user("bob");
            resolver.user(&mut account).unwrap();
            assert_eq!(account.user(), Some("bob"));
            assert!(resolver.prompter().shown.is_empty());
        }

        #[test]
        fn configured_user_wins_over_prompt() {
            let mut cfg = config();
            cfg.imap.user = Some("alice".to_string());
            let mut resolver = Resolver::new(&cfg, Scripted::default());
            let mut account = imap();
            resolver.user(&mut account).unwrap();
            assert_eq!(account.user(), Some("alice"));
            assert!(resolver.prompter().shown.is_empty());
        }

        #[test]
        fn prompt_is_seeded_with_system_user() {
            let cfg = config();
            let mut resolver = Resolver::new(&cfg, Scripted::answering(["typed"]));
            let mut account = imap();
            resolver.user(&mut account).unwrap();
            assert_eq!(account.user(), Some("typed"));
            assert_eq!(
                resolver.prompter().shown,
                vec![(
                    "Username at imap.example.com: ".to_string(),
                    Some("local".to_string())
                )]
            );
        }

        #[test]
        fn non_interactive_fails_without_prompting() {
            let cfg = config().with_interactive(false);
            let mut resolver = Resolver::new(&cfg, Scripted::answering(["x"]));
            let mut account = imap();
            assert!(matches!(
                resolver.user(&mut account),
                Err(Error::NotInteractive("username"))
            ));
            assert!(resolver.prompter().shown.is_empty());
            assert!(!account.has(AccountFlag::User));
        }

        #[test]
        fn cancelled_prompt_leaves_user_unset() {
            let cfg = config();
            let mut resolver = Resolver::new(&cfg, Scripted::default());
            let mut account = imap();
            assert!(matches!(
                resolver.user(&mut account),
                Err(Error::PromptFailed("username"))
            ));
            assert!(!account.has(AccountFlag::User));
        }

        #[test]
        fn idempotent() {
            let cfg = config();
            let mut resolver = Resolver::new(&cfg, Scripted::answering(["typed", "again"]));
            let mut account = imap();
            resolver.user(&mut account).unwrap();
            resolver.user(&mut account).unwrap();
            assert_eq!(account.user(), Some("typed"));
            assert_eq!(resolver.prompter().shown.len(), 1);
        }
    }

    mod login_tests {
        use super::*;

        #[test]
        fn imap_uses_configured_login() {
            let mut cfg = config();
            cfg.imap.login = Some("alice@example.com".to_string());
            cfg.imap.user = Some("alice".to_string());
            let mut resolver = Resolver::new(&cfg, Scripted::default());
            let mut account = imap();
            resolver.login(&mut account).unwrap();
            assert_eq!(account.login(), Some("alice@example.com"));
            // The user is not needed when a login is configured.
            assert!(!account.has(AccountFlag::User));
        }

        #[test]
        fn other_protocols_ignore_configured_login() {
            let mut cfg = config();
            cfg.smtp.login = Some("ignored".to_string());
            cfg.smtp.user = Some("sender".to_string());
            let mut resolver = Resolver::new(&cfg, Scripted::default());
            let mut account = Account::new(Protocol::Smtp, "smtp.example.com").unwrap();
            resolver.login(&mut account).unwrap();
            assert_eq!(account.login(), Some("sender"));
            assert_eq!(account.user(), Some("sender"));
        }

        #[test]
        fn falls_back_to_user() {
            let cfg = config();
            let mut resolver = Resolver::new(&cfg, Scripted::answering(["typed"]));
            let mut account = imap();
            resolver.login(&mut account).unwrap();
            assert_eq!(account.login(), Some("typed"));
        }

        #[test]
        fn user_failure_propagates() {
            let cfg = config().with_interactive(false);
            let mut resolver = Resolver::new(&cfg, NoPrompt);
            let mut account = imap();
            assert!(matches!(
                resolver.login(&mut account),
                Err(Error::NotInteractive("username"))
            ));
            assert!(!account.has(AccountFlag::Login));
        }

        #[test]
        fn idempotent() {
            let mut cfg = config();
            cfg.imap.login = Some("first".to_string());
            let mut resolver = Resolver::new(&cfg, NoPrompt);
            let mut account = imap();
            resolver.login(&mut account).unwrap();
            account.set_user("changed-meanwhile");
            resolver.login(&mut account).unwrap();
            assert_eq!(account.login(), Some("first"));
        }
    }

    mod pass_tests {
        use super::*;

        #[test]
        fn configured_password_per_protocol() {
            let mut cfg = config().with_interactive(false);
            cfg.pop.pass = Some("pop-pw".to_string());
            let mut resolver = Resolver::new(&cfg, NoPrompt);

            let mut pop = Account::new(Protocol::Pop, "pop.example.com").unwrap();
            resolver.pass(&mut pop).unwrap();
            assert_eq!(pop.pass(), Some("pop-pw"));

            let mut nntp = Account::new(Protocol::Nntp, "news.example.com").unwrap();
            assert!(matches!(
                resolver.pass(&mut nntp),
                Err(Error::NotInteractive("password"))
            ));
        }

        #[test]
        fn prompt_names_login_and_host() {
            let cfg = config();
            let mut resolver = Resolver::new(&cfg, Scripted::answering(["pw"]));
            let mut account = imap();
            account.set_user("user");
            account.set_login("login");
            resolver.pass(&mut account).unwrap();
            assert_eq!(account.pass(), Some("pw"));
            assert_eq!(
                resolver.prompter().shown,
                vec![("Password for login@imap.example.com: ".to_string(), None)]
            );
        }

        #[test]
        fn prompt_names_user_without_login() {
            let cfg = config();
            let mut resolver = Resolver::new(&cfg, Scripted::answering(["pw"]));
            let mut account = imap();
            account.set_user("user");
            resolver.pass(&mut account).unwrap();
            assert_eq!(
                resolver.prompter().shown[0].0,
                "Password for user@imap.example.com: "
            );
        }

        #[test]
        fn empty_password_is_failure() {
            let cfg = config();
            let mut resolver = Resolver::new(&cfg, Scripted::answering([""]));
            let mut account = imap();
            assert!(matches!(
                resolver.pass(&mut account),
                Err(Error::PromptFailed("password"))
            ));
            assert!(!account.has(AccountFlag::Pass));
        }

        #[test]
        fn failure_keeps_other_fields() {
            let cfg = config().with_interactive(false);
            let mut resolver = Resolver::new(&cfg, NoPrompt);
            let mut account = imap();
            account.set_user("bob");
            account.set_login("bob");
            assert!(resolver.pass(&mut account).is_err());
            assert_eq!(account.user(), Some("bob"));
            assert_eq!(account.login(), Some("bob"));
        }

        #[test]
        fn idempotent() {
            let cfg = config();
            let mut resolver = Resolver::new(&cfg, Scripted::answering(["pw", "other"]));
            let mut account = imap();
            resolver.pass(&mut account).unwrap();
            resolver.pass(&mut account).unwrap();
            assert_eq!(account.pass(), Some("pw"));
            assert_eq!(resolver.prompter().shown.len(), 1);
        }

        #[test]
        fn unset_pass_forces_reprompt() {
            let cfg = config();
            let mut resolver = Resolver::new(&cfg, Scripted::answering(["stale", "fresh"]));
            let mut account = imap();
            resolver.pass(&mut account).unwrap();
            account.unset_pass();
            resolver.pass(&mut account).unwrap();
            assert_eq!(account.pass(), Some("fresh"));
            assert_eq!(resolver.prompter().shown.len(), 2);
        }
    }

    #[test]
    fn credentials_resolves_login_then_pass() {
        let mut cfg = config();
        cfg.imap.user = Some("alice".to_string());
        let mut resolver = Resolver::new(&cfg, Scripted::answering(["pw"]));
        let mut account = imap();
        resolver.credentials(&mut account).unwrap();
        assert_eq!(account.login(), Some("alice"));
        assert_eq!(account.pass(), Some("pw"));
        assert_eq!(
            resolver.prompter().shown[0].0,
            "Password for alice@imap.example.com: "
        );
    }
}
