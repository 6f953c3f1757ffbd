//! OAUTHBEARER token construction.

use mailacct_oauth::{BearerParams, CommandRunner, oauthbearer_response};
use tracing::{debug, error};

use super::{Prompter, Resolver};
use crate::account::Account;
use crate::{Error, Result};

impl<P: Prompter> Resolver<'_, P> {
    /// Builds a base64 OAUTHBEARER initial response (RFC 7628) for `account`.
    ///
    /// Resolves the login, runs the protocol's refresh command through
    /// `runner` and frames its first output line as the bearer token. The
    /// port is taken as is, so callers should settle it first; an unset port
    /// is sent as `0`.
    ///
    /// # Errors
    ///
    /// - Login resolution failures propagate.
    /// - [`Error::NoRefreshCommand`] if none is configured; nothing is run.
    /// - [`Error::SpawnFailed`] if the command cannot be started.
    /// - [`Error::RefreshOutput`] if its output cannot be read or decoded.
    /// - [`Error::EmptyRefreshToken`] if its first line is empty or missing.
    pub fn oauth_bearer<R>(&mut self, account: &mut Account, runner: &mut R) -> Result<String>
    where
        R: CommandRunner + ?Sized,
    {
        self.login(account)?;

        let protocol = account.protocol();
        let Some(command) = self
            .config
            .refresh_command(protocol)
            .filter(|cmd| !cmd.trim().is_empty())
        else {
            error!("No OAUTH refresh command defined for {protocol}");
            return Err(Error::NoRefreshCommand(protocol.name()));
        };

        debug!("Running {protocol} OAUTH refresh command for {}", account.host());
        let token = match runner.read_first_line(command) {
            Ok(Some(token)) if !token.is_empty() => token,
            Ok(_) => {
                error!("{protocol} OAUTH refresh command returned empty string");
                return Err(Error::EmptyRefreshToken);
            }
            Err(e) => {
                error!("{protocol} OAUTH refresh command failed: {e}");
                return Err(e.into());
            }
        };

        Ok(oauthbearer_response(&BearerParams {
            login: account.login().unwrap_or_default(),
            host: account.host(),
            port: account.port_number(),
            token: &token,
        }))
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
    use std::io;

    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;

    use super::*;
    use crate::account::{AccountFlag, Protocol};
    use crate::config::CredentialConfig;
    use crate::resolver::NoPrompt;

    /// Runner returning a canned result and counting invocations.
    struct FakeRunner {
        output: fn() -> mailacct_oauth::Result<Option<String>>,
        commands: Vec<String>,
    }

    impl FakeRunner {
        fn new(output: fn() -> mailacct_oauth::Result<Option<String>>) -> Self {
            Self {
                output,
                commands: Vec::new(),
            }
        }
    }

    impl CommandRunner for FakeRunner {
        fn read_first_line(&mut self, command: &str) -> mailacct_oauth::Result<Option<String>> {
            self.commands.push(command.to_string());
            (self.output)()
        }
    }

    fn config() -> CredentialConfig {
        let mut cfg = CredentialConfig::new()
            .with_interactive(false)
            .with_system_user("local");
        cfg.imap.oauth_refresh_command = Some("fetch-token".to_string());
        cfg
    }

    fn account() -> Account {
        let mut account = Account::new(Protocol::Imap, "mail.example.com").unwrap();
        account.set_port(993);
        account.set_login("bob");
        account
    }

    fn decode(token: &str) -> String {
        String::from_utf8(STANDARD.decode(token).unwrap()).unwrap()
    }

    #[test]
    fn builds_exact_oauthbearer_string() {
        let cfg = config();
        let mut runner = FakeRunner::new(|| Ok(Some("tok123".to_string())));
        let token = Resolver::new(&cfg, NoPrompt)
            .oauth_bearer(&mut account(), &mut runner)
            .unwrap();

        let expected = "n,a=bob,\x01host=mail.example.com\x01port=993\x01auth=Bearer tok123\x01\x01";
        assert_eq!(decode(&token), expected);
        assert_eq!(token, STANDARD.encode(expected));
        assert_eq!(runner.commands, vec!["fetch-token".to_string()]);
    }

    #[test]
    fn resolves_login_first() {
        let mut cfg = config();
        cfg.imap.user = Some("carol".to_string());
        let mut runner = FakeRunner::new(|| Ok(Some("t".to_string())));
        let mut account = Account::new(Protocol::Imap, "h").unwrap();

        let token = Resolver::new(&cfg, NoPrompt)
            .oauth_bearer(&mut account, &mut runner)
            .unwrap();
        assert!(account.has(AccountFlag::Login));
        assert!(decode(&token).starts_with("n,a=carol,\x01host=h\x01port=0\x01"));
    }

    #[test]
    fn login_failure_skips_command() {
        let cfg = config();
        let mut runner = FakeRunner::new(|| Ok(Some("t".to_string())));
        let mut account = Account::new(Protocol::Imap, "h").unwrap();

        let err = Resolver::new(&cfg, NoPrompt)
            .oauth_bearer(&mut account, &mut runner)
            .unwrap_err();
        assert!(matches!(err, Error::NotInteractive("username")));
        assert!(runner.commands.is_empty());
    }

    #[test]
    fn missing_command_runs_nothing() {
        let cfg = config();
        let mut runner = FakeRunner::new(|| Ok(Some("t".to_string())));
        let mut account = Account::new(Protocol::Smtp, "smtp.example.com").unwrap();
        account.set_login("bob");

        let err = Resolver::new(&cfg, NoPrompt)
            .oauth_bearer(&mut account, &mut runner)
            .unwrap_err();
        assert!(matches!(err, Error::NoRefreshCommand("SMTP")));
        assert!(runner.commands.is_empty());
    }

    #[test]
    fn news_uses_its_own_command() {
        let mut cfg = config();
        cfg.nntp.oauth_refresh_command = Some("news-token".to_string());
        let mut runner = FakeRunner::new(|| Ok(Some("ntok".to_string())));
        let mut account = Account::new(Protocol::Nntp, "news.example.com").unwrap();
        account.set_port(563);
        account.set_login("reader");

        let token = Resolver::new(&cfg, NoPrompt)
            .oauth_bearer(&mut account, &mut runner)
            .unwrap();
        assert_eq!(runner.commands, vec!["news-token".to_string()]);
        assert_eq!(
            decode(&token),
            "n,a=reader,\x01host=news.example.com\x01port=563\x01auth=Bearer ntok\x01\x01"
        );
    }

    #[test]
    fn blank_line_is_empty_token() {
        let cfg = config();
        let mut runner = FakeRunner::new(|| Ok(Some(String::new())));
        let err = Resolver::new(&cfg, NoPrompt)
            .oauth_bearer(&mut account(), &mut runner)
            .unwrap_err();
        assert!(matches!(err, Error::EmptyRefreshToken));
    }

    #[test]
    fn no_output_is_empty_token() {
        let cfg = config();
        let mut runner = FakeRunner::new(|| Ok(None));
        let err = Resolver::new(&cfg, NoPrompt)
            .oauth_bearer(&mut account(), &mut runner)
            .unwrap_err();
        assert!(matches!(err, Error::EmptyRefreshToken));
    }

    #[test]
    fn spawn_failure_is_reported() {
        let cfg = config();
        let mut runner = FakeRunner::new(|| {
            Err(mailacct_oauth::Error::Spawn(io::Error::from(
                io::ErrorKind::NotFound,
            )))
        });
        let err = Resolver::new(&cfg, NoPrompt)
            .oauth_bearer(&mut account(), &mut runner)
            .unwrap_err();
        assert!(matches!(err, Error::SpawnFailed(_)));
    }

    #[test]
    fn unreadable_output_is_not_a_spawn_failure() {
        let cfg = config();
        let mut runner = FakeRunner::new(|| {
            let bad = String::from_utf8(vec![b't', 0xff]).unwrap_err();
            Err(mailacct_oauth::Error::Decode(bad))
        });
        let err = Resolver::new(&cfg, NoPrompt)
            .oauth_bearer(&mut account(), &mut runner)
            .unwrap_err();
        assert!(matches!(err, Error::RefreshOutput(_)));
        assert!(err.to_string().contains("not valid UTF-8"));
    }
}
