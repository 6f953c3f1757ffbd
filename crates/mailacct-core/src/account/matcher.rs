//! Connection reuse decisions.

use super::model::{Account, Protocol};
use crate::config::CredentialConfig;

/// Returns true if both accounts reach the same endpoint as the same user.
///
/// Protocol, host (case-insensitive) and port (an absent port only equals
/// another absent port) must agree. When both sides carry an explicit user
/// those are compared directly; otherwise an absent user stands for the
/// protocol's configured user, or the local login name.
///
/// News servers are stricter: an absent user only equals another absent
/// user unless the fallback username is itself empty.
#[must_use]
pub fn matches(a1: &Account, a2: &Account, config: &CredentialConfig) -> bool {
    if a1.protocol() != a2.protocol() {
        return false;
    }
    if !a1.host().eq_ignore_ascii_case(a2.host()) {
        return false;
    }
    if a1.port() != a2.port() {
        return false;
    }

    let fallback = config.effective_user(a1.protocol());

    match (a1.user(), a2.user()) {
        (Some(u1), Some(u2)) => u1 == u2,
        (None, None) => true,
        (Some(_), None) | (None, Some(_))
            if a1.protocol() == Protocol::Nntp && !fallback.is_empty() =>
        {
            false
        }
        (Some(user), None) | (None, Some(user)) => user == fallback,
    }
}

impl Account {
    /// Returns true if a connection for `self` can be reused for `other`.
    ///
    /// See [`matches`].
    #[must_use]
    pub fn matches(&self, other: &Self, config: &CredentialConfig) -> bool {
        matches(self, other, config)
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
    use proptest::prelude::*;

    use super::*;

    fn config() -> CredentialConfig {
        CredentialConfig::new().with_system_user("local")
    }

    fn account(protocol: Protocol, host: &str, port: Option<u16>, user: Option<&str>) -> Account {
        let mut account = Account::new(protocol, host).unwrap();
        if let Some(port) = port {
            account.set_port(port);
        }
        if let Some(user) = user {
            account.set_user(user);
        }
        account
    }

    mod endpoint_tests {
        use super::*;

        #[test]
        fn protocol_must_match() {
            let a = account(Protocol::Imap, "h", None, None);
            let b = account(Protocol::Pop, "h", None, None);
            assert!(!matches(&a, &b, &config()));
        }

        #[test]
        fn host_is_case_insensitive() {
            let a = account(Protocol::Imap, "Mail.Example.COM", None, None);
            let b = account(Protocol::Imap, "mail.example.com", None, None);
            assert!(matches(&a, &b, &config()));
        }

        #[test]
        fn absent_port_differs_from_explicit_default() {
            let a = account(Protocol::Imap, "h", None, None);
            let b = account(Protocol::Imap, "h", Some(143), None);
            assert!(!matches(&a, &b, &config()));
            assert!(matches(&b, &b.clone(), &config()));
        }
    }

    mod user_tests {
        use super::*;

        #[test]
        fn both_explicit_compare_directly() {
            let mut cfg = config();
            cfg.imap.user = Some("alice".to_string());
            let a = account(Protocol::Imap, "h", None, Some("bob"));
            let b = account(Protocol::Imap, "h", None, Some("bob"));
            let c = account(Protocol::Imap, "h", None, Some("alice"));
            assert!(matches(&a, &b, &cfg));
            assert!(!matches(&a, &c, &cfg));
        }

        #[test]
        fn one_explicit_compares_with_configured_user() {
            let mut cfg = config();
            cfg.pop.user = Some("alice".to_string());
            let explicit = account(Protocol::Pop, "h", None, Some("alice"));
            let implicit = account(Protocol::Pop, "h", None, None);
            assert!(matches(&explicit, &implicit, &cfg));
            assert!(matches(&implicit, &explicit, &cfg));

            let other = account(Protocol::Pop, "h", None, Some("local"));
            assert!(!matches(&other, &implicit, &cfg));
        }

        #[test]
        fn one_explicit_falls_back_to_system_user() {
            let explicit = account(Protocol::Smtp, "h", None, Some("local"));
            let implicit = account(Protocol::Smtp, "h", None, None);
            assert!(matches(&explicit, &implicit, &config()));
        }

        #[test]
        fn neither_explicit_matches() {
            let a = account(Protocol::Imap, "h", Some(993), None);
            let b = account(Protocol::Imap, "h", Some(993), None);
            assert!(matches(&a, &b, &config()));
        }
    }

    mod news_tests {
        use super::*;

        #[test]
        fn absent_user_never_equals_default() {
            let explicit = account(Protocol::Nntp, "news", None, Some("local"));
            let implicit = account(Protocol::Nntp, "news", None, None);
            assert!(!matches(&explicit, &implicit, &config()));
            assert!(!matches(&implicit, &explicit, &config()));
        }

        #[test]
        fn absent_user_differs_from_explicit_empty_user() {
            let explicit_empty = account(Protocol::Nntp, "news", None, Some(""));
            let implicit = account(Protocol::Nntp, "news", None, None);
            assert!(!matches(&explicit_empty, &implicit, &config()));
            assert!(!matches(&implicit, &explicit_empty, &config()));
        }

        #[test]
        fn absent_equals_absent() {
            let a = account(Protocol::Nntp, "news", None, None);
            assert!(matches(&a, &a.clone(), &config()));
        }

        #[test]
        fn empty_fallback_compares_normally() {
            let cfg = CredentialConfig {
                system_user: None,
                ..CredentialConfig::new()
            };
            let explicit_empty = account(Protocol::Nntp, "news", None, Some(""));
            let implicit = account(Protocol::Nntp, "news", None, None);
            assert!(matches(&explicit_empty, &implicit, &cfg));
        }
    }

    fn arb_account() -> impl Strategy<Value = Account> {
        (
            prop::sample::select(Protocol::ALL.to_vec()),
            prop::sample::select(vec!["h", "H", "other"]),
            prop::option::of(prop::sample::select(vec![110_u16, 143, 993])),
            prop::option::of(prop::sample::select(vec!["", "local", "alice"])),
        )
            .prop_map(|(protocol, host, port, user)| account(protocol, host, port, user))
    }

    fn arb_config() -> impl Strategy<Value = CredentialConfig> {
        (
            prop::option::of(prop::sample::select(vec!["", "local"])),
            prop::option::of(prop::sample::select(vec!["", "alice"])),
        )
            .prop_map(|(system_user, user)| {
                let mut cfg = CredentialConfig {
                    system_user: system_user.map(str::to_string),
                    ..CredentialConfig::new()
                };
                for protocol in Protocol::ALL {
                    cfg.protocol_mut(protocol).user = user.map(str::to_string);
                }
                cfg
            })
    }

    proptest! {
        #[test]
        fn match_is_reflexive(a in arb_account(), cfg in arb_config()) {
            prop_assert!(matches(&a, &a, &cfg));
        }

        #[test]
        fn match_is_symmetric(a in arb_account(), b in arb_account(), cfg in arb_config()) {
            prop_assert_eq!(matches(&a, &b, &cfg), matches(&b, &a, &cfg));
        }
    }
}
