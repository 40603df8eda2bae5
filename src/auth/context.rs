// src/auth/context.rs

//! The security-context capability the handshake drives.
//!
//! The transport never computes NTLM messages itself. It asks a
//! [`SecurityProvider`] for credentials, opens a client context from them
//! and feeds the server challenge back in. Handles are released when they
//! are dropped.

use http::Uri;

use crate::error::BoxError;

/// Source of client credentials for one platform.
pub trait SecurityProvider {
    /// Credentials handle produced by this provider.
    type Credentials: ClientCredentials;

    /// Whether this provider can authenticate at all.
    ///
    /// When `false`, the transport fails every request before sending it.
    const AVAILABLE: bool = true;

    /// Acquires outbound credentials.
    ///
    /// May be called concurrently from several in-flight requests.
    fn acquire_credentials(&self) -> std::result::Result<Self::Credentials, BoxError>;
}

/// Acquired credentials, able to open client contexts.
pub trait ClientCredentials {
    /// Context type opened from these credentials.
    type Context: SecurityContext;

    /// Opens a client context and returns it together with the initial
    /// (negotiate) token.
    ///
    /// `target` is the service principal name of the server, when the
    /// request names a host. NTLM treats it as a hint only.
    fn new_client_context(
        &self,
        target: Option<&str>,
    ) -> std::result::Result<(Self::Context, Vec<u8>), BoxError>;
}

/// One in-progress handshake.
pub trait SecurityContext {
    /// Consumes the server challenge and returns the authenticate token.
    fn update(&mut self, challenge: &[u8]) -> std::result::Result<Vec<u8>, BoxError>;
}

/// The security package a provider opens contexts with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Package {
    /// Raw NTLM. Its tokens are accepted under both the `NTLM` and the
    /// `Negotiate` scheme.
    #[default]
    Ntlm,
    /// SPNEGO, which may pick Kerberos when the target has an SPN.
    Negotiate,
}

impl Package {
    pub fn as_str(&self) -> &'static str {
        match self {
            Package::Ntlm => "NTLM",
            Package::Negotiate => "Negotiate",
        }
    }
}

/// Which identity a provider authenticates as.
#[derive(Clone, Default)]
pub enum Credentials {
    /// The identity of the current process.
    #[default]
    CurrentUser,

    /// An explicit account.
    Explicit {
        username: String,
        password: String,
        domain: Option<String>,
    },
}

impl Credentials {
    /// Explicit credentials. `user` may be `DOMAIN\user`, in which case the
    /// domain is split off.
    pub fn explicit(user: impl Into<String>, password: impl Into<String>) -> Credentials {
        let user = user.into();
        let (domain, username) = match user.split_once('\\') {
            Some((domain, username)) => (Some(domain.to_owned()), username.to_owned()),
            None => (None, user),
        };
        Credentials::Explicit {
            username,
            password: password.into(),
            domain,
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::CurrentUser => f.write_str("CurrentUser"),
            Credentials::Explicit {
                username, domain, ..
            } => f
                .debug_struct("Explicit")
                .field("username", username)
                .field("domain", domain)
                .finish_non_exhaustive(),
        }
    }
}

/// Derives the service principal name, `HTTP/<host>`, for a request URI.
///
/// Origin-form URIs (`/path`) carry no host and yield `None`.
pub(crate) fn derive_spn(uri: &Uri) -> Option<String> {
    uri.host().map(|host| format!("HTTP/{}", host))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_spn() {
        let uri: Uri = "http://example.com/path".parse().unwrap();
        assert_eq!(derive_spn(&uri).as_deref(), Some("HTTP/example.com"));

        let uri: Uri = "https://server.corp.com:8080/api".parse().unwrap();
        assert_eq!(derive_spn(&uri).as_deref(), Some("HTTP/server.corp.com"));
    }

    #[test]
    fn test_derive_spn_without_host() {
        let uri: Uri = "/relative".parse().unwrap();
        assert_eq!(derive_spn(&uri), None);
    }

    #[test]
    fn test_explicit_splits_domain() {
        match Credentials::explicit("CORP\\alice", "secret") {
            Credentials::Explicit {
                username,
                password,
                domain,
            } => {
                assert_eq!(username, "alice");
                assert_eq!(password, "secret");
                assert_eq!(domain.as_deref(), Some("CORP"));
            }
            Credentials::CurrentUser => panic!("expected explicit credentials"),
        }
    }

    #[test]
    fn test_debug_hides_password() {
        let creds = Credentials::explicit("alice@corp.example", "hunter2");
        let debug = format!("{:?}", creds);
        assert!(debug.contains("alice@corp.example"));
        assert!(!debug.contains("hunter2"));
    }
}
