// src/auth/header.rs

//! Parsing of the `WWW-Authenticate` challenges a server answers with.

use std::fmt;

use base64::Engine as _;
use http::header::WWW_AUTHENTICATE;
use http::HeaderMap;

use crate::Result;

/// An HTTP authentication scheme this crate recognizes in a challenge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Scheme {
    /// `Basic`. Recognized so callers can tell it apart, never answered.
    Basic,
    /// `Negotiate` (SPNEGO), which can carry NTLM tokens.
    Negotiate,
    /// Raw `NTLM`.
    Ntlm,
}

impl Scheme {
    /// The scheme token as it appears on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Basic => "Basic",
            Scheme::Negotiate => "Negotiate",
            Scheme::Ntlm => "NTLM",
        }
    }

    fn bit(self) -> u8 {
        match self {
            Scheme::Basic => 0b001,
            Scheme::Negotiate => 0b010,
            Scheme::Ntlm => 0b100,
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The set of schemes offered by one response.
///
/// A server may offer several schemes at once, so this is a set rather than
/// a single [`Scheme`]. An empty set means no recognized scheme was offered.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Schemes(u8);

impl Schemes {
    /// Returns true if `scheme` is in the set.
    pub fn contains(self, scheme: Scheme) -> bool {
        self.0 & scheme.bit() != 0
    }

    /// Returns true if no recognized scheme was offered.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    fn insert(&mut self, scheme: Scheme) {
        self.0 |= scheme.bit();
    }
}

impl fmt::Debug for Schemes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set()
            .entries(
                [Scheme::Basic, Scheme::Negotiate, Scheme::Ntlm]
                    .into_iter()
                    .filter(|s| self.contains(*s)),
            )
            .finish()
    }
}

/// The `WWW-Authenticate` values of a single response.
///
/// Every value of the field is kept, in order. Classification and token
/// extraction look at all of them; when several values carry the same
/// scheme, the first one wins.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuthHeader {
    values: Vec<String>,
}

impl AuthHeader {
    /// Captures the challenges from a response's headers.
    ///
    /// Values that are not visible ASCII are skipped.
    pub fn from_headers(headers: &HeaderMap) -> AuthHeader {
        let values = headers
            .get_all(WWW_AUTHENTICATE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(str::to_owned)
            .collect();
        AuthHeader { values }
    }

    /// Builds a challenge set from raw header values.
    pub fn new<I, S>(values: I) -> AuthHeader
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        AuthHeader {
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// The raw header values.
    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn is_basic(&self) -> bool {
        self.offers(Scheme::Basic)
    }

    pub fn is_negotiate(&self) -> bool {
        self.offers(Scheme::Negotiate)
    }

    pub fn is_ntlm(&self) -> bool {
        self.offers(Scheme::Ntlm)
    }

    /// All schemes offered by this response.
    pub fn schemes(&self) -> Schemes {
        let mut set = Schemes::default();
        for scheme in [Scheme::Basic, Scheme::Negotiate, Scheme::Ntlm] {
            if self.offers(scheme) {
                set.insert(scheme);
            }
        }
        set
    }

    /// The scheme to answer with: `NTLM` when offered, else `Negotiate`.
    ///
    /// Returns `None` when neither is offered.
    pub fn reply_scheme(&self) -> Option<Scheme> {
        if self.is_ntlm() {
            Some(Scheme::Ntlm)
        } else if self.is_negotiate() {
            Some(Scheme::Negotiate)
        } else {
            None
        }
    }

    /// Decodes the payload of the first `NTLM` challenge.
    ///
    /// A bare `NTLM` value yields an empty token. Fails with a not-found
    /// error if no value starts with `NTLM`, and with a decode error if the
    /// payload is not valid base64.
    pub fn extract_token(&self) -> Result<Vec<u8>> {
        self.token(Scheme::Ntlm)
    }

    /// Decodes the payload of the first challenge for `scheme`.
    ///
    /// Same rules as [`extract_token`](AuthHeader::extract_token).
    pub fn token(&self, scheme: Scheme) -> Result<Vec<u8>> {
        let value = self
            .values
            .iter()
            .find(|v| v.starts_with(scheme.as_str()))
            .ok_or_else(crate::error::not_found)?;

        match value.split(' ').nth(1) {
            None => Ok(Vec::new()),
            Some(payload) => base64::engine::general_purpose::STANDARD
                .decode(payload)
                .map_err(crate::error::decode),
        }
    }

    fn offers(&self, scheme: Scheme) -> bool {
        self.values.iter().any(|v| v.starts_with(scheme.as_str()))
    }
}
