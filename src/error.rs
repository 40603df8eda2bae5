// src/error.rs

use std::error::Error as StdError;
use std::fmt;

use http::{HeaderMap, StatusCode};

/// A `Result` alias where the `Err` case is `http_ntlm::Error`.
pub type Result<T> = std::result::Result<T, Error>;

/// A boxed error, as produced by inner services and security providers.
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// The errors that may occur while authenticating a request.
///
/// Errors raised by the wrapped service or by the security provider are kept
/// as the [`source`](StdError::source) of this error, unchanged, so callers
/// can downcast them.
pub struct Error {
    inner: Box<Inner>,
}

struct Inner {
    kind: Kind,
    source: Option<BoxError>,
    status: Option<StatusCode>,
    challenge: Option<HeaderMap>,
}

impl Error {
    pub(crate) fn new<E>(kind: Kind, source: Option<E>) -> Error
    where
        E: Into<BoxError>,
    {
        Error {
            inner: Box::new(Inner {
                kind,
                source: source.map(Into::into),
                status: None,
                challenge: None,
            }),
        }
    }

    pub(crate) fn with_status(mut self, status: StatusCode) -> Error {
        self.inner.status = Some(status);
        self
    }

    pub(crate) fn with_challenge(mut self, headers: HeaderMap) -> Error {
        self.inner.challenge = Some(headers);
        self
    }

    /// Returns true if the wrapped service failed to send a request.
    pub fn is_send(&self) -> bool {
        matches!(self.inner.kind, Kind::Send)
    }

    /// Returns true if credentials or a security context could not be acquired.
    pub fn is_credentials(&self) -> bool {
        matches!(self.inner.kind, Kind::Credentials)
    }

    /// Returns true if the security context rejected the server challenge.
    pub fn is_context(&self) -> bool {
        matches!(self.inner.kind, Kind::Context)
    }

    /// Returns true if a challenge payload was not valid base64.
    pub fn is_decode(&self) -> bool {
        matches!(self.inner.kind, Kind::Decode)
    }

    /// Returns true if no challenge for the expected scheme was present.
    pub fn is_not_found(&self) -> bool {
        matches!(self.inner.kind, Kind::NotFound)
    }

    /// Returns true if the server stopped the handshake half way.
    pub fn is_negotiation_failed(&self) -> bool {
        matches!(self.inner.kind, Kind::NegotiationFailed)
    }

    /// Returns true if this build has no security provider.
    pub fn is_unsupported(&self) -> bool {
        matches!(self.inner.kind, Kind::Unsupported)
    }

    /// Returns true if the request body could not be buffered.
    pub fn is_body(&self) -> bool {
        matches!(self.inner.kind, Kind::Body)
    }

    /// Returns the status code of the response that ended the handshake, if any.
    pub fn status(&self) -> Option<StatusCode> {
        self.inner.status
    }

    /// Returns the headers of the response that ended the handshake.
    ///
    /// Set when the server answered the negotiate message without a usable
    /// challenge, so callers can inspect the `WWW-Authenticate` values it
    /// sent instead. The response body has already been drained.
    pub fn challenge_headers(&self) -> Option<&HeaderMap> {
        self.inner.challenge.as_ref()
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut builder = f.debug_struct("http_ntlm::Error");

        builder.field("kind", &self.inner.kind);

        if let Some(ref status) = self.inner.status {
            builder.field("status", status);
        }

        if let Some(ref challenge) = self.inner.challenge {
            builder.field("challenge", challenge);
        }

        if let Some(ref source) = self.inner.source {
            builder.field("source", source);
        }

        builder.finish()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.inner.kind {
            Kind::Send => f.write_str("error sending request")?,
            Kind::Credentials => f.write_str("failed to acquire security credentials")?,
            Kind::Context => f.write_str("security context rejected the server challenge")?,
            Kind::Decode => f.write_str("malformed base64 in authentication challenge")?,
            Kind::NotFound => f.write_str("no NTLM authentication challenge found")?,
            Kind::NegotiationFailed => f.write_str("NTLM negotiation failed")?,
            Kind::Unsupported => {
                f.write_str("NTLM authentication is not supported on this platform")?
            }
            Kind::Body => f.write_str("error buffering request body")?,
            Kind::Header => f.write_str("invalid authorization header")?,
        }

        if let Some(status) = self.inner.status {
            write!(f, " ({status})")?;
        }

        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.inner.source.as_ref().map(|e| &**e as _)
    }
}

#[derive(Debug)]
pub(crate) enum Kind {
    Send,
    Credentials,
    Context,
    Decode,
    NotFound,
    NegotiationFailed,
    Unsupported,
    Body,
    Header,
}

// constructors

pub(crate) fn send<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Send, Some(e))
}

pub(crate) fn credentials<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Credentials, Some(e))
}

pub(crate) fn context<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Context, Some(e))
}

pub(crate) fn decode<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Decode, Some(e))
}

pub(crate) fn not_found() -> Error {
    Error::new(Kind::NotFound, None::<Error>)
}

pub(crate) fn negotiation_failed(status: StatusCode) -> Error {
    Error::new(Kind::NegotiationFailed, None::<Error>).with_status(status)
}

pub(crate) fn unsupported() -> Error {
    Error::new(Kind::Unsupported, None::<Error>)
}

pub(crate) fn body<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Body, Some(e))
}

pub(crate) fn header<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Header, Some(e))
}
