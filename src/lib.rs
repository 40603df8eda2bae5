// src/lib.rs

#![deny(missing_debug_implementations)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! # http-ntlm
//!
//! Transparent NTLM authentication for HTTP clients built on [`tower`].
//!
//! Wrap any request sender with [`NtlmLayer`] and send ordinary requests.
//! When a server answers `401` with an `NTLM` or `Negotiate` challenge, the
//! middleware performs the negotiate, challenge and authenticate exchange
//! and replays the original request with the resulting credentials.
//!
//! ```ignore
//! use http_ntlm::NtlmLayer;
//! use hyper_util::client::legacy::Client;
//! use hyper_util::rt::TokioExecutor;
//! use tower::{ServiceBuilder, ServiceExt};
//!
//! let client = Client::builder(TokioExecutor::new()).build_http();
//! let svc = ServiceBuilder::new().layer(NtlmLayer::new()).service(client);
//!
//! let req = http::Request::get("http://intranet.corp/report")
//!     .body(http_body_util::Empty::<bytes::Bytes>::new())?;
//! let res = svc.oneshot(req).await?;
//! ```
//!
//! ## Platforms
//!
//! The security context comes from a [`SecurityProvider`]. On Windows with
//! the default `sspi` feature, [`DefaultProvider`] uses SSPI and the
//! identity of the current user. Everywhere else it is
//! [`UnsupportedProvider`], and every request fails with an error for which
//! [`Error::is_unsupported`] is true. Other providers can be plugged in
//! with [`NtlmLayer::with_provider`].
//!
//! ## Errors
//!
//! Failures of the wrapped service are returned as [`Error`]s for which
//! [`Error::is_send`] is true, with the original error as their source.

pub use self::auth::{
    AuthHeader, ClientCredentials, Credentials, DefaultProvider, Ntlm, NtlmLayer, Package, Scheme,
    Schemes, SecurityContext, SecurityProvider, Unavailable, UnsupportedProvider,
};
#[cfg(all(windows, feature = "sspi"))]
pub use self::auth::{SspiContext, SspiCredentials, SspiProvider};
pub use self::error::{BoxError, Error, Result};

mod auth;
mod error;
