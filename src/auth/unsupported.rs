// src/auth/unsupported.rs

//! Provider for builds without a security-context implementation.

use super::context::{ClientCredentials, Credentials, Package, SecurityContext, SecurityProvider};
use crate::error::BoxError;

/// A provider that cannot authenticate.
///
/// Used as the default provider off Windows, or when the `sspi` feature is
/// disabled. A transport built on it fails every request with an error for
/// which [`Error::is_unsupported`](crate::Error::is_unsupported) is true,
/// instead of sending anything unauthenticated.
///
/// The constructors mirror the Windows `SspiProvider` so code configuring
/// `DefaultProvider` builds on every platform. The configuration is
/// discarded.
#[derive(Clone, Debug, Default)]
pub struct UnsupportedProvider {
    _priv: (),
}

impl UnsupportedProvider {
    pub fn current_user() -> Self {
        Self::default()
    }

    /// Accepts and discards `credentials`.
    pub fn with_credentials(_credentials: Credentials) -> Self {
        Self::default()
    }

    /// Accepts and discards `package`.
    pub fn package(self, _package: Package) -> Self {
        self
    }
}

/// Never constructed.
#[derive(Debug)]
pub enum Unavailable {}

impl SecurityProvider for UnsupportedProvider {
    type Credentials = Unavailable;

    const AVAILABLE: bool = false;

    fn acquire_credentials(&self) -> Result<Unavailable, BoxError> {
        Err(crate::error::unsupported().into())
    }
}

impl ClientCredentials for Unavailable {
    type Context = Unavailable;

    fn new_client_context(&self, _target: Option<&str>) -> Result<(Unavailable, Vec<u8>), BoxError> {
        match *self {}
    }
}

impl SecurityContext for Unavailable {
    fn update(&mut self, _challenge: &[u8]) -> Result<Vec<u8>, BoxError> {
        match *self {}
    }
}
