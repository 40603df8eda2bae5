// src/auth/mod.rs

//! NTLM and Negotiate client authentication.
//!
//! [`header`] reads the `WWW-Authenticate` challenges, [`transport`] runs
//! the handshake, and a [`SecurityProvider`] computes the messages. The
//! provider used by default is picked at build time: Windows SSPI when
//! available, otherwise one that rejects every request.

mod context;
mod header;
mod transport;
mod unsupported;

#[cfg(all(windows, feature = "sspi"))]
mod sspi;

pub use self::context::{ClientCredentials, Credentials, Package, SecurityContext, SecurityProvider};
pub use self::header::{AuthHeader, Scheme, Schemes};
pub use self::transport::{Ntlm, NtlmLayer};
pub use self::unsupported::{Unavailable, UnsupportedProvider};

#[cfg(all(windows, feature = "sspi"))]
pub use self::sspi::{SspiContext, SspiCredentials, SspiProvider};

/// The security provider of this build.
#[cfg(all(windows, feature = "sspi"))]
pub type DefaultProvider = SspiProvider;

/// The security provider of this build.
#[cfg(not(all(windows, feature = "sspi")))]
pub type DefaultProvider = UnsupportedProvider;
