// src/auth/sspi.rs

//! Windows SSPI (Security Support Provider Interface) security provider.
//!
//! Credentials come from `AcquireCredentialsHandleW` and every handshake
//! step is one `InitializeSecurityContextW` call. Output tokens are
//! allocated by SSPI (`ISC_REQ_ALLOCATE_MEMORY`), copied out and freed.

use std::ffi::c_void;
use std::ptr;

use windows::core::{w, PCWSTR};
use windows::Win32::Foundation::{SEC_E_OK, SEC_I_CONTINUE_NEEDED};
use windows::Win32::Security::Authentication::Identity::{
    AcquireCredentialsHandleW, DeleteSecurityContext, FreeContextBuffer, FreeCredentialsHandle,
    InitializeSecurityContextW, SecBuffer, SecBufferDesc, ISC_REQ_ALLOCATE_MEMORY,
    ISC_REQ_CONNECTION, SECBUFFER_TOKEN, SECBUFFER_VERSION, SECPKG_CRED_OUTBOUND,
    SECURITY_NATIVE_DREP, SEC_WINNT_AUTH_IDENTITY_W,
};
use windows::Win32::Security::Credentials::SecHandle;
use windows::Win32::System::Rpc::SEC_WINNT_AUTH_IDENTITY_UNICODE;

use super::context::{ClientCredentials, Credentials, Package, SecurityContext, SecurityProvider};
use crate::error::BoxError;

/// Security provider backed by Windows SSPI.
#[derive(Clone, Debug, Default)]
pub struct SspiProvider {
    credentials: Credentials,
    package: Package,
}

impl SspiProvider {
    /// Authenticate as the user running this process.
    pub fn current_user() -> Self {
        Self::default()
    }

    /// Authenticate as an explicit account.
    pub fn with_credentials(credentials: Credentials) -> Self {
        Self {
            credentials,
            package: Package::default(),
        }
    }

    /// Select the SSPI package. Defaults to NTLM.
    pub fn package(mut self, package: Package) -> Self {
        self.package = package;
        self
    }
}

fn wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

impl SecurityProvider for SspiProvider {
    type Credentials = SspiCredentials;

    fn acquire_credentials(&self) -> Result<SspiCredentials, BoxError> {
        let package = match self.package {
            Package::Ntlm => w!("NTLM"),
            Package::Negotiate => w!("Negotiate"),
        };

        // the wide strings must outlive the acquire call only
        let mut user;
        let mut domain;
        let mut password;
        let mut identity;
        let auth_data = match &self.credentials {
            Credentials::CurrentUser => None,
            Credentials::Explicit {
                username,
                password: pass,
                domain: dom,
            } => {
                user = wide(username);
                domain = wide(dom.as_deref().unwrap_or(""));
                password = wide(pass);
                identity = SEC_WINNT_AUTH_IDENTITY_W {
                    User: user.as_mut_ptr(),
                    UserLength: (user.len() - 1) as u32,
                    Domain: domain.as_mut_ptr(),
                    DomainLength: (domain.len() - 1) as u32,
                    Password: password.as_mut_ptr(),
                    PasswordLength: (password.len() - 1) as u32,
                    Flags: SEC_WINNT_AUTH_IDENTITY_UNICODE,
                };
                Some(&mut identity as *mut SEC_WINNT_AUTH_IDENTITY_W as *const c_void)
            }
        };

        let mut handle = SecHandle::default();
        let mut expiry = 0i64;
        unsafe {
            AcquireCredentialsHandleW(
                PCWSTR::null(),
                package,
                SECPKG_CRED_OUTBOUND,
                None,
                auth_data,
                None,
                None,
                &mut handle,
                Some(&mut expiry as *mut i64),
            )?;
        }

        log::trace!("acquired SSPI credentials for package {}", self.package.as_str());
        Ok(SspiCredentials { handle })
    }
}

/// An SSPI credentials handle, freed on drop.
#[derive(Debug)]
pub struct SspiCredentials {
    handle: SecHandle,
}

impl ClientCredentials for SspiCredentials {
    type Context = SspiContext;

    fn new_client_context(
        &self,
        target: Option<&str>,
    ) -> Result<(SspiContext, Vec<u8>), BoxError> {
        let mut ctx = SspiContext {
            credentials: self.handle,
            handle: SecHandle::default(),
            target: target.map(wide),
            established: false,
        };
        let token = ctx.step(None)?;
        Ok((ctx, token))
    }
}

impl Drop for SspiCredentials {
    fn drop(&mut self) {
        if let Err(e) = unsafe { FreeCredentialsHandle(&self.handle) } {
            log::debug!("FreeCredentialsHandle failed: {:?}", e);
        }
    }
}

/// An SSPI client context, deleted on drop.
#[derive(Debug)]
pub struct SspiContext {
    credentials: SecHandle,
    handle: SecHandle,
    target: Option<Vec<u16>>,
    established: bool,
}

impl SspiContext {
    fn step(&mut self, input: Option<&[u8]>) -> Result<Vec<u8>, BoxError> {
        let mut in_buffer = SecBuffer {
            cbBuffer: input.map_or(0, |i| i.len() as u32),
            BufferType: SECBUFFER_TOKEN,
            pvBuffer: input.map_or(ptr::null_mut(), |i| i.as_ptr() as *mut c_void),
        };
        let in_desc = SecBufferDesc {
            ulVersion: SECBUFFER_VERSION,
            cBuffers: 1,
            pBuffers: &mut in_buffer,
        };

        let mut out_buffer = SecBuffer {
            cbBuffer: 0,
            BufferType: SECBUFFER_TOKEN,
            pvBuffer: ptr::null_mut(),
        };
        let mut out_desc = SecBufferDesc {
            ulVersion: SECBUFFER_VERSION,
            cBuffers: 1,
            pBuffers: &mut out_buffer,
        };

        let handle: *mut SecHandle = &mut self.handle;
        let mut attributes = 0u32;
        let mut expiry = 0i64;
        let status = unsafe {
            InitializeSecurityContextW(
                Some(&self.credentials as *const SecHandle),
                if self.established { Some(handle as *const SecHandle) } else { None },
                self.target.as_ref().map(|t| t.as_ptr()),
                ISC_REQ_ALLOCATE_MEMORY | ISC_REQ_CONNECTION,
                0,
                SECURITY_NATIVE_DREP,
                input.map(|_| &in_desc as *const SecBufferDesc),
                0,
                Some(handle),
                Some(&mut out_desc as *mut SecBufferDesc),
                &mut attributes,
                Some(&mut expiry as *mut i64),
            )
        };

        if status != SEC_E_OK && status != SEC_I_CONTINUE_NEEDED {
            return Err(windows::core::Error::from(status).into());
        }
        self.established = true;

        let token = if out_buffer.pvBuffer.is_null() {
            Vec::new()
        } else {
            let token = unsafe {
                std::slice::from_raw_parts(
                    out_buffer.pvBuffer as *const u8,
                    out_buffer.cbBuffer as usize,
                )
            }
            .to_vec();
            if let Err(e) = unsafe { FreeContextBuffer(out_buffer.pvBuffer) } {
                log::debug!("FreeContextBuffer failed: {:?}", e);
            }
            token
        };

        Ok(token)
    }
}

impl SecurityContext for SspiContext {
    fn update(&mut self, challenge: &[u8]) -> Result<Vec<u8>, BoxError> {
        self.step(Some(challenge))
    }
}

impl Drop for SspiContext {
    fn drop(&mut self) {
        if !self.established {
            return;
        }
        if let Err(e) = unsafe { DeleteSecurityContext(&self.handle) } {
            log::debug!("DeleteSecurityContext failed: {:?}", e);
        }
    }
}
