// tests/support/provider.rs

//! A scripted security provider that records what the transport asks of it.

use std::sync::{Arc, Mutex};

use http_ntlm::{BoxError, ClientCredentials, SecurityContext, SecurityProvider};

pub const NEGOTIATE: &[u8] = b"NTLMSSP\x00\x01negotiate";

/// The authenticate message the mock context answers `challenge` with.
pub fn authenticate_for(challenge: &[u8]) -> Vec<u8> {
    [b"NTLMSSP\x00\x03".as_slice(), challenge].concat()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fail {
    Acquire,
    Create,
    Update,
}

#[derive(Debug, Default)]
pub struct Calls {
    events: Mutex<Vec<&'static str>>,
    targets: Mutex<Vec<Option<String>>>,
    challenges: Mutex<Vec<Vec<u8>>>,
}

impl Calls {
    fn push(&self, event: &'static str) {
        self.events.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, event: &str) -> usize {
        self.events().iter().filter(|e| **e == event).count()
    }

    pub fn targets(&self) -> Vec<Option<String>> {
        self.targets.lock().unwrap().clone()
    }

    pub fn challenges(&self) -> Vec<Vec<u8>> {
        self.challenges.lock().unwrap().clone()
    }
}

#[derive(Clone, Debug, Default)]
pub struct MockProvider {
    calls: Arc<Calls>,
    fail: Option<Fail>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(fail: Fail) -> Self {
        MockProvider {
            calls: Arc::default(),
            fail: Some(fail),
        }
    }

    pub fn calls(&self) -> Arc<Calls> {
        self.calls.clone()
    }
}

impl SecurityProvider for MockProvider {
    type Credentials = MockCredentials;

    fn acquire_credentials(&self) -> Result<MockCredentials, BoxError> {
        if self.fail == Some(Fail::Acquire) {
            return Err("no logon session".into());
        }
        self.calls.push("acquire");
        Ok(MockCredentials {
            calls: self.calls.clone(),
            fail: self.fail,
        })
    }
}

#[derive(Debug)]
pub struct MockCredentials {
    calls: Arc<Calls>,
    fail: Option<Fail>,
}

impl ClientCredentials for MockCredentials {
    type Context = MockContext;

    fn new_client_context(
        &self,
        target: Option<&str>,
    ) -> Result<(MockContext, Vec<u8>), BoxError> {
        if self.fail == Some(Fail::Create) {
            return Err("package not found".into());
        }
        self.calls.push("create");
        self.calls.targets.lock().unwrap().push(target.map(str::to_owned));
        let ctx = MockContext {
            calls: self.calls.clone(),
            fail: self.fail,
        };
        Ok((ctx, NEGOTIATE.to_vec()))
    }
}

impl Drop for MockCredentials {
    fn drop(&mut self) {
        self.calls.push("release credentials");
    }
}

#[derive(Debug)]
pub struct MockContext {
    calls: Arc<Calls>,
    fail: Option<Fail>,
}

impl SecurityContext for MockContext {
    fn update(&mut self, challenge: &[u8]) -> Result<Vec<u8>, BoxError> {
        if self.fail == Some(Fail::Update) {
            return Err("invalid token".into());
        }
        self.calls.push("update");
        self.calls.challenges.lock().unwrap().push(challenge.to_vec());
        Ok(authenticate_for(challenge))
    }
}

impl Drop for MockContext {
    fn drop(&mut self) {
        self.calls.push("release context");
    }
}
