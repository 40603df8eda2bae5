// src/auth/transport.rs

//! Request middleware performing the three-message NTLM handshake.
//!
//! 1. Send the request without credentials.
//! 2. On `401` with an `NTLM` or `Negotiate` challenge, open a security
//!    context and resend with the negotiate message.
//! 3. Feed the server challenge to the context and resend with the
//!    authenticate message. That third response is returned as is.

use std::fmt;
use std::task::{Context, Poll};

use base64::Engine as _;
use bytes::Bytes;
use futures_util::future::BoxFuture;
use http::header::AUTHORIZATION;
use http::request::Parts;
use http::{HeaderValue, Request, Response, StatusCode};
use http_body::Body;
use http_body_util::{BodyExt, Full};
use tower::ServiceExt;
use tower_layer::Layer;
use tower_service::Service;

use super::context::{derive_spn, ClientCredentials, SecurityContext, SecurityProvider};
use super::header::{AuthHeader, Scheme};
use super::DefaultProvider;
use crate::error::BoxError;
use crate::Result;

/// Layer that wraps a request sender in [`Ntlm`].
///
/// ```ignore
/// let client = hyper_util::client::legacy::Client::builder(TokioExecutor::new()).build_http();
/// let svc = tower::ServiceBuilder::new().layer(NtlmLayer::new()).service(client);
/// ```
#[derive(Clone, Debug)]
pub struct NtlmLayer<P = DefaultProvider> {
    provider: P,
}

impl NtlmLayer {
    /// Authenticate as the current user with the platform's provider.
    pub fn new() -> Self {
        NtlmLayer {
            provider: DefaultProvider::current_user(),
        }
    }
}

impl Default for NtlmLayer {
    fn default() -> Self {
        NtlmLayer::new()
    }
}

impl<P> NtlmLayer<P> {
    /// Authenticate with a specific security provider.
    pub fn with_provider(provider: P) -> Self {
        NtlmLayer { provider }
    }
}

impl<S, P: Clone> Layer<S> for NtlmLayer<P> {
    type Service = Ntlm<S, P>;

    fn layer(&self, inner: S) -> Self::Service {
        Ntlm::with_provider(inner, self.provider.clone())
    }
}

/// A request sender that answers NTLM and Negotiate challenges.
///
/// The inner service takes requests with a buffered [`Full`] body, since
/// the same body is sent up to three times. Any `Authorization` header the
/// caller set is removed before the first send.
///
/// Each call keeps its handshake state to itself, so one `Ntlm` can be
/// cloned and used from many tasks at once as long as the inner service
/// allows it.
#[derive(Clone)]
pub struct Ntlm<S, P = DefaultProvider> {
    inner: S,
    provider: P,
}

impl<S> Ntlm<S> {
    pub fn new(inner: S) -> Self {
        Ntlm::with_provider(inner, DefaultProvider::current_user())
    }
}

impl<S, P> Ntlm<S, P> {
    pub fn with_provider(inner: S, provider: P) -> Self {
        Ntlm { inner, provider }
    }

    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: fmt::Debug, P: fmt::Debug> fmt::Debug for Ntlm<S, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ntlm")
            .field("inner", &self.inner)
            .field("provider", &self.provider)
            .finish()
    }
}

impl<S, P, ReqBody, ResBody> Service<Request<ReqBody>> for Ntlm<S, P>
where
    S: Service<Request<Full<Bytes>>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Error: Into<BoxError>,
    S::Future: Send,
    P: SecurityProvider + Clone + Send + 'static,
    P::Credentials: Send,
    <P::Credentials as ClientCredentials>::Context: Send,
    ReqBody: Body + Send + 'static,
    ReqBody::Data: Send,
    ReqBody::Error: Into<BoxError>,
    ResBody: Body + Send + 'static,
    ResBody::Data: Send,
    ResBody::Error: Into<BoxError>,
{
    type Response = Response<ResBody>;
    type Error = crate::Error;
    type Future = BoxFuture<'static, Result<Response<ResBody>>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<()>> {
        self.inner.poll_ready(cx).map_err(crate::error::send)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        // take the service that was driven to readiness, leave a clone behind
        let clone = self.inner.clone();
        let inner = std::mem::replace(&mut self.inner, clone);
        let provider = self.provider.clone();
        Box::pin(execute_with_ntlm(inner, provider, req))
    }
}

/// Runs one request through the handshake.
///
/// Returns the first response that is not a usable challenge, or the
/// response to the authenticate message. Errors from the inner service and
/// from the provider abort the call; nothing is retried.
async fn execute_with_ntlm<S, P, ReqBody, ResBody>(
    mut inner: S,
    provider: P,
    req: Request<ReqBody>,
) -> Result<Response<ResBody>>
where
    S: Service<Request<Full<Bytes>>, Response = Response<ResBody>>,
    S::Error: Into<BoxError>,
    P: SecurityProvider,
    ReqBody: Body,
    ReqBody::Error: Into<BoxError>,
    ResBody: Body,
    ResBody::Error: Into<BoxError>,
{
    if !P::AVAILABLE {
        return Err(crate::error::unsupported());
    }

    let (mut parts, body) = req.into_parts();
    parts.headers.remove(AUTHORIZATION);
    let body = body.collect().await.map_err(crate::error::body)?.to_bytes();

    let res = send(&mut inner, &parts, &body).await?;
    if res.status() != StatusCode::UNAUTHORIZED {
        return Ok(res);
    }

    let challenge = AuthHeader::from_headers(res.headers());
    let scheme = match challenge.reply_scheme() {
        Some(scheme) => scheme,
        None => {
            log::debug!(
                "401 without NTLM or Negotiate challenge ({:?}), returning it",
                challenge.schemes()
            );
            return Ok(res);
        }
    };
    log::debug!("{} challenge from {}, starting handshake", scheme, parts.uri);

    let target = derive_spn(&parts.uri);
    // declared before the context so the context is released first
    let credentials = provider
        .acquire_credentials()
        .map_err(crate::error::credentials)?;
    let (mut context, negotiate) = credentials
        .new_client_context(target.as_deref())
        .map_err(crate::error::credentials)?;
    log::trace!("negotiate message is {} bytes", negotiate.len());

    drain(res).await;
    set_authorization(&mut parts, scheme, &negotiate)?;
    let res = send(&mut inner, &parts, &body).await?;

    let status = res.status();
    let challenge = AuthHeader::from_headers(res.headers());
    let scheme = match challenge.reply_scheme() {
        Some(scheme) => scheme,
        None => {
            log::debug!("server dropped the {} challenge ({})", scheme, status);
            let headers = res.headers().clone();
            drain(res).await;
            return Err(crate::error::negotiation_failed(status).with_challenge(headers));
        }
    };
    let server_challenge = match challenge.token(scheme) {
        Ok(token) if !token.is_empty() => token,
        Ok(_) => {
            log::debug!("server sent an empty {} challenge ({})", scheme, status);
            let headers = res.headers().clone();
            drain(res).await;
            return Err(crate::error::negotiation_failed(status).with_challenge(headers));
        }
        Err(e) => {
            let headers = res.headers().clone();
            drain(res).await;
            return Err(e.with_status(status).with_challenge(headers));
        }
    };
    log::trace!("challenge message is {} bytes", server_challenge.len());
    drain(res).await;

    let authenticate = context
        .update(&server_challenge)
        .map_err(crate::error::context)?;
    set_authorization(&mut parts, scheme, &authenticate)?;
    log::debug!("sending {} authenticate message to {}", scheme, parts.uri);

    let res = send(&mut inner, &parts, &body).await?;
    log::debug!("handshake finished with {}", res.status());
    Ok(res)
}

/// Sends a copy of the request with a fresh body over the buffered bytes.
async fn send<S, ResBody>(inner: &mut S, parts: &Parts, body: &Bytes) -> Result<Response<ResBody>>
where
    S: Service<Request<Full<Bytes>>, Response = Response<ResBody>>,
    S::Error: Into<BoxError>,
{
    let mut req = Request::new(Full::new(body.clone()));
    *req.method_mut() = parts.method.clone();
    *req.uri_mut() = parts.uri.clone();
    *req.version_mut() = parts.version;
    *req.headers_mut() = parts.headers.clone();
    *req.extensions_mut() = parts.extensions.clone();

    inner
        .ready()
        .await
        .map_err(crate::error::send)?
        .call(req)
        .await
        .map_err(crate::error::send)
}

fn set_authorization(parts: &mut Parts, scheme: Scheme, token: &[u8]) -> Result<()> {
    let encoded = base64::engine::general_purpose::STANDARD.encode(token);
    let mut value =
        HeaderValue::try_from(format!("{} {}", scheme, encoded)).map_err(crate::error::header)?;
    value.set_sensitive(true);
    parts.headers.insert(AUTHORIZATION, value);
    Ok(())
}

/// Reads a response body to the end so the connection can be reused.
/// Failures are logged, never returned.
async fn drain<B>(res: Response<B>)
where
    B: Body,
    B::Error: Into<BoxError>,
{
    if let Err(e) = res.into_body().collect().await {
        let e: BoxError = e.into();
        log::debug!("error draining response body: {}", e);
    }
}
