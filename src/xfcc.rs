//! Forwarded client certificate authentication for inbound service calls.
//!
//! The router terminating mutual TLS forwards the caller's certificate in the
//! `X-Forwarded-Client-Cert` header as base64 DER, optionally wrapped in double quotes. The
//! certificate's subject organizational units carry `org:<guid>` (platform instance identity
//! certificates spell it `organization:<guid>`) and `space:<guid>` tokens that must match the
//! configured pair before a request reaches the wrapped service.

// std
use std::{
	future,
	task::{Context as TaskContext, Poll},
};
// crates.io
use base64::{Engine, engine::general_purpose::STANDARD};
use http::{HeaderMap, Request, Response, StatusCode};
use tower_layer::Layer;
use tower_service::Service;
use x509_parser::certificate::X509Certificate;
// self
use crate::_prelude::*;

/// Header carrying the forwarded client certificate.
pub const XFCC_HEADER: &str = "x-forwarded-client-cert";

const UNAUTHORIZED_BODY: &str = "Unauthorized";

/// Boxed response future returned by [`XfccService`].
pub type XfccFuture<T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send>>;

/// Expected organization and space of callers.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct XfccConfig {
	/// Organization GUID every caller certificate must declare.
	pub valid_org_guid: String,
	/// Space GUID every caller certificate must declare.
	pub valid_space_guid: String,
}
impl XfccConfig {
	/// Creates a configuration accepting certificates issued for `org` and `space`.
	pub fn new(org: impl Into<String>, space: impl Into<String>) -> Self {
		Self { valid_org_guid: org.into(), valid_space_guid: space.into() }
	}
}

/// Reasons an inbound request is rejected.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum XfccError {
	/// The request carries no forwarded certificate.
	#[error("header not found")]
	HeaderNotFound,
	/// The header is not a base64 encoded DER certificate.
	#[error("parse failure")]
	Parse {
		/// Low-level cause, kept for logs only.
		detail: String,
	},
	/// The certificate declares a different (or no) organization.
	#[error("wrong org")]
	WrongOrg,
	/// The certificate declares a different (or no) space.
	#[error("wrong space")]
	WrongSpace,
}
impl XfccError {
	fn parse(detail: impl Display) -> Self {
		Self::Parse { detail: detail.to_string() }
	}
}

/// Identity declared by a forwarded client certificate.
///
/// Inserted into the request extensions once authentication succeeds.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CertIdentity {
	/// First `org:` (or `organization:`) token found in the subject organizational units.
	pub org_guid: Option<String>,
	/// First `space:` token found in the subject organizational units.
	pub space_guid: Option<String>,
}
impl CertIdentity {
	/// Decodes a header value (base64 DER, optionally quote-wrapped) into an identity.
	pub fn from_header_value(value: &str) -> Result<Self, XfccError> {
		let encoded = value.trim().trim_matches('"');
		let der = STANDARD.decode(encoded).map_err(XfccError::parse)?;
		let (_, cert) = x509_parser::parse_x509_certificate(&der).map_err(XfccError::parse)?;

		Ok(Self::from_certificate(&cert))
	}

	/// Scans the subject organizational units for `org:`/`organization:` and `space:` tokens.
	pub fn from_certificate(cert: &X509Certificate<'_>) -> Self {
		let mut identity = Self::default();

		for unit in cert.subject().iter_organizational_unit() {
			// Units that are not valid strings cannot carry tokens.
			let Ok(text) = unit.as_str() else { continue };

			identity.absorb(text);
		}

		identity
	}

	fn absorb(&mut self, text: &str) {
		for (key, value) in text.split_whitespace().filter_map(|token| token.split_once(':')) {
			match key {
				"org" | "organization" if self.org_guid.is_none() => {
					self.org_guid = Some(value.to_owned())
				},
				"space" if self.space_guid.is_none() => self.space_guid = Some(value.to_owned()),
				_ => {},
			}
		}
	}
}

/// Checks the forwarded certificate in `headers` against `config`.
pub fn authenticate(config: &XfccConfig, headers: &HeaderMap) -> Result<CertIdentity, XfccError> {
	let value = headers.get(XFCC_HEADER).ok_or(XfccError::HeaderNotFound)?;
	let value = value.to_str().map_err(XfccError::parse)?;

	if value.trim().is_empty() {
		return Err(XfccError::HeaderNotFound);
	}

	let identity = CertIdentity::from_header_value(value)?;

	if identity.org_guid.as_deref() != Some(config.valid_org_guid.as_str()) {
		return Err(XfccError::WrongOrg);
	}
	if identity.space_guid.as_deref() != Some(config.valid_space_guid.as_str()) {
		return Err(XfccError::WrongSpace);
	}

	Ok(identity)
}

/// Layer wrapping services with [`XfccService`].
#[derive(Clone, Debug)]
pub struct XfccLayer {
	config: Arc<XfccConfig>,
}
impl XfccLayer {
	/// Creates a layer that admits callers matching `config`.
	pub fn new(config: XfccConfig) -> Self {
		Self { config: Arc::new(config) }
	}
}
impl<S> Layer<S> for XfccLayer {
	type Service = XfccService<S>;

	fn layer(&self, inner: S) -> Self::Service {
		XfccService { inner, config: self.config.clone() }
	}
}

/// Service rejecting requests whose forwarded certificate does not match the expected org and
/// space with a generic `401 Unauthorized`.
#[derive(Clone, Debug)]
pub struct XfccService<S> {
	inner: S,
	config: Arc<XfccConfig>,
}
impl<S> XfccService<S> {
	/// Wraps `inner`, admitting callers matching `config`.
	pub fn new(inner: S, config: XfccConfig) -> Self {
		Self { inner, config: Arc::new(config) }
	}

	/// Returns the expected org and space.
	pub fn config(&self) -> &XfccConfig {
		&self.config
	}
}
impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for XfccService<S>
where
	S: Service<Request<ReqBody>, Response = Response<ResBody>>,
	S::Error: Send + 'static,
	S::Future: Send + 'static,
	ResBody: From<&'static str> + Send + 'static,
{
	type Error = S::Error;
	type Future = XfccFuture<Self::Response, Self::Error>;
	type Response = Response<ResBody>;

	fn poll_ready(&mut self, cx: &mut TaskContext<'_>) -> Poll<Result<(), Self::Error>> {
		self.inner.poll_ready(cx)
	}

	fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
		match authenticate(&self.config, req.headers()) {
			Ok(identity) => {
				req.extensions_mut().insert(identity);

				Box::pin(self.inner.call(req))
			},
			Err(e) => {
				match &e {
					XfccError::Parse { detail } => tracing::warn!(
						reason = %e,
						detail = %detail,
						path = %req.uri().path(),
						"rejected forwarded client certificate"
					),
					_ => tracing::warn!(
						reason = %e,
						path = %req.uri().path(),
						"rejected forwarded client certificate"
					),
				}

				Box::pin(future::ready(Ok(unauthorized())))
			},
		}
	}
}

fn unauthorized<B>() -> Response<B>
where
	B: From<&'static str>,
{
	let mut response = Response::new(B::from(UNAUTHORIZED_BODY));

	*response.status_mut() = StatusCode::UNAUTHORIZED;

	response
}
