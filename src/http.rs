//! Transport primitives for platform and identity-provider calls.
//!
//! [`HttpTransport`] is the client's only dependency on an HTTP stack. Responses expose their
//! body through [`ResponseBody`] so decorators such as [`DrainingTransport`] and
//! [`RetryingTransport`](crate::retry::RetryingTransport) can control how unread bytes are
//! released. [`ResponseMetadataSlot`] lets the token grant adapter hand status and retry hints
//! back to error mapping after the `oauth2` crate has consumed the response.

mod draining;

pub use draining::*;

// std
use std::time::Duration as StdDuration;
// crates.io
use bytes::{Bytes, BytesMut};
use reqwest::{
	Request, StatusCode,
	header::{HeaderMap, RETRY_AFTER},
};
use time::format_description::well_known::Rfc2822;
// self
use crate::{
	_prelude::*,
	config::ClientConfig,
	error::{ConfigError, TransportError},
};

/// Future returned by [`HttpTransport::round_trip`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<TransportResponse, TransportError>> + 'a + Send>>;
/// Future returned by [`ResponseBody`] operations.
pub type BodyFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, TransportError>> + 'a + Send>>;

/// Executes a single HTTP exchange.
///
/// Implementations must be `Send + Sync + 'static` so one transport can back every clone of a
/// client. A returned response owns its body; callers either read it or [`close`] it.
///
/// [`close`]: TransportResponse::close
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Sends `request` and resolves once response headers are available.
	fn round_trip(&self, request: Request) -> TransportFuture<'_>;
}
impl<T> HttpTransport for Arc<T>
where
	T: ?Sized + HttpTransport,
{
	fn round_trip(&self, request: Request) -> TransportFuture<'_> {
		(**self).round_trip(request)
	}
}

/// Streaming response body.
pub trait ResponseBody
where
	Self: 'static + Send,
{
	/// Reads the next chunk; `None` marks the end of the body.
	fn chunk(&mut self) -> BodyFuture<'_, Option<Bytes>>;

	/// Releases the body, returning how many unread bytes were discarded on the way.
	fn close(self: Box<Self>) -> BodyFuture<'static, u64>;
}

/// Response head plus an owned streaming body.
pub struct TransportResponse {
	/// HTTP status code.
	pub status: StatusCode,
	/// Response headers.
	pub headers: HeaderMap,
	/// Final request URL.
	pub url: Url,
	body: Box<dyn ResponseBody>,
}
impl TransportResponse {
	/// Assembles a response from its parts.
	pub fn new(
		status: StatusCode,
		headers: HeaderMap,
		url: Url,
		body: Box<dyn ResponseBody>,
	) -> Self {
		Self { status, headers, url, body }
	}

	/// Replaces the body, keeping the head.
	pub fn map_body<F>(self, f: F) -> Self
	where
		F: FnOnce(Box<dyn ResponseBody>) -> Box<dyn ResponseBody>,
	{
		Self { body: f(self.body), ..self }
	}

	/// Reads the whole body and releases it.
	pub async fn bytes(mut self) -> Result<Bytes, TransportError> {
		let mut buf = BytesMut::new();

		while let Some(chunk) = self.body.chunk().await? {
			buf.extend_from_slice(&chunk);
		}

		self.body.close().await?;

		Ok(buf.freeze())
	}

	/// Releases the body without handing it to the caller.
	pub async fn close(self) -> Result<u64, TransportError> {
		self.body.close().await
	}

	/// `Retry-After` hint carried by the response, if any.
	pub fn retry_after(&self) -> Option<StdDuration> {
		parse_retry_after(&self.headers).and_then(|d| StdDuration::try_from(d).ok())
	}
}
impl Debug for TransportResponse {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TransportResponse")
			.field("status", &self.status)
			.field("url", &self.url.as_str())
			.finish_non_exhaustive()
	}
}

/// Captures metadata from the most recent HTTP response for downstream error mapping.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadata {
	/// HTTP status code, if a response was received.
	pub status: Option<u16>,
}

/// Thread-safe slot for sharing [`ResponseMetadata`] between transport and error layers.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadataSlot(Arc<Mutex<Option<ResponseMetadata>>>);
impl ResponseMetadataSlot {
	/// Stores new metadata for the current request.
	pub fn store(&self, meta: ResponseMetadata) {
		*self.0.lock() = Some(meta);
	}

	/// Returns the captured metadata, if any, consuming it from the slot.
	pub fn take(&self) -> Option<ResponseMetadata> {
		self.0.lock().take()
	}
}

/// Connection-pooling transport backed by [`ReqwestClient`].
///
/// Redirects are not followed; the platform and identity provider answer directly.
#[derive(Clone, Debug)]
pub struct ReqwestTransport(ReqwestClient);
impl ReqwestTransport {
	/// Wraps an existing reqwest client.
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a pooled client honouring the TLS, pool, and timeout settings of `config`.
	pub fn from_config(config: &ClientConfig) -> Result<Self, ConfigError> {
		let mut builder = ReqwestClient::builder()
			.redirect(reqwest::redirect::Policy::none())
			.danger_accept_invalid_certs(config.skip_ssl_validation)
			.connect_timeout(StdDuration::from_secs(10))
			.timeout(config.request_timeout)
			.user_agent(config.effective_user_agent());

		if !config.idle_connection_timeout.is_zero() {
			builder = builder.pool_idle_timeout(config.idle_connection_timeout);
		}
		if let Some(max) = config.max_idle_conns_per_host {
			builder = builder.pool_max_idle_per_host(max);
		}

		Ok(Self(builder.build()?))
	}
}
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
impl HttpTransport for ReqwestTransport {
	fn round_trip(&self, request: Request) -> TransportFuture<'_> {
		Box::pin(async move {
			let response = self.0.execute(request).await?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let url = response.url().to_owned();

			Ok(TransportResponse::new(status, headers, url, Box::new(ReqwestBody(Some(response)))))
		})
	}
}

struct ReqwestBody(Option<reqwest::Response>);
impl ResponseBody for ReqwestBody {
	fn chunk(&mut self) -> BodyFuture<'_, Option<Bytes>> {
		Box::pin(async move {
			match self.0.as_mut() {
				Some(response) => match response.chunk().await? {
					Some(chunk) => Ok(Some(chunk)),
					None => {
						self.0 = None;

						Ok(None)
					},
				},
				None => Ok(None),
			}
		})
	}

	fn close(self: Box<Self>) -> BodyFuture<'static, u64> {
		// Dropping an unread reqwest response abandons its connection.
		drop(self);

		Box::pin(async { Ok(0) })
	}
}

pub(crate) fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let value = headers.get(RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<u64>() {
		return Some(Duration::seconds(secs as i64));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}
