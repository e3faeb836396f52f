//! Client-level error types shared across the transport, token, retriever, and platform layers.

mod platform;

pub use platform::*;

// std
use std::borrow::Cow;
// self
use crate::_prelude::*;

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Boxed error used where the concrete failure type is erased.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical client error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS, body IO).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Structured error answered by the platform API.
	#[error(transparent)]
	Platform(#[from] PlatformError),

	/// Non-success response whose body is not a usable structured error.
	#[error(
		"Platform returned an unusable error body for `{resource_id}` with status {status}: {body}."
	)]
	InvalidErrorBody {
		/// Resource identifier the request targeted.
		resource_id: String,
		/// Request URL.
		url: Url,
		/// HTTP status code.
		status: u16,
		/// Raw response body.
		body: String,
		/// JSON failure, absent when the body parsed but carried no error items.
		#[source]
		source: Option<serde_json::Error>,
	},
	/// Response body could not be decoded into the expected resource type.
	#[error("Failed to decode `{type_name}`.")]
	Decode {
		/// Rust type the body was decoded into.
		type_name: &'static str,
		/// Structured decoding failure including the JSON path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Request body could not be encoded.
	#[error("Failed to encode `{type_name}`.")]
	Encode {
		/// Rust type being encoded.
		type_name: &'static str,
		/// Underlying serializer failure.
		#[source]
		source: serde_json::Error,
	},
	/// Client-credentials grant failed, either on the wire or with a non-success answer.
	#[error("Token grant against `{url}` failed.")]
	TokenGrant {
		/// Token endpoint URL.
		url: Url,
		/// HTTP status code, when a response was received.
		status: Option<u16>,
		/// Underlying failure.
		#[source]
		source: BoxError,
	},
	/// Identity provider rejected the presented access token.
	#[error("Identity provider rejected the access token.")]
	Unauthorized,
	/// Endpoint answered a status the caller does not handle.
	#[error("Request to `{url}` returned unexpected status {status}: {body}.")]
	UnexpectedStatus {
		/// Request URL.
		url: Url,
		/// HTTP status code.
		status: u16,
		/// Raw response body.
		body: String,
	},
	/// Root document omitted a link the client depends on.
	#[error("Platform root document does not advertise the `{name}` endpoint.")]
	MissingEndpoint {
		/// Link name.
		name: &'static str,
	},
	/// Call context deadline passed before the operation finished.
	#[error("Operation deadline exceeded.")]
	DeadlineExceeded,
	/// Pagination failed on the given 1-based page.
	#[error("Failed getting page {page}.")]
	Page {
		/// 1-based page index.
		page: usize,
		/// Failure for that page.
		#[source]
		source: Box<Error>,
	},
	/// Breadcrumb naming the operation that failed.
	#[error("{message}")]
	Context {
		/// Human readable breadcrumb.
		message: Cow<'static, str>,
		/// Wrapped failure.
		#[source]
		source: Box<Error>,
	},
}
impl Error {
	/// Wraps `self` with a breadcrumb message.
	pub fn context(self, message: impl Into<Cow<'static, str>>) -> Self {
		Self::Context { message: message.into(), source: Box::new(self) }
	}

	/// Returns the innermost error, skipping [`Error::Context`] and [`Error::Page`] wrappers.
	pub fn root(&self) -> &Error {
		match self {
			Self::Context { source, .. } | Self::Page { source, .. } => source.root(),
			other => other,
		}
	}

	/// Returns the structured platform error anywhere in the wrapper chain.
	pub fn platform(&self) -> Option<&PlatformError> {
		match self.root() {
			Self::Platform(e) => Some(e),
			_ => None,
		}
	}

	/// Whether the chain carries a platform "resource not found" error.
	pub fn is_not_found(&self) -> bool {
		self.platform().is_some_and(PlatformError::is_not_found)
	}

	/// Whether the chain carries a platform "not authorized" error.
	pub fn is_not_authorized(&self) -> bool {
		self.platform().is_some_and(PlatformError::is_not_authorized)
	}

	/// Whether the chain carries a platform "not authenticated" error.
	pub fn is_not_authenticated(&self) -> bool {
		self.platform().is_some_and(PlatformError::is_not_authenticated)
	}

	/// Whether the identity provider rejected the token somewhere in the chain.
	pub fn is_unauthorized(&self) -> bool {
		matches!(self.root(), Self::Unauthorized)
	}

	/// Whether the chain ends in a cancelled call.
	pub fn is_deadline_exceeded(&self) -> bool {
		matches!(self.root(), Self::DeadlineExceeded)
	}
}

/// Adds breadcrumbs to fallible results.
pub trait ResultExt<T> {
	/// Wraps the error, if any, with `message`.
	fn context(self, message: impl Into<Cow<'static, str>>) -> Result<T>;

	/// Wraps the error, if any, with a lazily built message.
	fn with_context<F, M>(self, f: F) -> Result<T>
	where
		F: FnOnce() -> M,
		M: Into<Cow<'static, str>>;
}
impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
	E: Into<Error>,
{
	fn context(self, message: impl Into<Cow<'static, str>>) -> Result<T> {
		self.map_err(|e| e.into().context(message))
	}

	fn with_context<F, M>(self, f: F) -> Result<T>
	where
		F: FnOnce() -> M,
		M: Into<Cow<'static, str>>,
	{
		self.map_err(|e| e.into().context(f()))
	}
}

/// Configuration and validation failures raised while building clients.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Required configuration field was not supplied.
	#[error("Configuration field `{field}` is required.")]
	MissingField {
		/// Field name.
		field: &'static str,
	},
	/// Configured or discovered URL cannot be used.
	#[error("Configuration field `{field}` holds an invalid URL.")]
	InvalidUrl {
		/// Field name.
		field: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Value cannot be sent as an HTTP header.
	#[error("Value for the `{name}` header is not a valid header value.")]
	InvalidHeader {
		/// Header name.
		name: &'static str,
	},
	/// Configured URL is not an absolute HTTP(S) base.
	#[error("Configuration field `{field}` must be an http or https URL.")]
	UnsupportedScheme {
		/// Field name.
		field: &'static str,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the platform.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the platform.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
impl From<ReqwestError> for Error {
	fn from(e: ReqwestError) -> Self {
		Self::Transport(e.into())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn not_found() -> Error {
		Error::Platform(PlatformError {
			url: Url::parse("https://api.example.com/v3/apps/a")
				.expect("Fixture URL should parse."),
			resource_id: "a".into(),
			status: 404,
			errors: vec![PlatformErrorItem {
				code: CODE_RESOURCE_NOT_FOUND,
				title: "CF-ResourceNotFound".into(),
				detail: "App not found".into(),
			}],
		})
	}

	#[test]
	fn classification_walks_breadcrumbs() {
		let wrapped = Error::Page { page: 2, source: Box::new(not_found().context("get app")) };

		assert!(wrapped.is_not_found());
		assert!(!wrapped.is_not_authorized());
		assert!(!wrapped.is_not_authenticated());
		assert_eq!(wrapped.to_string(), "Failed getting page 2.");
		assert_eq!(wrapped.platform().map(|e| e.status), Some(404));
	}

	#[test]
	fn result_ext_wraps_foreign_errors() {
		let result: std::result::Result<(), TransportError> =
			Err(TransportError::Io(std::io::Error::other("reset")));
		let err = result.context("get endpoints").expect_err("Context should keep the failure.");

		assert_eq!(err.to_string(), "get endpoints");
		assert!(matches!(err.root(), Error::Transport(_)));
	}

	#[test]
	fn unauthorized_detected_through_context() {
		assert!(Error::Unauthorized.context("userinfo").is_unauthorized());
		assert!(!not_found().is_unauthorized());
	}
}
