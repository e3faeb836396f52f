//! Structured error answers returned by the platform API.

// self
use crate::_prelude::*;

/// Platform error code for a missing resource.
pub const CODE_RESOURCE_NOT_FOUND: i64 = 10010;
/// Platform error code for an authenticated caller lacking permission.
pub const CODE_NOT_AUTHORIZED: i64 = 10003;
/// Platform error code for a caller without valid credentials.
pub const CODE_NOT_AUTHENTICATED: i64 = 10002;

/// Single `(code, title, detail)` entry of a platform error envelope.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformErrorItem {
	/// Numeric platform error code.
	pub code: i64,
	/// Short machine-oriented title such as `CF-ResourceNotFound`.
	#[serde(default)]
	pub title: String,
	/// Human readable detail.
	#[serde(default)]
	pub detail: String,
}

#[derive(Deserialize)]
struct Envelope {
	errors: Vec<PlatformErrorItem>,
}

/// Structured platform error: request URL, resource id, HTTP status, and ordered error items.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlatformError {
	/// Request URL.
	pub url: Url,
	/// Resource identifier the request targeted.
	pub resource_id: String,
	/// HTTP status code.
	pub status: u16,
	/// Ordered error items; never empty for errors built by [`PlatformError::from_response`].
	pub errors: Vec<PlatformErrorItem>,
}
impl PlatformError {
	/// Builds a structured error from a non-success response body.
	///
	/// Bodies that are not JSON, or that parse but carry no error items, become
	/// [`Error::InvalidErrorBody`] so they are never mistaken for a domain answer.
	pub fn from_response(
		url: Url,
		resource_id: impl Into<String>,
		status: u16,
		body: &[u8],
	) -> Result<Self, Error> {
		let resource_id = resource_id.into();
		let invalid = |source: Option<serde_json::Error>| Error::InvalidErrorBody {
			resource_id: resource_id.clone(),
			url: url.clone(),
			status,
			body: String::from_utf8_lossy(body).into_owned(),
			source,
		};
		let envelope = match serde_json::from_slice::<Envelope>(body) {
			Ok(envelope) => envelope,
			Err(e) => return Err(invalid(Some(e))),
		};

		if envelope.errors.is_empty() {
			return Err(invalid(None));
		}

		Ok(Self { url, resource_id, status, errors: envelope.errors })
	}

	/// Whether the error carries at least one item.
	pub fn is_valid(&self) -> bool {
		!self.errors.is_empty()
	}

	/// Whether any item has the given code.
	pub fn has_code(&self, code: i64) -> bool {
		self.errors.iter().any(|item| item.code == code)
	}

	/// Whether the platform reported the resource as missing.
	pub fn is_not_found(&self) -> bool {
		self.has_code(CODE_RESOURCE_NOT_FOUND)
	}

	/// Whether the platform reported the caller as lacking permission.
	pub fn is_not_authorized(&self) -> bool {
		self.has_code(CODE_NOT_AUTHORIZED)
	}

	/// Whether the platform reported the caller as unauthenticated.
	pub fn is_not_authenticated(&self) -> bool {
		self.has_code(CODE_NOT_AUTHENTICATED)
	}
}
impl Display for PlatformError {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Platform API error url='{}', resource_id='{}': ", self.url, self.resource_id)?;

		if self.errors.is_empty() {
			return f.write_str("None found");
		}

		for (i, item) in self.errors.iter().enumerate() {
			if i > 0 {
				f.write_str(", ")?;
			}

			write!(f, "['{}' code: {}, Detail: '{}']", item.title, item.code, item.detail)?;
		}

		Ok(())
	}
}
impl StdError for PlatformError {}
