//! Authenticated request execution, structured error mapping, and pagination.

// crates.io
use reqwest::{
	Method, Request,
	header::{AUTHORIZATION, CONTENT_TYPE, HeaderValue, USER_AGENT},
};
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	context::CallContext,
	error::{ConfigError, PlatformError},
	http::{HttpTransport, TransportResponse},
	model::Href,
	token::TokenManager,
};

/// Pagination block of a list response.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
	/// Total resources across every page.
	#[serde(default)]
	pub total_results: u64,
	/// Total page count.
	#[serde(default)]
	pub total_pages: u64,
	/// First page link.
	#[serde(default)]
	pub first: Option<Href>,
	/// Last page link.
	#[serde(default)]
	pub last: Option<Href>,
	/// Next page link; absent, `null`, or empty on the last page.
	#[serde(default)]
	pub next: Option<Href>,
	/// Previous page link.
	#[serde(default)]
	pub previous: Option<Href>,
}
impl Pagination {
	/// Next page URL, or `None` on the last page.
	pub fn next_url(&self) -> Result<Option<Url>, ConfigError> {
		match &self.next {
			Some(href) if !href.href.is_empty() => href.url("pagination.next").map(Some),
			_ => Ok(None),
		}
	}
}

/// Paginated list envelope.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<R> {
	/// Pagination links.
	#[serde(default)]
	pub pagination: Pagination,
	/// Resources on this page, in server order.
	#[serde(default = "Vec::new")]
	pub resources: Vec<R>,
}

/// Executes platform requests through the retrying transport stack.
///
/// Non-success answers become [`Error::Platform`] (or [`Error::InvalidErrorBody`] when the body is
/// not a structured error). The authenticated variant attaches the current bearer token to every
/// request; the plain variant is used for discovery and identity calls that carry their own
/// credentials.
#[derive(Clone)]
pub struct Retriever {
	transport: Arc<dyn HttpTransport>,
	api: Url,
	user_agent: HeaderValue,
	tokens: Option<TokenManager>,
}
impl Retriever {
	/// Creates an unauthenticated retriever rooted at `api`.
	pub fn new(transport: Arc<dyn HttpTransport>, api: Url, user_agent: HeaderValue) -> Self {
		Self { transport, api, user_agent, tokens: None }
	}

	/// Returns a copy that authenticates every request with `tokens`.
	pub fn authenticated(&self, tokens: TokenManager) -> Self {
		Self { tokens: Some(tokens), ..self.clone() }
	}

	/// Returns a copy that sends requests without a bearer token.
	pub fn unauthenticated(&self) -> Self {
		Self { tokens: None, ..self.clone() }
	}

	/// API base URL.
	pub fn api(&self) -> &Url {
		&self.api
	}

	/// Resolves `path_and_query` (starting with `/`) against the API base, keeping its prefix.
	pub fn api_url(&self, path_and_query: &str) -> Result<Url> {
		let joined = format!("{}{}", self.api.as_str().trim_end_matches('/'), path_and_query);

		Url::parse(&joined)
			.map_err(|source| ConfigError::InvalidUrl { field: "api", source }.into())
	}

	/// Sends `request` with the user agent and, when authenticated, the bearer token attached.
	///
	/// The status is not inspected.
	pub async fn round_trip(
		&self,
		ctx: &CallContext,
		mut request: Request,
	) -> Result<TransportResponse> {
		ctx.check()?;

		request.headers_mut().insert(USER_AGENT, self.user_agent.clone());

		if let Some(tokens) = &self.tokens {
			let bearer = tokens
				.get_tokens(ctx)
				.await?
				.access_token
				.bearer_header()
				.ok_or(ConfigError::InvalidHeader { name: "authorization" })?;

			request.headers_mut().insert(AUTHORIZATION, bearer);
		}

		ctx.run(async { Ok(self.transport.round_trip(request).await?) }).await
	}

	/// Like [`round_trip`](Self::round_trip), mapping non-2xx answers to structured errors.
	pub async fn send(&self, ctx: &CallContext, request: Request) -> Result<TransportResponse> {
		let method = request.method().clone();
		let response = self.round_trip(ctx, request).await?;

		if response.status.is_success() {
			return Ok(response);
		}

		let url = response.url.clone();
		let status = response.status.as_u16();
		let body = ctx.run(async { Ok(response.bytes().await?) }).await?;
		let err = match PlatformError::from_response(url.clone(), url.path(), status, &body) {
			Ok(platform) => Error::Platform(platform),
			Err(invalid) => invalid,
		};

		tracing::debug!(%method, %url, status, error = %err, "platform request failed");

		Err(err)
	}

	/// Fetches and decodes a single resource.
	pub async fn get<T>(&self, ctx: &CallContext, url: Url) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let response = self.send(ctx, Request::new(Method::GET, url)).await?;

		read_json(ctx, response).await
	}

	/// Posts `body` as JSON and decodes the answer.
	pub async fn post<B, T>(&self, ctx: &CallContext, url: Url, body: &B) -> Result<T>
	where
		B: Serialize,
		T: DeserializeOwned,
	{
		let payload = serde_json::to_vec(body)
			.map_err(|source| Error::Encode { type_name: std::any::type_name::<B>(), source })?;
		let mut request = Request::new(Method::POST, url);

		request.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
		*request.body_mut() = Some(payload.into());

		let response = self.send(ctx, request).await?;

		read_json(ctx, response).await
	}

	/// Fetches a single page envelope.
	pub async fn get_page<T>(&self, ctx: &CallContext, url: Url) -> Result<Page<T>>
	where
		T: DeserializeOwned,
	{
		self.get(ctx, url).await
	}

	/// Follows `next` links from `url`, collecting every resource in order.
	///
	/// Pages are fetched strictly one after another. A failure on page N aborts the walk with
	/// [`Error::Page`] carrying N (1-based) and discards what was collected.
	pub async fn get_all_pages<T>(&self, ctx: &CallContext, url: Url) -> Result<Vec<T>>
	where
		T: DeserializeOwned,
	{
		let mut resources = Vec::new();
		let mut next = Some(url);
		let mut page = 0;

		while let Some(url) = next.take() {
			page += 1;

			let current = async {
				ctx.check()?;

				let current = self.get_page::<T>(ctx, url).await?;
				let next_url = current.pagination.next_url()?;

				Ok::<_, Error>((current.resources, next_url))
			}
			.await
			.map_err(|e| Error::Page { page, source: Box::new(e) })?;

			resources.extend(current.0);
			next = current.1;
		}

		Ok(resources)
	}
}
impl Debug for Retriever {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Retriever")
			.field("api", &self.api.as_str())
			.field("authenticated", &self.tokens.is_some())
			.finish_non_exhaustive()
	}
}

/// Decodes `bytes` as `T`, naming the type and JSON path on failure.
pub fn decode<T>(bytes: &[u8]) -> Result<T>
where
	T: DeserializeOwned,
{
	let mut deserializer = serde_json::Deserializer::from_slice(bytes);

	serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| Error::Decode { type_name: std::any::type_name::<T>(), source })
}

pub(crate) async fn read_json<T>(ctx: &CallContext, response: TransportResponse) -> Result<T>
where
	T: DeserializeOwned,
{
	let body = ctx.run(async { Ok(response.bytes().await?) }).await?;

	decode(&body)
}
