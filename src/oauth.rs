//! Client-credentials grant built on the `oauth2` crate.
//!
//! The grant runs over the client's own [`HttpTransport`] stack through [`GrantHttpClient`], so
//! token requests share retries, draining, and the connection pool with API calls.

pub use oauth2;

// crates.io
use oauth2::{
	AsyncHttpClient, AuthType, ClientId, ClientSecret, EndpointNotSet, EndpointSet,
	HttpClientError, HttpRequest, HttpResponse, RequestTokenError, TokenResponse, TokenUrl,
	basic::{BasicClient, BasicRequestTokenError},
};
use reqwest::header::{HeaderValue, USER_AGENT};
// self
use crate::{
	_prelude::*,
	error::{BoxError, TransportError},
	http::{HttpTransport, ResponseMetadata, ResponseMetadataSlot},
	obs::{self, Operation},
	token::{TokenSecret, Tokens},
};

type ConfiguredBasicClient =
	BasicClient<EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;
type GrantResult = Result<HttpResponse, HttpClientError<TransportError>>;
type GrantFuture<'c> = Pin<Box<dyn Future<Output = GrantResult> + 'c + Send>>;

/// Client-credentials grant against a single token endpoint.
///
/// Credentials are sent both as HTTP Basic authentication and as `client_id`/`client_secret`
/// form fields, which identity providers with either client authentication style accept.
pub struct ClientCredentialsGrant {
	oauth_client: ConfiguredBasicClient,
	token_url: Url,
	client_id: String,
	secret: TokenSecret,
	transport: Arc<dyn HttpTransport>,
	user_agent: HeaderValue,
}
impl ClientCredentialsGrant {
	/// Prepares a grant against `token_url`.
	pub fn new(
		token_url: Url,
		client_id: &str,
		secret: &TokenSecret,
		transport: Arc<dyn HttpTransport>,
		user_agent: HeaderValue,
	) -> Self {
		let oauth_client = BasicClient::new(ClientId::new(client_id.to_owned()))
			.set_client_secret(ClientSecret::new(secret.expose().to_owned()))
			.set_token_uri(TokenUrl::from_url(token_url.clone()))
			.set_auth_type(AuthType::BasicAuth);

		Self {
			oauth_client,
			token_url,
			client_id: client_id.to_owned(),
			secret: secret.clone(),
			transport,
			user_agent,
		}
	}

	/// Token endpoint this grant targets.
	pub fn token_url(&self) -> &Url {
		&self.token_url
	}

	/// Issues the grant; every failure is reported as [`Error::TokenGrant`].
	pub async fn exchange(&self) -> Result<Tokens> {
		obs::observe(Operation::TokenGrant, "exchange", async {
			let meta = ResponseMetadataSlot::default();
			let http_client = GrantHttpClient {
				transport: self.transport.clone(),
				slot: meta.clone(),
				user_agent: self.user_agent.clone(),
			};
			let response = self
				.oauth_client
				.exchange_client_credentials()
				.add_extra_param("client_id", self.client_id.as_str())
				.add_extra_param("client_secret", self.secret.expose())
				.request_async(&http_client)
				.await
				.map_err(|e| self.map_request_error(meta.take(), e))?;
			let expires_in = response.expires_in().ok_or_else(|| Error::TokenGrant {
				url: self.token_url.clone(),
				status: None,
				source: "Token response is missing expires_in.".into(),
			})?;

			tracing::info!(
				token_url = %self.token_url,
				expires_in = expires_in.as_secs(),
				"token granted"
			);

			Ok(Tokens {
				access_token: TokenSecret::new(response.access_token().secret().to_owned()),
				expires_in: i64::try_from(expires_in.as_secs()).unwrap_or(i64::MAX),
			})
		})
		.await
	}

	fn map_request_error(
		&self,
		meta: Option<ResponseMetadata>,
		err: BasicRequestTokenError<HttpClientError<TransportError>>,
	) -> Error {
		let status = meta.and_then(|m| m.status);
		let source: BoxError = match err {
			RequestTokenError::ServerResponse(response) => response.to_string().into(),
			RequestTokenError::Request(e) => Box::new(e),
			RequestTokenError::Parse(e, _body) => Box::new(e),
			RequestTokenError::Other(message) => message.into(),
		};

		tracing::warn!(token_url = %self.token_url, status, error = %source, "token grant failed");

		Error::TokenGrant { url: self.token_url.clone(), status, source }
	}
}
impl Debug for ClientCredentialsGrant {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ClientCredentialsGrant")
			.field("token_url", &self.token_url.as_str())
			.field("client_id", &self.client_id)
			.field("secret", &self.secret)
			.finish_non_exhaustive()
	}
}

/// [`AsyncHttpClient`] adapter that runs `oauth2` requests through an [`HttpTransport`].
pub struct GrantHttpClient {
	transport: Arc<dyn HttpTransport>,
	slot: ResponseMetadataSlot,
	user_agent: HeaderValue,
}
impl<'c> AsyncHttpClient<'c> for GrantHttpClient {
	type Error = HttpClientError<TransportError>;
	type Future = GrantFuture<'c>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		Box::pin(async move {
			self.slot.take();

			let mut request = reqwest::Request::try_from(request)
				.map_err(|e| Box::new(TransportError::from(e)))?;

			request.headers_mut().insert(USER_AGENT, self.user_agent.clone());

			let response = self.transport.round_trip(request).await.map_err(Box::new)?;
			let status = response.status;
			let headers = response.headers.clone();

			self.slot.store(ResponseMetadata { status: Some(status.as_u16()) });

			let body = response.bytes().await.map_err(Box::new)?;
			let mut out = HttpResponse::new(body.to_vec());

			*out.status_mut() = status;
			*out.headers_mut() = headers;

			Ok(out)
		})
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::atomic::{AtomicUsize, Ordering};
	// crates.io
	use bytes::Bytes;
	use reqwest::{
		Request, StatusCode,
		header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap},
	};
	// self
	use super::*;
	use crate::http::{BodyFuture, ResponseBody, TransportFuture, TransportResponse};

	struct StaticBody(Option<Bytes>);
	impl ResponseBody for StaticBody {
		fn chunk(&mut self) -> BodyFuture<'_, Option<Bytes>> {
			let next = self.0.take();

			Box::pin(async move { Ok(next) })
		}

		fn close(self: Box<Self>) -> BodyFuture<'static, u64> {
			Box::pin(async { Ok(0) })
		}
	}

	struct TokenEndpoint {
		status: u16,
		body: &'static str,
		seen: Mutex<Option<(HeaderMap, String)>>,
		calls: AtomicUsize,
	}
	impl HttpTransport for TokenEndpoint {
		fn round_trip(&self, request: Request) -> TransportFuture<'_> {
			self.calls.fetch_add(1, Ordering::SeqCst);

			let body = request
				.body()
				.and_then(|b| b.as_bytes())
				.map(|b| String::from_utf8_lossy(b).into_owned())
				.unwrap_or_default();

			*self.seen.lock() = Some((request.headers().clone(), body));

			let mut headers = HeaderMap::new();

			headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

			let response = TransportResponse::new(
				StatusCode::from_u16(self.status).expect("Fixture status should be valid."),
				headers,
				request.url().clone(),
				Box::new(StaticBody(Some(Bytes::from_static(self.body.as_bytes())))),
			);

			Box::pin(async move { Ok(response) })
		}
	}

	fn grant(endpoint: Arc<TokenEndpoint>) -> ClientCredentialsGrant {
		ClientCredentialsGrant::new(
			Url::parse("https://uaa.example.com/oauth/token").expect("Token URL should parse."),
			"autoscaler",
			&TokenSecret::new("s3cret"),
			endpoint,
			HeaderValue::from_static("control-plane-client/test"),
		)
	}

	fn endpoint(status: u16, body: &'static str) -> Arc<TokenEndpoint> {
		Arc::new(TokenEndpoint {
			status,
			body,
			seen: Default::default(),
			calls: AtomicUsize::new(0),
		})
	}

	#[tokio::test]
	async fn exchange_sends_basic_auth_and_form_credentials() {
		let endpoint = endpoint(
			200,
			r#"{"access_token":"access-1","token_type":"bearer","expires_in":12000}"#,
		);
		let tokens = grant(endpoint.clone()).exchange().await.expect("Grant should succeed.");
		let (headers, body) = endpoint.seen.lock().clone().expect("Request should be recorded.");

		assert_eq!(tokens.access_token.expose(), "access-1");
		assert_eq!(tokens.expires_in, 12000);
		assert!(
			headers
				.get(AUTHORIZATION)
				.and_then(|v| v.to_str().ok())
				.is_some_and(|v| v.starts_with("Basic "))
		);
		assert_eq!(
			headers.get(USER_AGENT).and_then(|v| v.to_str().ok()),
			Some("control-plane-client/test")
		);
		assert!(body.contains("grant_type=client_credentials"));
		assert!(body.contains("client_id=autoscaler"));
		assert!(body.contains("client_secret=s3cret"));
	}

	#[tokio::test]
	async fn rejected_grant_reports_status_and_provider_error() {
		let endpoint = endpoint(401, r#"{"error":"invalid_client","error_description":"Bad"}"#);
		let err = grant(endpoint).exchange().await.expect_err("Rejected grant should fail.");
		let Error::TokenGrant { status, source, .. } = err else {
			panic!("Rejected grant should map to a token grant error.");
		};

		assert_eq!(status, Some(401));
		assert!(source.to_string().contains("invalid_client"));
	}

	#[tokio::test]
	async fn malformed_token_response_is_a_grant_error() {
		let endpoint = endpoint(200, "not json");
		let err = grant(endpoint.clone()).exchange().await.expect_err("Garbage should fail.");

		assert!(matches!(err, Error::TokenGrant { status: Some(200), .. }));
		assert_eq!(endpoint.calls.load(Ordering::SeqCst), 1);
	}
}
