//! Caller identity and authorization helpers backed by the identity provider.

// crates.io
use base64::{Engine, engine::general_purpose::STANDARD};
use reqwest::{
	Method, Request, StatusCode,
	header::{AUTHORIZATION, CONTENT_TYPE, HeaderValue},
};
// self
use crate::{
	_prelude::*,
	client::PlatformClient,
	context::CallContext,
	error::{ConfigError, ResultExt},
	http::TransportResponse,
	model::{AppGuid, IntrospectionResponse, RoleType, UserInfo},
	obs::{self, Operation},
	retriever,
};

impl PlatformClient {
	/// Introspects `token` (with or without a `bearer ` prefix) using the client's credentials.
	pub async fn introspect_token(
		&self,
		ctx: &CallContext,
		token: &str,
	) -> Result<IntrospectionResponse> {
		obs::observe(Operation::Introspect, "introspect_token", async {
			let url = self.get_endpoints(ctx).await?.introspect_url()?;
			let form = url::form_urlencoded::Serializer::new(String::new())
				.append_pair("token", strip_bearer(token))
				.finish();
			let mut request = Request::new(Method::POST, url);

			request.headers_mut().insert(AUTHORIZATION, self.basic_auth()?);
			request.headers_mut().insert(
				CONTENT_TYPE,
				HeaderValue::from_static("application/x-www-form-urlencoded;charset=utf-8"),
			);
			*request.body_mut() = Some(form.into());

			let response = self.0.retriever.unauthenticated().round_trip(ctx, request).await?;

			if response.status != StatusCode::OK {
				return Err(unexpected_status(ctx, response).await);
			}

			retriever::read_json(ctx, response).await
		})
		.await
	}

	/// Whether `token` is active and carries the platform-admin scope.
	pub async fn is_user_admin(&self, ctx: &CallContext, user_token: &str) -> Result<bool> {
		let introspection = self.introspect_token(ctx, user_token).await?;
		let admin = introspection.is_admin();

		if admin {
			tracing::info!("user is platform admin");
		}

		Ok(admin)
	}

	/// Whether `token` is active and was issued to `client_id`.
	pub async fn is_token_authorized(
		&self,
		ctx: &CallContext,
		token: &str,
		client_id: &str,
	) -> Result<bool> {
		let introspection = self.introspect_token(ctx, token).await?;

		Ok(introspection.active && introspection.client_id.as_deref() == Some(client_id))
	}

	/// Resolves the caller behind `user_token` via `GET <uaa>/userinfo`.
	///
	/// A 401 or 404 answer means the token does not identify a user and yields
	/// [`Error::Unauthorized`].
	pub async fn get_user_info(&self, ctx: &CallContext, user_token: &str) -> Result<UserInfo> {
		obs::observe(Operation::UserInfo, "get_user_info", async {
			let url = self.get_endpoints(ctx).await?.userinfo_url()?;
			let mut authorization =
				HeaderValue::from_str(&format!("Bearer {}", strip_bearer(user_token)))
					.map_err(|_| ConfigError::InvalidHeader { name: "authorization" })?;

			authorization.set_sensitive(true);

			let mut request = Request::new(Method::GET, url);

			request.headers_mut().insert(AUTHORIZATION, authorization);

			let response = self.0.retriever.unauthenticated().round_trip(ctx, request).await?;

			match response.status {
				StatusCode::OK => retriever::read_json(ctx, response).await,
				StatusCode::UNAUTHORIZED | StatusCode::NOT_FOUND => {
					tracing::warn!(status = response.status.as_u16(), "user token rejected");

					if let Err(e) = response.close().await {
						tracing::debug!(error = %e, "failed to release rejected userinfo response");
					}

					Err(Error::Unauthorized)
				},
				_ => Err(unexpected_status(ctx, response).await),
			}
		})
		.await
	}

	/// Whether the caller behind `user_token` holds the space-developer role in the space that
	/// owns `app`.
	///
	/// An unidentifiable caller and a not-found role lookup are denials (`Ok(false)`), logged
	/// but not raised. Every other failure propagates.
	pub async fn is_user_space_developer(
		&self,
		ctx: &CallContext,
		user_token: &str,
		app: &AppGuid,
	) -> Result<bool> {
		let user = match self.get_user_info(ctx, user_token).await {
			Ok(info) => info.user_id,
			Err(e) if e.is_unauthorized() => {
				tracing::warn!(%app, "user token not authorized; denying space developer access");

				return Ok(false);
			},
			Err(e) => return Err(e.context(format!("Failed space developer check for app {app}."))),
		};
		let space = self
			.get_app(ctx, app)
			.await
			.with_context(|| format!("Failed to resolve the space of app {app}."))?
			.relationships
			.space
			.data
			.guid;
		let roles = match self.get_space_developer_roles(ctx, &space, &user).await {
			Ok(roles) => roles,
			Err(e) if e.is_not_found() => {
				tracing::info!(%user, %space, "space developer roles not found");

				return Ok(false);
			},
			Err(e) => return Err(e),
		};
		let developer = roles.has_role(RoleType::SpaceDeveloper);

		if !developer {
			tracing::warn!(
				%user,
				%space,
				"user without space developer role tried to access the app"
			);
		}

		Ok(developer)
	}

	fn basic_auth(&self) -> Result<HeaderValue> {
		let credentials = format!("{}:{}", self.0.config.client_id, self.0.config.secret.expose());
		let mut value = HeaderValue::from_str(&format!("Basic {}", STANDARD.encode(credentials)))
			.map_err(|_| ConfigError::InvalidHeader { name: "authorization" })?;

		value.set_sensitive(true);

		Ok(value)
	}
}

/// Strips a case-insensitive `bearer ` prefix.
fn strip_bearer(token: &str) -> &str {
	let token = token.trim();

	match token.split_once(' ') {
		Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim_start(),
		_ => token,
	}
}

async fn unexpected_status(ctx: &CallContext, response: TransportResponse) -> Error {
	let url = response.url.clone();
	let status = response.status.as_u16();
	let body = match ctx.run(async { Ok(response.bytes().await?) }).await {
		Ok(body) => String::from_utf8_lossy(&body).into_owned(),
		Err(e) => return e,
	};

	tracing::warn!(%url, status, "identity provider returned an unexpected status");

	Error::UnexpectedStatus { url, status, body }
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn strip_bearer_handles_prefix_variants() {
		assert_eq!(strip_bearer("bearer abc"), "abc");
		assert_eq!(strip_bearer("Bearer  abc"), "abc");
		assert_eq!(strip_bearer("BEARER abc"), "abc");
		assert_eq!(strip_bearer("abc"), "abc");
		assert_eq!(strip_bearer("basic abc"), "basic abc");
	}
}
