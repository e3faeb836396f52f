// crates.io
use httpmock::prelude::*;
use serde_json::json;
// self
use control_plane_client::{_preludet::*, context::CallContext, model::AppGuid};

// base64("autoscaler-client:autoscaler-secret")
const BASIC_AUTH: &str = "Basic YXV0b3NjYWxlci1jbGllbnQ6YXV0b3NjYWxlci1zZWNyZXQ=";

async fn mock_platform(server: &MockServer) {
	let root = json!({
		"links": {
			"cloud_controller_v3": { "href": server.url("/v3") },
			"uaa": { "href": server.url("/uaa") },
		}
	});

	server
		.mock_async(|when, then| {
			when.method(GET).path("/");
			then.status(200).json_body(root);
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(POST).path("/uaa/oauth/token");
			then.status(200).json_body(json!({
				"access_token": "client-token",
				"token_type": "bearer",
				"expires_in": 12_000,
			}));
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/v3/apps/app-1");
			then.status(200).json_body(json!({
				"guid": "app-1",
				"relationships": { "space": { "data": { "guid": "space-1" } } }
			}));
		})
		.await;
}

async fn mock_introspection<'a>(
	server: &'a MockServer,
	token: &str,
	answer: serde_json::Value,
) -> httpmock::Mock<'a> {
	let form = format!("token={token}");

	server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/uaa/introspect")
				.header("authorization", BASIC_AUTH)
				.body(form);
			then.status(200).json_body(answer);
		})
		.await
}

async fn mock_user_info(server: &MockServer, status: u16) -> httpmock::Mock<'_> {
	server
		.mock_async(|when, then| {
			when.method(GET).path("/uaa/userinfo").header("authorization", "Bearer user-token");
			then.status(status).json_body(json!({ "user_id": "user-1", "user_name": "dev" }));
		})
		.await
}

fn app_guid() -> AppGuid {
	AppGuid::new("app-1").expect("App GUID fixture should be valid.")
}

#[tokio::test]
async fn admin_requires_an_active_token_with_the_admin_scope() {
	let server = MockServer::start_async().await;

	mock_platform(&server).await;

	let admin = mock_introspection(
		&server,
		"admin-token",
		json!({ "active": true, "client_id": "cf", "scope": ["cloud_controller.admin", "openid"] }),
	)
	.await;
	let _inactive = mock_introspection(
		&server,
		"revoked-token",
		json!({ "active": false, "scope": ["cloud_controller.admin"] }),
	)
	.await;
	let _plain = mock_introspection(
		&server,
		"plain-token",
		json!({ "active": true, "scope": ["openid"] }),
	)
	.await;
	let (client, _clock) = build_test_client(&server.base_url(), 0);
	let ctx = CallContext::background();

	assert!(
		client
			.is_user_admin(&ctx, "bearer admin-token")
			.await
			.expect("Admin introspection should succeed.")
	);
	assert!(
		!client
			.is_user_admin(&ctx, "revoked-token")
			.await
			.expect("Inactive introspection should succeed.")
	);
	assert!(
		!client
			.is_user_admin(&ctx, "plain-token")
			.await
			.expect("Plain introspection should succeed.")
	);

	admin.assert_calls_async(1).await;
}

#[tokio::test]
async fn admin_check_propagates_identity_provider_failures() {
	let server = MockServer::start_async().await;

	mock_platform(&server).await;

	let _broken = server
		.mock_async(|when, then| {
			when.method(POST).path("/uaa/introspect");
			then.status(500).body("boom");
		})
		.await;
	let (client, _clock) = build_test_client(&server.base_url(), 0);
	let err = client
		.is_user_admin(&CallContext::background(), "admin-token")
		.await
		.expect_err("Identity provider failure should propagate.");

	assert!(err.to_string().contains("500"));
}

#[tokio::test]
async fn token_authorization_matches_the_issuing_client() {
	let server = MockServer::start_async().await;

	mock_platform(&server).await;

	let _metrics = mock_introspection(
		&server,
		"metrics-token",
		json!({ "active": true, "client_id": "metrics-forwarder" }),
	)
	.await;
	let _expired = mock_introspection(
		&server,
		"expired-token",
		json!({ "active": false, "client_id": "metrics-forwarder" }),
	)
	.await;
	let (client, _clock) = build_test_client(&server.base_url(), 0);
	let ctx = CallContext::background();

	assert!(
		client
			.is_token_authorized(&ctx, "metrics-token", "metrics-forwarder")
			.await
			.expect("Introspection should succeed.")
	);
	assert!(
		!client
			.is_token_authorized(&ctx, "metrics-token", "someone-else")
			.await
			.expect("Introspection should succeed.")
	);
	assert!(
		!client
			.is_token_authorized(&ctx, "expired-token", "metrics-forwarder")
			.await
			.expect("Introspection should succeed.")
	);
}

#[tokio::test]
async fn space_developer_role_grants_access() {
	let server = MockServer::start_async().await;

	mock_platform(&server).await;

	let _user = mock_user_info(&server, 200).await;
	let roles = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/v3/roles")
				.query_param("types", "space_developer")
				.query_param("space_guids", "space-1")
				.query_param("user_guids", "user-1")
				.header("authorization", "Bearer client-token");
			then.status(200).json_body(json!({
				"pagination": { "next": null },
				"resources": [{ "guid": "role-1", "type": "space_developer" }]
			}));
		})
		.await;
	let (client, _clock) = build_test_client(&server.base_url(), 0);
	let developer = client
		.is_user_space_developer(&CallContext::background(), "bearer user-token", &app_guid())
		.await
		.expect("Space developer check should succeed.");

	assert!(developer);

	roles.assert_calls_async(1).await;
}

#[tokio::test]
async fn missing_role_denies_access() {
	let server = MockServer::start_async().await;

	mock_platform(&server).await;

	let _user = mock_user_info(&server, 200).await;
	let _roles = server
		.mock_async(|when, then| {
			when.method(GET).path("/v3/roles");
			then.status(200).json_body(json!({ "pagination": { "next": null }, "resources": [] }));
		})
		.await;
	let (client, _clock) = build_test_client(&server.base_url(), 0);

	assert!(
		!client
			.is_user_space_developer(&CallContext::background(), "user-token", &app_guid())
			.await
			.expect("Space developer check should succeed.")
	);
}

#[tokio::test]
async fn rejected_user_token_denies_without_error() {
	let server = MockServer::start_async().await;

	mock_platform(&server).await;

	let _user = mock_user_info(&server, 401).await;
	let roles = server
		.mock_async(|when, then| {
			when.method(GET).path("/v3/roles");
			then.status(200).json_body(json!({ "resources": [] }));
		})
		.await;
	let (client, _clock) = build_test_client(&server.base_url(), 0);

	assert!(
		!client
			.is_user_space_developer(&CallContext::background(), "user-token", &app_guid())
			.await
			.expect("Unauthorized caller should be a denial.")
	);

	roles.assert_calls_async(0).await;
}

#[tokio::test]
async fn not_found_roles_deny_without_error() {
	let server = MockServer::start_async().await;

	mock_platform(&server).await;

	let _user = mock_user_info(&server, 200).await;
	let _roles = server
		.mock_async(|when, then| {
			when.method(GET).path("/v3/roles");
			then.status(404).json_body(json!({
				"errors": [{ "code": 10010, "title": "CF-ResourceNotFound", "detail": "Not found" }]
			}));
		})
		.await;
	let (client, _clock) = build_test_client(&server.base_url(), 0);

	assert!(
		!client
			.is_user_space_developer(&CallContext::background(), "user-token", &app_guid())
			.await
			.expect("Not-found roles should be a denial.")
	);
}

#[tokio::test]
async fn other_role_failures_propagate() {
	let server = MockServer::start_async().await;

	mock_platform(&server).await;

	let _user = mock_user_info(&server, 200).await;
	let _roles = server
		.mock_async(|when, then| {
			when.method(GET).path("/v3/roles");
			then.status(403).json_body(json!({
				"errors": [{ "code": 10003, "title": "CF-NotAuthorized", "detail": "Forbidden" }]
			}));
		})
		.await;
	let (client, _clock) = build_test_client(&server.base_url(), 0);
	let err = client
		.is_user_space_developer(&CallContext::background(), "user-token", &app_guid())
		.await
		.expect_err("Forbidden role lookup should propagate.");

	assert!(err.is_not_authorized());
}
