// crates.io
use httpmock::prelude::*;
use serde_json::{Value, json};
// self
use control_plane_client::{
	_preludet::*,
	context::CallContext,
	model::{AppGuid, ServiceInstanceGuid, ServicePlanGuid},
};

async fn mock_root(server: &MockServer) -> httpmock::Mock<'_> {
	let root = json!({
		"links": {
			"cloud_controller_v3": { "href": server.url("/v3") },
			"uaa": { "href": server.url("/uaa") },
			"login": { "href": server.url("/login") },
		}
	});

	server
		.mock_async(|when, then| {
			when.method(GET).path("/");
			then.status(200).json_body(root);
		})
		.await
}

async fn mock_grant(server: &MockServer) -> httpmock::Mock<'_> {
	server
		.mock_async(|when, then| {
			when.method(POST).path("/uaa/oauth/token");
			then.status(200).json_body(json!({
				"access_token": "token-1",
				"token_type": "bearer",
				"expires_in": 12_000,
			}));
		})
		.await
}

fn app_body(guid: &str) -> Value {
	json!({
		"guid": guid,
		"name": "autoscaled-app",
		"state": "STARTED",
		"created_at": "2025-01-01T10:00:00Z",
		"updated_at": "2025-01-02T10:00:00Z",
		"relationships": { "space": { "data": { "guid": "space-1" } } },
		"metadata": {
			"labels": { "app-autoscaler.cloudfoundry.org/disable-autoscaling": "true" },
			"annotations": {}
		}
	})
}

fn not_found_body() -> Value {
	json!({ "errors": [{ "code": 10010, "title": "CF-ResourceNotFound", "detail": "App not found" }] })
}

fn app_guid() -> AppGuid {
	AppGuid::new("app-1").expect("App GUID fixture should be valid.")
}

#[tokio::test]
async fn get_app_sends_bearer_and_user_agent() {
	let server = MockServer::start_async().await;
	let _root = mock_root(&server).await;
	let _grant = mock_grant(&server).await;
	let user_agent = format!("control-plane-client/{}", env!("CARGO_PKG_VERSION"));
	let app = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/v3/apps/app-1")
				.header("authorization", "Bearer token-1")
				.header("user-agent", user_agent.as_str());
			then.status(200).json_body(app_body("app-1"));
		})
		.await;
	let (client, _clock) = build_test_client(&server.base_url(), 0);
	let app_state = client
		.get_app(&CallContext::background(), &app_guid())
		.await
		.expect("App lookup should succeed.");

	assert_eq!(app_state.guid.as_ref(), "app-1");
	assert_eq!(app_state.space_guid().as_ref(), "space-1");
	assert!(app_state.autoscaling_disabled());

	app.assert_calls_async(1).await;
}

#[tokio::test]
async fn missing_app_is_classified_as_not_found() {
	let server = MockServer::start_async().await;
	let _root = mock_root(&server).await;
	let _grant = mock_grant(&server).await;
	let _app = server
		.mock_async(|when, then| {
			when.method(GET).path("/v3/apps/app-1");
			then.status(404).json_body(not_found_body());
		})
		.await;
	let (client, _clock) = build_test_client(&server.base_url(), 0);
	let err = client
		.get_app(&CallContext::background(), &app_guid())
		.await
		.expect_err("Missing app should fail.");

	assert!(err.is_not_found());
	assert!(!err.is_not_authorized());

	let platform = err.platform().expect("Structured platform error should be reachable.");

	assert_eq!(platform.status, 404);
	assert_eq!(platform.resource_id, "/v3/apps/app-1");
	assert!(err.to_string().contains("app-1"));
}

#[tokio::test]
async fn fan_out_returns_app_and_web_processes() {
	let server = MockServer::start_async().await;
	let _root = mock_root(&server).await;
	let _grant = mock_grant(&server).await;
	let app = server
		.mock_async(|when, then| {
			when.method(GET).path("/v3/apps/app-1");
			then.status(200).json_body(app_body("app-1"));
		})
		.await;
	let processes = server
		.mock_async(|when, then| {
			when.method(GET).path("/v3/apps/app-1/processes").query_param("types", "web");
			then.status(200).json_body(json!({
				"pagination": { "next": null },
				"resources": [{ "guid": "p1", "type": "web", "instances": 3 }]
			}));
		})
		.await;
	let (client, _clock) = build_test_client(&server.base_url(), 0);
	let both = client
		.get_app_and_processes(&CallContext::background(), &app_guid())
		.await
		.expect("Fan-out should succeed.");

	assert_eq!(both.app.name, "autoscaled-app");
	assert_eq!(both.processes.total_instances(), 3);

	app.assert_calls_async(1).await;
	processes.assert_calls_async(1).await;
}

#[tokio::test]
async fn fan_out_reports_the_failing_half_after_both_finish() {
	let server = MockServer::start_async().await;
	let _root = mock_root(&server).await;
	let _grant = mock_grant(&server).await;
	let app = server
		.mock_async(|when, then| {
			when.method(GET).path("/v3/apps/app-1");
			then.status(200).json_body(app_body("app-1"));
		})
		.await;
	let processes = server
		.mock_async(|when, then| {
			when.method(GET).path("/v3/apps/app-1/processes");
			then.status(404).json_body(not_found_body());
		})
		.await;
	let (client, _clock) = build_test_client(&server.base_url(), 0);
	let err = client
		.get_app_and_processes(&CallContext::background(), &app_guid())
		.await
		.expect_err("Process failure should fail the fan-out.");

	assert_eq!(err.to_string(), "Failed to get app instances: process lookup failed.");
	assert!(err.is_not_found());

	app.assert_calls_async(1).await;
	processes.assert_calls_async(1).await;
}

#[tokio::test]
async fn scale_posts_the_instance_count() {
	let server = MockServer::start_async().await;
	let _root = mock_root(&server).await;
	let _grant = mock_grant(&server).await;
	let scale = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/v3/apps/app-1/processes/web/actions/scale")
				.header("content-type", "application/json")
				.json_body(json!({ "instances": 4 }));
			then.status(202).json_body(json!({ "guid": "p1", "type": "web", "instances": 4 }));
		})
		.await;
	let (client, _clock) = build_test_client(&server.base_url(), 0);
	let process = client
		.scale_app_web_process(&CallContext::background(), &app_guid(), 4)
		.await
		.expect("Scaling should succeed.");

	assert_eq!(process.instances, 4);
	assert_eq!(process.kind, "web");

	scale.assert_calls_async(1).await;
}

#[tokio::test]
async fn endpoints_are_discovered_once_until_invalidated() {
	let server = MockServer::start_async().await;
	let root = mock_root(&server).await;
	let (client, _clock) = build_test_client(&server.base_url(), 0);
	let ctx = CallContext::background();
	let (first, second) = tokio::join!(client.get_endpoints(&ctx), client.get_endpoints(&ctx));
	let first = first.expect("Discovery should succeed.");

	assert_eq!(first, second.expect("Concurrent discovery should share the result."));
	assert_eq!(
		first.token_url().expect("Token URL should derive from the uaa link.").as_str(),
		server.url("/uaa/oauth/token")
	);

	root.assert_calls_async(1).await;

	client.invalidate_endpoints();
	client.get_endpoints(&ctx).await.expect("Rediscovery should succeed.");

	root.assert_calls_async(2).await;
}

#[tokio::test]
async fn plan_translation_is_cached_per_guid() {
	let server = MockServer::start_async().await;
	let _root = mock_root(&server).await;
	let _grant = mock_grant(&server).await;
	let instance = server
		.mock_async(|when, then| {
			when.method(GET).path("/v3/service_instances/si-1");
			then.status(200).json_body(json!({
				"guid": "si-1",
				"name": "autoscaler",
				"type": "managed",
				"relationships": { "service_plan": { "data": { "guid": "plan-1" } } }
			}));
		})
		.await;
	let plan = server
		.mock_async(|when, then| {
			when.method(GET).path("/v3/service_plans/plan-1");
			then.status(200).json_body(json!({
				"guid": "plan-1",
				"name": "standard",
				"broker_catalog": { "id": "catalog-plan-1" }
			}));
		})
		.await;
	let (client, _clock) = build_test_client(&server.base_url(), 0);
	let ctx = CallContext::background();
	let instance_guid =
		ServiceInstanceGuid::new("si-1").expect("Service instance GUID fixture should be valid.");
	let service_instance = client
		.get_service_instance(&ctx, &instance_guid)
		.await
		.expect("Service instance lookup should succeed.");
	let plan_guid = service_instance.plan_guid().clone();

	assert_eq!(plan_guid, ServicePlanGuid::new("plan-1").expect("Plan GUID should be valid."));
	assert!(client.service_plan_cache().peek(&plan_guid).is_none());

	for _ in 0..3 {
		assert_eq!(
			client
				.get_broker_catalog_plan_id(&ctx, &plan_guid)
				.await
				.expect("Plan translation should succeed."),
			"catalog-plan-1"
		);
	}

	assert_eq!(client.service_plan_cache().peek(&plan_guid).as_deref(), Some("catalog-plan-1"));

	instance.assert_calls_async(1).await;
	plan.assert_calls_async(1).await;

	client.service_plan_cache().clear();
	client.get_broker_catalog_plan_id(&ctx, &plan_guid).await.expect("Refetch should succeed.");

	plan.assert_calls_async(2).await;
}

#[tokio::test]
async fn failed_plan_translations_are_not_tracked() {
	let server = MockServer::start_async().await;
	let _root = mock_root(&server).await;
	let _grant = mock_grant(&server).await;
	let _missing = server
		.mock_async(|when, then| {
			when.method(GET).path_includes("/v3/service_plans/missing-");
			then.status(404).json_body(not_found_body());
		})
		.await;
	let _plan = server
		.mock_async(|when, then| {
			when.method(GET).path("/v3/service_plans/plan-1");
			then.status(200).json_body(json!({
				"guid": "plan-1",
				"broker_catalog": { "id": "catalog-plan-1" }
			}));
		})
		.await;
	let (client, _clock) = build_test_client(&server.base_url(), 0);
	let ctx = CallContext::background();

	for n in 0..5 {
		let guid =
			ServicePlanGuid::new(format!("missing-{n}")).expect("Plan GUID should be valid.");
		let err = client
			.get_broker_catalog_plan_id(&ctx, &guid)
			.await
			.expect_err("Missing plan should fail.");

		assert!(err.is_not_found());
	}

	assert!(client.service_plan_cache().is_empty());

	let plan_guid = ServicePlanGuid::new("plan-1").expect("Plan GUID should be valid.");

	client.get_broker_catalog_plan_id(&ctx, &plan_guid).await.expect("Lookup should succeed.");

	assert_eq!(client.service_plan_cache().len(), 1);
}
