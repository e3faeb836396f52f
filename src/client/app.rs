// self
use crate::{
	_prelude::*,
	client::PlatformClient,
	context::CallContext,
	error::ResultExt,
	model::{App, AppAndProcesses, AppGuid, Process, Processes, ScaleRequest, WEB_PROCESS_TYPE},
	obs::{self, Operation},
};

impl PlatformClient {
	/// Fetches `/v3/apps/{guid}`.
	pub async fn get_app(&self, ctx: &CallContext, guid: &AppGuid) -> Result<App> {
		obs::observe(Operation::GetApp, "get_app", async {
			let url = self.0.retriever.api_url(&format!("/v3/apps/{guid}"))?;

			self.0.retriever.get(ctx, url).await
		})
		.await
		.with_context(|| format!("Failed to get app {guid}."))
	}

	/// Lists every process of the app, optionally restricted to the given process types.
	pub async fn get_app_processes(
		&self,
		ctx: &CallContext,
		guid: &AppGuid,
		types: &[&str],
	) -> Result<Processes> {
		obs::observe(Operation::GetAppProcesses, "get_app_processes", async {
			let mut url = self.0.retriever.api_url(&format!("/v3/apps/{guid}/processes"))?;

			{
				let mut query = url.query_pairs_mut();

				query.append_pair("per_page", &self.per_page().to_string());

				if !types.is_empty() {
					query.append_pair("types", &types.join(","));
				}
			}

			self.0.retriever.get_all_pages::<Process>(ctx, url).await.map(Processes::from)
		})
		.await
		.with_context(|| format!("Failed to get processes of app {guid}."))
	}

	/// Fetches the app and its `web` processes concurrently.
	///
	/// Both sub-requests always run to completion. If either fails the combined call fails with
	/// a breadcrumb naming the failing half; the app failure is reported when both fail.
	pub async fn get_app_and_processes(
		&self,
		ctx: &CallContext,
		guid: &AppGuid,
	) -> Result<AppAndProcesses> {
		obs::observe(Operation::GetAppAndProcesses, "get_app_and_processes", async {
			let (app, processes) = tokio::join!(
				self.get_app(ctx, guid),
				self.get_app_processes(ctx, guid, &[WEB_PROCESS_TYPE]),
			);
			let app = app.context("Failed to get app state: app lookup failed.")?;
			let processes =
				processes.context("Failed to get app instances: process lookup failed.")?;

			Ok(AppAndProcesses { app, processes })
		})
		.await
	}

	/// Sets the instance count of the app's `web` process.
	pub async fn scale_app_web_process(
		&self,
		ctx: &CallContext,
		guid: &AppGuid,
		instances: u32,
	) -> Result<Process> {
		obs::observe(Operation::ScaleApp, "scale_app_web_process", async {
			let url = self
				.0
				.retriever
				.api_url(&format!("/v3/apps/{guid}/processes/{WEB_PROCESS_TYPE}/actions/scale"))?;

			tracing::info!(app = %guid, instances, "scaling web process");

			self.0.retriever.post(ctx, url, &ScaleRequest { instances }).await
		})
		.await
		.with_context(|| format!("Failed to scale app {guid} to {instances} instances."))
	}
}
