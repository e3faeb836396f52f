// self
use crate::{
	_prelude::*,
	client::PlatformClient,
	context::CallContext,
	error::ResultExt,
	lazy::Lazy,
	model::{ServiceInstance, ServiceInstanceGuid, ServicePlan, ServicePlanGuid},
	obs::{self, Operation},
	retriever::Retriever,
};

impl PlatformClient {
	/// Fetches `/v3/service_instances/{guid}`.
	pub async fn get_service_instance(
		&self,
		ctx: &CallContext,
		guid: &ServiceInstanceGuid,
	) -> Result<ServiceInstance> {
		obs::observe(Operation::GetServiceInstance, "get_service_instance", async {
			let url = self.0.retriever.api_url(&format!("/v3/service_instances/{guid}"))?;

			self.0.retriever.get(ctx, url).await
		})
		.await
		.with_context(|| format!("Failed to get service instance {guid}."))
	}

	/// Fetches `/v3/service_plans/{guid}`.
	pub async fn get_service_plan(
		&self,
		ctx: &CallContext,
		guid: &ServicePlanGuid,
	) -> Result<ServicePlan> {
		fetch_service_plan(&self.0.retriever, ctx, guid).await
	}

	/// Translates a plan GUID to its broker catalog id, caching each successful lookup.
	pub async fn get_broker_catalog_plan_id(
		&self,
		ctx: &CallContext,
		guid: &ServicePlanGuid,
	) -> Result<String> {
		self.0.plans.catalog_id(ctx, guid).await
	}

	/// Shared plan translation cache.
	pub fn service_plan_cache(&self) -> &ServicePlanCache {
		&self.0.plans
	}
}

/// Memoized translation of service plan GUIDs to broker catalog plan ids.
///
/// Each GUID gets its own [`Lazy`], so concurrent lookups of one plan share a single request
/// while different plans resolve independently. Failed lookups are not remembered.
#[derive(Clone, Debug)]
pub struct ServicePlanCache {
	retriever: Retriever,
	entries: Arc<Mutex<HashMap<ServicePlanGuid, Lazy<String>>>>,
}
impl ServicePlanCache {
	/// Creates an empty cache fetching through `retriever`.
	pub fn new(retriever: Retriever) -> Self {
		Self { retriever, entries: Default::default() }
	}

	/// Returns the broker catalog id of plan `guid`.
	pub async fn catalog_id(&self, ctx: &CallContext, guid: &ServicePlanGuid) -> Result<String> {
		let entry = self
			.entries
			.lock()
			.entry(guid.clone())
			.or_insert_with(|| {
				let retriever = self.retriever.clone();
				let guid = guid.clone();

				Lazy::new(move || {
					let retriever = retriever.clone();
					let guid = guid.clone();

					async move {
						let ctx = CallContext::background();
						let plan = fetch_service_plan(&retriever, &ctx, &guid).await?;

						Ok(plan.broker_catalog.id)
					}
				})
			})
			.clone();
		let result = ctx.run(entry.get()).await;

		if result.is_err() {
			let mut entries = self.entries.lock();

			// Another caller may have succeeded through the same entry meanwhile.
			if entries.get(guid).is_some_and(|lazy| lazy.peek().is_none()) {
				entries.remove(guid);
			}
		}

		result
	}

	/// Cached catalog id of `guid`, without fetching.
	pub fn peek(&self, guid: &ServicePlanGuid) -> Option<String> {
		self.entries.lock().get(guid).and_then(Lazy::peek)
	}

	/// Number of plans currently tracked.
	pub fn len(&self) -> usize {
		self.entries.lock().len()
	}

	/// Whether no plan is tracked.
	pub fn is_empty(&self) -> bool {
		self.entries.lock().is_empty()
	}

	/// Forgets every cached translation.
	pub fn clear(&self) {
		self.entries.lock().clear();
	}
}

async fn fetch_service_plan(
	retriever: &Retriever,
	ctx: &CallContext,
	guid: &ServicePlanGuid,
) -> Result<ServicePlan> {
	obs::observe(Operation::GetServicePlan, "get_service_plan", async {
		let url = retriever.api_url(&format!("/v3/service_plans/{guid}"))?;

		retriever.get(ctx, url).await
	})
	.await
	.with_context(|| format!("Failed to get service plan {guid}."))
}
