use std::sync::Arc;

use serde_json::Value as JsonValue;

use pdi_events::{EventBus, EventEnvelope, InMemoryEventBus};
use pdi_infra::{
    CatalogError, CatalogSource, EventSourcedInspectionStore, JsonFileCatalogSource,
    LoggingReportNotifier, NotifyPolicy, PdiConfig, ReportNotifier, SubmissionPipeline,
    builtin_catalog_source,
    command_dispatcher::CommandDispatcher,
    event_store::InMemoryEventStore,
    projections::{InspectionReportProjection, InspectionReportRow},
    read_model::InMemoryReadStore,
};
use pdi_inspection::{Catalog, InspectionId};

pub type Bus = InMemoryEventBus<EventEnvelope<JsonValue>>;
pub type Store = EventSourcedInspectionStore<Arc<InMemoryEventStore>, Arc<Bus>>;
pub type Pipeline = SubmissionPipeline<Arc<Store>, Arc<dyn ReportNotifier>>;
pub type ReportProjection = InspectionReportProjection<Arc<InMemoryReadStore<InspectionId, InspectionReportRow>>>;

/// Everything the handlers need, shared behind one `Arc`.
pub struct AppServices {
    pub catalog_source: Arc<dyn CatalogSource>,
    pub pipeline: Pipeline,
    pub reports: Arc<ReportProjection>,
}

impl AppServices {
    pub async fn catalog(&self) -> Result<Catalog, CatalogError> {
        pdi_infra::load_catalog(&*self.catalog_source).await
    }
}

/// Wire in-memory stores, the configured catalog source and the logging notifier.
pub fn build_services(config: &PdiConfig) -> Result<AppServices, CatalogError> {
    let catalog_source: Arc<dyn CatalogSource> = match &config.catalog_path {
        Some(path) => {
            tracing::info!(path = %path.display(), "serving catalog from file");
            Arc::new(JsonFileCatalogSource::new(path.clone()))
        }
        None => Arc::new(builtin_catalog_source()?),
    };

    Ok(build_services_with(
        catalog_source,
        Arc::new(LoggingReportNotifier),
        config.notify_policy,
    ))
}

/// Same wiring with injected catalog source and notifier (tests, embedding).
pub fn build_services_with(
    catalog_source: Arc<dyn CatalogSource>,
    notifier: Arc<dyn ReportNotifier>,
    policy: NotifyPolicy,
) -> AppServices {
    let event_store = Arc::new(InMemoryEventStore::new());
    let bus: Arc<Bus> = Arc::new(InMemoryEventBus::new());

    let report_store: Arc<InMemoryReadStore<InspectionId, InspectionReportRow>> =
        Arc::new(InMemoryReadStore::new());
    let reports: Arc<ReportProjection> = Arc::new(InspectionReportProjection::new(report_store));

    // Background subscriber: bus -> report projection
    {
        let sub = bus.subscribe();
        let reports = reports.clone();
        tokio::task::spawn_blocking(move || loop {
            match sub.recv() {
                Ok(env) => {
                    if let Err(e) = reports.apply_envelope(&env) {
                        tracing::warn!(
                            aggregate_id = %env.aggregate_id(),
                            sequence_number = env.sequence_number(),
                            error = %e,
                            "report projection rejected envelope"
                        );
                    }
                }
                Err(_) => break,
            }
        });
    }

    let dispatcher = CommandDispatcher::new(event_store, bus);
    let store = Arc::new(EventSourcedInspectionStore::new(dispatcher));
    let pipeline = SubmissionPipeline::new(store, notifier).with_policy(policy);

    AppServices {
        catalog_source,
        pipeline,
        reports,
    }
}
