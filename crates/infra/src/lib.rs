//! Infrastructure layer: catalog sources, event store, persistence, notification
//! and configuration for the inspection service.

pub mod catalog_source;
pub mod command_dispatcher;
pub mod config;
pub mod event_store;
pub mod inspection_store;
pub mod notifier;
pub mod projections;
pub mod read_model;
pub mod submission;

pub use catalog_source::{
    CatalogError, CatalogSource, JsonFileCatalogSource, StaticCatalogSource, builtin_catalog_source,
    load_catalog,
};
pub use config::{ConfigError, PdiConfig};
pub use inspection_store::{EventSourcedInspectionStore, InspectionStore, InspectionStoreError};
pub use notifier::{
    LoggingReportNotifier, NotifyError, RecordingReportNotifier, ReportNotifier, ReportReady,
    SubmissionMode,
};
pub use submission::{NotifyPolicy, SubmissionError, SubmissionPipeline, SubmissionReceipt};
