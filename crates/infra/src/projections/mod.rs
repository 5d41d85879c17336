//! Projections: read models rebuilt from the event stream.
//!
//! Projections are idempotent under at-least-once delivery and can be rebuilt
//! from scratch by replaying envelopes.

pub mod inspection_reports;

pub use inspection_reports::{
    InspectionReportProjection, InspectionReportProjectionError, InspectionReportRow,
};
