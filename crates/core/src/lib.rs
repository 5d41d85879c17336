//! `pdi-core`: domain foundation building blocks for the inspection engine.
//!
//! Pure domain primitives only: identifiers, the domain error model and the
//! aggregate contract. No IO, no storage, no async.

pub mod aggregate;
pub mod error;
pub mod id;

pub use aggregate::{Aggregate, AggregateRoot, ExpectedVersion};
pub use error::{DomainError, DomainResult};
pub use id::{AggregateId, MarkerId, UserId};
