//! HTTP API for the inspection service: router, handlers and wiring.

pub mod app;
