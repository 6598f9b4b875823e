//! Centralized logging infrastructure
//!
//! Provides structured logging with:
//! - Trace IDs for request correlation
//! - Single entry/exit lines per request
//! - Redaction of credential-bearing headers and bodies

mod trace_context;

pub use trace_context::{RequestSpan, TraceContext};
