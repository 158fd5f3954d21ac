//! HTTP API handlers for reglex-analysis
//!
//! REST for starting and reading sessions, SSE for live progress.

pub mod analyses;
pub mod health;
pub mod sse;

pub use analyses::analysis_routes;
pub use health::health_routes;
pub use sse::analysis_event_stream;
