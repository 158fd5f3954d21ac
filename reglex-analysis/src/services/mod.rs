//! Service modules for the document analysis pipeline
//!
//! Leaves first: health monitor, executor, transport, synthesizer, enrichment.

pub mod enrichment;
pub mod fallback_synthesizer;
pub mod health_monitor;
pub mod request_executor;
pub mod upload_transport;

pub use enrichment::{EnrichmentError, EnrichmentPipeline};
pub use fallback_synthesizer::FallbackSynthesizer;
pub use health_monitor::{ConnectionHealthMonitor, HealthCheck};
pub use request_executor::{ExecutorError, RequestExecutor, RetryPolicy, MAX_BACKOFF_DELAY};
pub use upload_transport::{DocumentTransport, HttpUploadTransport, ProgressCallback, TransportError};
