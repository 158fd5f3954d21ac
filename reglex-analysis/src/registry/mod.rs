//! Analysis session registry
//!
//! Owns the session table. Sessions are created by [`AnalysisRegistry::start_analysis`],
//! advanced only by their own background task through `update_session`, and read
//! by any number of observers.
//!
//! **Fan-out:** every applied update is queued on its session's outbox under the
//! table lock, so the queue is in revision order. One caller at a time drains
//! the outbox and invokes observers outside the table lock, in registration
//! order. Concurrent writers to one session (the task and a late upload-progress
//! callback) therefore never reorder or skip snapshots for existing observers.
//! Each observer also carries the revision it last saw, so the replay on
//! subscribe and a queued older snapshot never reach it out of order.

mod orchestrator;
mod sweeper;

pub use sweeper::spawn_session_sweeper;

use chrono::Utc;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use crate::models::{
    AnalysisSession, DocumentFile, SessionError, SessionId, SessionUpdate, ValidatedDocument,
};
use crate::services::{
    DocumentTransport, EnrichmentPipeline, FallbackSynthesizer, HealthCheck, RequestExecutor,
    RetryPolicy,
};
use crate::validation::{self, ValidationError, MAX_FILE_SIZE_BYTES};

type Observer = dyn Fn(&AnalysisSession) + Send + Sync;

/// Collaborators used by the background task
#[derive(Clone)]
pub struct AnalysisServices {
    pub executor: RequestExecutor,
    pub transport: Arc<dyn DocumentTransport>,
    pub synthesizer: FallbackSynthesizer,
    pub enrichment: EnrichmentPipeline,
    pub max_file_size: u64,
}

impl AnalysisServices {
    pub fn new(
        health: Arc<dyn HealthCheck>,
        transport: Arc<dyn DocumentTransport>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            executor: RequestExecutor::new(health, policy),
            transport,
            synthesizer: FallbackSynthesizer::new(),
            enrichment: EnrichmentPipeline::new(),
            max_file_size: MAX_FILE_SIZE_BYTES,
        }
    }

    pub fn with_synthesizer(mut self, synthesizer: FallbackSynthesizer) -> Self {
        self.synthesizer = synthesizer;
        self
    }

    pub fn with_max_file_size(mut self, max_file_size: u64) -> Self {
        self.max_file_size = max_file_size;
        self
    }
}

struct Subscriber {
    id: u64,
    callback: Box<Observer>,
    /// Revision of the last snapshot handed to `callback`
    delivered: Mutex<Option<u64>>,
}

impl Subscriber {
    fn deliver(&self, snapshot: &AnalysisSession) {
        let mut delivered = self.delivered.lock().unwrap_or_else(PoisonError::into_inner);
        if matches!(*delivered, Some(rev) if rev >= snapshot.revision) {
            return;
        }
        (self.callback)(snapshot);
        *delivered = Some(snapshot.revision);
    }
}

struct SessionEntry {
    session: AnalysisSession,
    subscribers: Vec<Arc<Subscriber>>,
    /// Snapshots applied but not yet delivered, oldest first
    outbox: VecDeque<AnalysisSession>,
    /// Held by whoever is draining `outbox`
    delivery: Arc<Mutex<()>>,
}

impl SessionEntry {
    fn new(session: AnalysisSession) -> Self {
        Self {
            session,
            subscribers: Vec::new(),
            outbox: VecDeque::new(),
            delivery: Arc::new(Mutex::new(())),
        }
    }
}

struct RegistryInner {
    sessions: Mutex<HashMap<SessionId, SessionEntry>>,
    next_subscriber_id: AtomicU64,
    services: AnalysisServices,
}

impl RegistryInner {
    fn table(&self) -> std::sync::MutexGuard<'_, HashMap<SessionId, SessionEntry>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn remove_subscriber(&self, session_id: SessionId, subscriber_id: u64) -> bool {
        let mut table = self.table();
        match table.get_mut(&session_id) {
            Some(entry) => {
                let before = entry.subscribers.len();
                entry.subscribers.retain(|s| s.id != subscriber_id);
                entry.subscribers.len() != before
            }
            None => false,
        }
    }
}

/// Shared handle to the session table
#[derive(Clone)]
pub struct AnalysisRegistry {
    inner: Arc<RegistryInner>,
}

impl AnalysisRegistry {
    pub fn new(services: AnalysisServices) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                sessions: Mutex::new(HashMap::new()),
                next_subscriber_id: AtomicU64::new(1),
                services,
            }),
        }
    }

    pub fn services(&self) -> &AnalysisServices {
        &self.inner.services
    }

    /// Validate the request, create a session and launch its background task
    ///
    /// Validation failures return before any session exists. Must be called
    /// from within a Tokio runtime.
    pub fn start_analysis(
        &self,
        file: DocumentFile,
        language: &str,
    ) -> Result<SessionId, ValidationError> {
        let document =
            validation::validate_request(&file, language, self.inner.services.max_file_size)
                .map_err(|e| {
                    tracing::info!(
                        file_name = ?file.name,
                        size = file.size(),
                        error = %e,
                        "Analysis request rejected"
                    );
                    e
                })?;

        let session_id = self.create_session(&document);

        tokio::spawn(orchestrator::run_analysis(
            self.clone(),
            session_id,
            document,
        ));

        Ok(session_id)
    }

    fn create_session(&self, document: &ValidatedDocument) -> SessionId {
        let session = AnalysisSession::new(document.file_name.clone(), document.size());
        let session_id = session.id;

        tracing::info!(
            session_id = %session_id,
            file_name = %document.file_name,
            size = document.size(),
            language = %document.language,
            "Analysis session created"
        );

        self.inner
            .table()
            .insert(session_id, SessionEntry::new(session));
        session_id
    }

    /// Register an observer; the current snapshot is replayed to it immediately
    ///
    /// Returns `None` for an unknown session.
    pub fn subscribe<F>(&self, session_id: SessionId, callback: F) -> Option<Subscription>
    where
        F: Fn(&AnalysisSession) + Send + Sync + 'static,
    {
        let subscriber = Arc::new(Subscriber {
            id: self.inner.next_subscriber_id.fetch_add(1, Ordering::Relaxed),
            callback: Box::new(callback),
            delivered: Mutex::new(None),
        });

        let snapshot = {
            let mut table = self.inner.table();
            let entry = table.get_mut(&session_id)?;
            entry.subscribers.push(subscriber.clone());
            entry.session.clone()
        };

        tracing::debug!(
            session_id = %session_id,
            subscriber_id = subscriber.id,
            "Observer subscribed"
        );
        subscriber.deliver(&snapshot);

        Some(Subscription {
            registry: Arc::downgrade(&self.inner),
            session_id,
            subscriber_id: subscriber.id,
        })
    }

    /// Point-in-time snapshot
    pub fn get_session(&self, session_id: SessionId) -> Option<AnalysisSession> {
        self.inner
            .table()
            .get(&session_id)
            .map(|entry| entry.session.clone())
    }

    pub fn session_count(&self) -> usize {
        self.inner.table().len()
    }

    /// Remove sessions (and their observers) whose age since creation is at
    /// least `max_age`, whatever their status. Returns the number removed.
    pub fn cleanup(&self, max_age: Duration) -> usize {
        let now = Utc::now();
        let mut table = self.inner.table();
        let before = table.len();

        table.retain(|_, entry| {
            let age = entry.session.age(now).to_std().unwrap_or_default();
            age < max_age
        });

        let removed = before - table.len();
        if removed > 0 {
            tracing::info!(
                removed,
                remaining = table.len(),
                max_age_secs = max_age.as_secs(),
                "Expired analysis sessions removed"
            );
        }
        removed
    }

    /// Single mutation entry point: merge `update`, then notify observers in
    /// registration order
    pub(crate) fn update_session(
        &self,
        session_id: SessionId,
        update: SessionUpdate,
    ) -> Result<AnalysisSession, SessionError> {
        let (snapshot, delivery) = {
            let mut table = self.inner.table();
            let entry = table
                .get_mut(&session_id)
                .ok_or(SessionError::NotFound(session_id))?;
            entry.session.apply(update)?;
            entry.outbox.push_back(entry.session.clone());
            (entry.session.clone(), entry.delivery.clone())
        };

        tracing::trace!(
            session_id = %session_id,
            status = ?snapshot.status,
            progress = snapshot.progress,
            revision = snapshot.revision,
            "Session updated"
        );

        self.drain_outbox(session_id, &delivery);
        Ok(snapshot)
    }

    /// Deliver queued snapshots in revision order
    ///
    /// A caller that finds the outbox already drained by the previous holder
    /// of `delivery` returns without invoking anything.
    fn drain_outbox(&self, session_id: SessionId, delivery: &Mutex<()>) {
        let _turn = delivery.lock().unwrap_or_else(PoisonError::into_inner);
        loop {
            let next = {
                let mut table = self.inner.table();
                table.get_mut(&session_id).and_then(|entry| {
                    entry
                        .outbox
                        .pop_front()
                        .map(|snapshot| (snapshot, entry.subscribers.clone()))
                })
            };
            let Some((snapshot, subscribers)) = next else {
                break;
            };
            for subscriber in &subscribers {
                subscriber.deliver(&snapshot);
            }
        }
    }
}

/// Observer registration; dropping it removes the observer
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    registry: Weak<RegistryInner>,
    session_id: SessionId,
    subscriber_id: u64,
}

impl Subscription {
    /// Remove the observer now
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.registry.upgrade() {
            if inner.remove_subscriber(self.session_id, self.subscriber_id) {
                tracing::debug!(
                    session_id = %self.session_id,
                    subscriber_id = self.subscriber_id,
                    "Observer unsubscribed"
                );
            }
        }
    }
}
