//! Generation Backend Router: ordered fallback chain with a never-failing stub.
//!
//! Algorithm:
//! 1. Try the requested backend, if it is registered.
//! 2. On any error or timeout, walk the remaining backends in priority order,
//!    skipping the one already tried. One attempt per backend, strictly sequential.
//! 3. Fall through to the local stub, which cannot fail.
//!
//! `generate` is therefore total: callers never see an "all backends exhausted" error.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{info, warn};

use crate::backends::local::{self, LocalStub};
use crate::backends::{BackendError, GenerationBackend, GenerationParams};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome", content = "detail")]
pub enum AttemptOutcome {
    Succeeded,
    Failed(String),
    TimedOut,
}

/// One backend attempt, kept for observability.
#[derive(Debug, Clone, Serialize)]
pub struct Attempt {
    pub backend: String,
    pub outcome: AttemptOutcome,
    pub elapsed_ms: u128,
}

#[derive(Debug, Clone)]
pub struct RoutedGeneration {
    pub text: String,
    /// Id of the backend whose text was returned.
    pub backend: String,
    pub attempts: Vec<Attempt>,
}

pub struct BackendRouter {
    /// Real backends in fixed priority order. The stub is not part of this list.
    backends: Vec<Arc<dyn GenerationBackend>>,
    stub: LocalStub,
    attempt_timeout: Duration,
}

impl BackendRouter {
    pub fn new(backends: Vec<Arc<dyn GenerationBackend>>, attempt_timeout: Duration) -> Self {
        Self {
            backends,
            stub: LocalStub,
            attempt_timeout,
        }
    }

    /// Every routable backend id in priority order, ending with the stub.
    pub fn backend_ids(&self) -> Vec<String> {
        self.backends
            .iter()
            .map(|b| b.id().to_string())
            .chain(std::iter::once(local::BACKEND_ID.to_string()))
            .collect()
    }

    /// Generates text, falling back through the chain. Never fails.
    pub async fn generate(
        &self,
        requested: Option<&str>,
        params: &GenerationParams<'_>,
    ) -> RoutedGeneration {
        let mut attempts = Vec::new();

        for backend in self.attempt_order(requested) {
            let started = Instant::now();
            let result = tokio::time::timeout(self.attempt_timeout, backend.generate(params)).await;
            let elapsed_ms = started.elapsed().as_millis();

            let outcome = match result {
                Ok(Ok(text)) => {
                    info!(
                        "Backend '{}' succeeded in {}ms ({} chars)",
                        backend.id(),
                        elapsed_ms,
                        text.len()
                    );
                    attempts.push(Attempt {
                        backend: backend.id().to_string(),
                        outcome: AttemptOutcome::Succeeded,
                        elapsed_ms,
                    });
                    return RoutedGeneration {
                        text,
                        backend: backend.id().to_string(),
                        attempts,
                    };
                }
                Ok(Err(e)) => {
                    warn!("Backend '{}' failed after {}ms: {e}", backend.id(), elapsed_ms);
                    AttemptOutcome::Failed(e.to_string())
                }
                Err(_) => {
                    let timeout = BackendError::Timeout(self.attempt_timeout.as_secs());
                    warn!("Backend '{}' failed: {timeout}", backend.id());
                    AttemptOutcome::TimedOut
                }
            };

            attempts.push(Attempt {
                backend: backend.id().to_string(),
                outcome,
                elapsed_ms,
            });
        }

        info!(
            "Falling back to local stub after {} failed attempt(s)",
            attempts.len()
        );
        attempts.push(Attempt {
            backend: local::BACKEND_ID.to_string(),
            outcome: AttemptOutcome::Succeeded,
            elapsed_ms: 0,
        });

        RoutedGeneration {
            text: self.stub.draft(params.user),
            backend: local::BACKEND_ID.to_string(),
            attempts,
        }
    }

    /// Requested backend first (if registered), then the rest in priority order.
    fn attempt_order(&self, requested: Option<&str>) -> Vec<&Arc<dyn GenerationBackend>> {
        let requested = match requested {
            Some(local::BACKEND_ID) => return Vec::new(),
            Some(id) => {
                let found = self.backends.iter().find(|b| b.id() == id);
                if found.is_none() {
                    warn!("Requested backend '{id}' is not registered; using priority order");
                }
                found
            }
            None => None,
        };

        let mut order = Vec::with_capacity(self.backends.len());
        if let Some(first) = requested {
            order.push(first);
        }
        order.extend(
            self.backends
                .iter()
                .filter(|b| requested.map_or(true, |r| r.id() != b.id())),
        );
        order
    }
}
