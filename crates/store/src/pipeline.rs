//! The idempotent mutation protocol.
//!
//! Every externally-triggered write goes through `MutationPipeline`:
//! verify the key, run the pre-commit hook chain, execute the atomic
//! mutation under a transient-only retry policy, and resolve insertion
//! races by re-verifying. Only `Conflict` (as a replay), `NotFound`,
//! `Validation` and exhausted-retry `Fatal` errors cross this boundary.

use std::sync::Arc;

use serde_json::Value as JsonValue;
use tracing::{debug, error};

use roost_core::{CoreError, IdempotencyKey};
use roost_reliability::RetryPolicy;

use crate::error::StoreError;
use crate::steps::MutationStep;
use crate::store::MutationStore;

/// Ordered validation/normalization function applied to each written
/// document before the transaction opens.
///
/// Replaces implicit pre-save hooks: the chain is explicit, ordered, and
/// runs exactly once per request, with no triggering on field-dirtiness
/// checks.
pub type PreCommitHook = Arc<dyn Fn(&mut JsonValue) -> Result<(), CoreError> + Send + Sync>;

/// A mutation plus the response to record for replay.
pub struct MutationRequest {
    response: Option<JsonValue>,
    steps: Vec<MutationStep>,
    hooks: Vec<PreCommitHook>,
}

impl MutationRequest {
    pub fn new(steps: Vec<MutationStep>) -> Self {
        Self {
            response: None,
            steps,
            hooks: Vec::new(),
        }
    }

    /// Record `response` in the ledger for replay on duplicate delivery.
    pub fn with_response(mut self, response: JsonValue) -> Self {
        self.response = Some(response);
        self
    }

    /// Append a pre-commit hook; hooks run in the order they were added.
    pub fn with_hook(mut self, hook: PreCommitHook) -> Self {
        self.hooks.push(hook);
        self
    }
}

/// How a mutation resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum MutationOutcome {
    /// The mutation ran and committed.
    Applied(Option<JsonValue>),
    /// The key was already processed; the recorded response is returned and
    /// no new side effect happened.
    Replayed(Option<JsonValue>),
}

impl MutationOutcome {
    pub fn response(&self) -> Option<&JsonValue> {
        match self {
            Self::Applied(r) | Self::Replayed(r) => r.as_ref(),
        }
    }

    pub fn was_replayed(&self) -> bool {
        matches!(self, Self::Replayed(_))
    }
}

/// Front door for deduplicated writes.
pub struct MutationPipeline<S> {
    store: S,
    policy: RetryPolicy,
}

impl<S: MutationStore> MutationPipeline<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            policy: RetryPolicy::exponential(),
        }
    }

    /// Override the transient-retry policy for this pipeline.
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Execute a mutation at most once for `key`.
    pub async fn execute(
        &self,
        key: &IdempotencyKey,
        mut request: MutationRequest,
    ) -> Result<MutationOutcome, CoreError> {
        if let Some(record) = self.store.verify(key).await? {
            debug!(%key, "duplicate delivery, replaying recorded response");
            return Ok(MutationOutcome::Replayed(record.response));
        }

        for hook in &request.hooks {
            for step in &mut request.steps {
                if let Some(document) = step.document_mut() {
                    hook(document)?;
                }
            }
        }

        let result = self
            .policy
            .run_if(
                || {
                    self.store
                        .execute(key, request.response.clone(), request.steps.clone())
                },
                StoreError::is_transient,
            )
            .await;

        match result {
            Ok(()) => Ok(MutationOutcome::Applied(request.response)),
            Err(StoreError::Conflict(msg)) => {
                // Lost an insertion race: a concurrent duplicate committed
                // between our verify and execute. Fall back to replay.
                debug!(%key, "insertion race lost, re-verifying");
                match self.store.verify(key).await? {
                    Some(record) => Ok(MutationOutcome::Replayed(record.response)),
                    None => Err(CoreError::Conflict(msg)),
                }
            }
            Err(StoreError::Transient(msg)) => {
                error!(%key, error = %msg, "retries exhausted, escalating to fatal");
                Err(CoreError::fatal(msg))
            }
            Err(other) => Err(other.into()),
        }
    }
}
