//! Coverage request pipeline
//!
//! validate -> compute (timed) -> persist with retry -> result
//!
//! The service holds no per-request state; concurrent requests share only the
//! store handle.

use crate::config::{ConfigError, ServiceConfig, StoreKind};
use crate::error::{FailureKind, ServiceError};
use chrono::Utc;
use gridsweep_core::{
    compute_coverage, validate_request, CoverageRequest, ExecutionResult, NewExecution,
    ValidationLimits,
};
use gridsweep_store::{
    ConflictSafePersister, ExecutionStore, InMemoryExecutionStore, JsonLinesExecutionStore,
    RetryPolicy,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Structured outcome returned to callers
///
/// Either a stored result or a classified failure, never both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ServiceResponse {
    Success {
        result: ExecutionResult,
    },
    Failure {
        kind: FailureKind,
        message: String,
    },
}

impl ServiceResponse {
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

impl From<Result<ExecutionResult, ServiceError>> for ServiceResponse {
    fn from(outcome: Result<ExecutionResult, ServiceError>) -> Self {
        match outcome {
            Ok(result) => Self::Success { result },
            Err(error) => Self::Failure {
                kind: error.kind(),
                message: error.user_message(),
            },
        }
    }
}

/// Runs coverage requests end to end
#[derive(Debug, Clone)]
pub struct CoverageService {
    persister: ConflictSafePersister<dyn ExecutionStore>,
    limits: ValidationLimits,
}

impl CoverageService {
    /// Create a service over `store`
    pub fn new(
        store: Arc<dyn ExecutionStore>,
        policy: RetryPolicy,
        limits: ValidationLimits,
    ) -> Self {
        Self {
            persister: ConflictSafePersister::new(store, policy),
            limits,
        }
    }

    /// Build the store and policy described by `config`
    ///
    /// # Errors
    /// `ConfigError::Invalid` for an inconsistent configuration.
    pub fn from_config(config: &ServiceConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let store: Arc<dyn ExecutionStore> = match (config.store.kind, &config.store.path) {
            (StoreKind::Memory, _) => Arc::new(InMemoryExecutionStore::new()),
            (StoreKind::JsonLines, Some(path)) => Arc::new(JsonLinesExecutionStore::new(path)),
            (StoreKind::JsonLines, None) => {
                return Err(ConfigError::Invalid(
                    "store.path is required for the json-lines store".to_string(),
                ))
            }
        };
        Ok(Self::new(store, config.retry_policy()?, config.limits))
    }

    /// The backing store
    pub fn store(&self) -> &Arc<dyn ExecutionStore> {
        self.persister.store()
    }

    /// Validate, compute and persist one request
    ///
    /// `duration_seconds` covers the coverage computation only.
    ///
    /// # Errors
    /// See [`ServiceError`]; the record is stored only when this returns `Ok`.
    #[tracing::instrument(name = "coverage_request", skip_all)]
    pub async fn execute(
        &self,
        request: &CoverageRequest,
        cancel: &CancellationToken,
    ) -> Result<ExecutionResult, ServiceError> {
        let validated = validate_request(request, &self.limits).map_err(|e| {
            tracing::info!(reason = %e, "request rejected");
            e
        })?;
        tracing::info!(
            start = %validated.start,
            commands = validated.commands.len(),
            "computing coverage"
        );

        let started = Instant::now();
        let coverage = compute_coverage(validated.start, &validated.commands).map_err(|e| {
            tracing::error!(error = %e, "coverage engine fault");
            e
        })?;
        let duration_seconds = started.elapsed().as_secs_f64();

        let execution = NewExecution {
            timestamp: Utc::now(),
            command_count: validated.commands.len() as u64,
            covered_cells: coverage.covered_cells,
            duration_seconds,
        };

        let stored = self.persister.persist(execution, cancel).await?;
        let result = ExecutionResult::from(stored);
        tracing::info!(
            id = %result.id,
            covered_cells = result.covered_cells,
            duration_seconds = result.duration_seconds,
            "request completed"
        );
        Ok(result)
    }

    /// [`Self::execute`] wrapped into a response envelope
    pub async fn respond(
        &self,
        request: &CoverageRequest,
        cancel: &CancellationToken,
    ) -> ServiceResponse {
        self.execute(request, cancel).await.into()
    }

    /// Every stored execution, oldest first
    ///
    /// # Errors
    /// `ServiceError::Storage` if the store cannot be read.
    pub async fn history(&self) -> Result<Vec<ExecutionResult>, ServiceError> {
        let rows = self.store().list().await.map_err(ServiceError::Storage)?;
        Ok(rows.into_iter().map(ExecutionResult::from).collect())
    }
}
