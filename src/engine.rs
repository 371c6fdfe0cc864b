//! The call engine: parse, validate, sanitize, execute, report.
//!
//! `CallEngine` is an explicitly constructed object, not a global: tests and
//! hosts can run any number of independent instances, each with its own
//! registry and limits.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info};

use crate::executor;
use crate::parser::parse_call;
use crate::registry::ModuleRegistry;
use crate::sanitize::{sanitize_args, SanitizeLimits};
use crate::sandbox::ExecutionLimits;
use crate::types::{EngineError, ExecutionResult, ModuleListing};
use crate::validate::validate_call;

/// Cap on the call string handed to the history sink, in characters
pub const HISTORY_CALL_MAX: usize = 2_000;
/// Cap on the outcome text handed to the history sink, in characters
pub const HISTORY_OUTCOME_MAX: usize = 10_000;

/// Receives `(call string, outcome text)` after every execution attempt,
/// success or not. Implemented by the external persistence layer.
pub trait HistorySink: Send + Sync {
    fn record(&self, call: &str, outcome: &str);
}

/// Executes textual calls against the module registry
pub struct CallEngine {
    registry: Arc<ModuleRegistry>,
    limits: ExecutionLimits,
    sanitize_limits: SanitizeLimits,
    history: Option<Arc<dyn HistorySink>>,
}

impl CallEngine {
    /// Create an engine over a registry with default limits
    pub fn new(registry: Arc<ModuleRegistry>) -> Self {
        Self {
            registry,
            limits: ExecutionLimits::default(),
            sanitize_limits: SanitizeLimits::default(),
            history: None,
        }
    }

    /// Builder: set the execution limits
    pub fn with_limits(mut self, limits: ExecutionLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Builder: set the sanitizer limits
    pub fn with_sanitize_limits(mut self, limits: SanitizeLimits) -> Self {
        self.sanitize_limits = limits;
        self
    }

    /// Builder: attach a history sink
    pub fn with_history_sink(mut self, sink: Arc<dyn HistorySink>) -> Self {
        self.history = Some(sink);
        self
    }

    /// The registry this engine reads from
    pub fn registry(&self) -> &Arc<ModuleRegistry> {
        &self.registry
    }

    /// Execute one call string to completion. Never panics and never
    /// returns an unhandled error: every failure mode collapses to a
    /// `Failure` outcome with a boundary-safe message.
    pub async fn execute_call(&self, call: &str) -> ExecutionResult {
        let started = Instant::now();
        let outcome = self.run(call).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        let result = match outcome {
            Ok(output) => {
                info!(duration_ms, "call succeeded");
                ExecutionResult::Success { result: output }
            }
            Err(err) => {
                match &err {
                    EngineError::Runtime(_) | EngineError::Load { .. } => {
                        // full detail stays on this side of the boundary
                        error!(duration_ms, detail = %err, "call failed");
                    }
                    other => debug!(duration_ms, error = %other, "call rejected"),
                }
                ExecutionResult::Failure {
                    error: err.public_message(),
                }
            }
        };

        if let Some(sink) = &self.history {
            sink.record(
                &truncate_chars(call, HISTORY_CALL_MAX),
                &truncate_chars(result.text(), HISTORY_OUTCOME_MAX),
            );
        }

        result
    }

    async fn run(&self, call: &str) -> Result<String, EngineError> {
        let parsed = parse_call(call)?;
        let modules = self.registry.modules(false).await;
        let callable = validate_call(&modules, &parsed.module, &parsed.function, &parsed.args)?;
        let args = sanitize_args(&parsed.args, &self.sanitize_limits);
        executor::execute(&callable, &args, &self.limits).await
    }

    /// Per-module signature listing for the transport layer, sorted by name
    pub async fn list_modules(&self, force_refresh: bool) -> Vec<ModuleListing> {
        let modules = self.registry.modules(force_refresh).await;
        let mut listing: Vec<ModuleListing> = modules
            .values()
            .map(|record| ModuleListing {
                name: record.name.clone(),
                path: record.path.clone(),
                functions: record.signatures.clone(),
            })
            .collect();
        listing.sort_by(|a, b| a.name.cmp(&b.name));
        listing
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
