//! Structured error kinds for the reconciliation pipeline.
//!
//! Each kind owns the context fields callers need to format a useful
//! diagnostic; the library boundary wraps these in `color_eyre::Report`
//! the way the rest of this workspace does, but lower layers always
//! produce one of the `thiserror` enums below so tests and callers can
//! match on `kind`/`sub-tag` instead of parsing strings.

use crate::state::ResourceKind;
use std::path::PathBuf;

/// Errors raised while loading or validating the desired-state configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found (searched: {searched:?})")]
    FileNotFound { searched: Vec<PathBuf> },

    #[error("failed to parse config at {path}: {detail}")]
    ParseFailed { path: PathBuf, detail: String },

    #[error("config validation failed: {detail}")]
    ValidationFailed { detail: String },
}

/// Errors raised by the State Model or State Discoverer.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("state discovery failed: {source}")]
    DiscoveryFailed {
        #[source]
        source: HypervisorError,
    },

    #[error("state validation failed: {kind:?} {name}: {detail}")]
    ValidationFailed {
        kind: ResourceKind,
        name: String,
        detail: String,
    },

    #[error("inconsistent state: {kind:?} {name}: {detail}")]
    InconsistentState {
        kind: ResourceKind,
        name: String,
        detail: String,
    },
}

/// Errors raised by the Planner. The Planner never performs I/O, so these
/// are the only errors it can produce.
#[derive(Debug, thiserror::Error)]
pub enum PlanningError {
    #[error("failed to generate plan: {detail}")]
    PlanGenerationFailed { detail: String },

    #[error("dependency violation: {action} depends on {dependency}, which is not satisfied")]
    DependencyViolation { action: String, dependency: String },

    #[error("resource conflict between {first} and {second}")]
    ResourceConflict { first: String, second: String },

    #[error("plan validation failed: {detail}")]
    ValidationFailed { detail: String },
}

/// Errors raised while executing a plan.
#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error("action failed: {kind:?} {name} ({step}): {source}")]
    ActionFailed {
        kind: ResourceKind,
        name: String,
        step: String,
        #[source]
        source: HypervisorError,
    },

    #[error("action timed out: {kind:?} {name} ({step})")]
    Timeout {
        kind: ResourceKind,
        name: String,
        step: String,
    },

    #[error("rollback failed for {kind:?} {name}: {detail}")]
    RollbackFailed {
        kind: ResourceKind,
        name: String,
        detail: String,
    },

    #[error("precondition failed for {kind:?} {name}: {detail}")]
    PreconditionFailed {
        kind: ResourceKind,
        name: String,
        detail: String,
    },

    #[error("postcondition failed for {kind:?} {name}: {detail}")]
    PostconditionFailed {
        kind: ResourceKind,
        name: String,
        detail: String,
    },
}

/// Errors raised by the Hypervisor Adapter.
#[derive(Debug, thiserror::Error, Clone)]
pub enum HypervisorError {
    #[error("command failed: {command} (exit {exit_code:?}): {output}")]
    CommandFailed {
        command: String,
        exit_code: Option<i32>,
        output: String,
    },

    #[error("command timed out after {timeout_ms}ms: {command}")]
    Timeout { command: String, timeout_ms: u64 },

    #[error("failed to connect to hypervisor: {detail}")]
    ConnectionFailed { detail: String },

    #[error("{kind:?} {name} already exists")]
    ResourceExists { kind: ResourceKind, name: String },

    #[error("{kind:?} {name} not found")]
    ResourceNotFound { kind: ResourceKind, name: String },
}

/// Errors raised while generating a cloud-init ISO.
#[derive(Debug, thiserror::Error)]
pub enum CloudInitError {
    #[error("failed to render cloud-init document: {detail}")]
    RenderFailed { detail: String },

    #[error("failed to stage cloud-init files: {detail}")]
    StagingFailed { detail: String },

    #[error("genisoimage failed (exit {exit_code:?}): {output}")]
    IsoToolFailed {
        exit_code: Option<i32>,
        output: String,
    },
}

/// A standalone timeout error, used for operations outside the Adapter's
/// own timeout bookkeeping (e.g. the Executor waiting on a cancellation).
#[derive(Debug, thiserror::Error)]
#[error("{operation} timed out after {elapsed_ms}ms (limit {timeout_ms}ms)")]
pub struct TimeoutError {
    pub operation: String,
    pub timeout_ms: u64,
    pub elapsed_ms: u64,
}

/// Errors describing an unsatisfiable or cyclic dependency between resources.
#[derive(Debug, thiserror::Error)]
pub enum DependencyError {
    #[error("{resource} depends on missing {dependency}")]
    MissingDependency { resource: String, dependency: String },

    #[error("circular dependency: {}", cycle.join(" -> "))]
    CircularDependency { cycle: Vec<String> },
}

/// Errors describing a malformed or conflicting resource value.
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    #[error("{kind:?} {name}: validation failed for {operation}: {constraint}")]
    ValidationFailed {
        kind: ResourceKind,
        name: String,
        operation: String,
        constraint: String,
    },

    #[error("{kind:?} {name}: constraint violated during {operation}: {constraint}")]
    ConstraintViolated {
        kind: ResourceKind,
        name: String,
        operation: String,
        constraint: String,
    },

    #[error("{kind:?} {name} is busy")]
    Busy { kind: ResourceKind, name: String },

    #[error("{kind:?} {name}: insufficient {constraint}")]
    Insufficient {
        kind: ResourceKind,
        name: String,
        constraint: String,
    },
}

/// Top-level error uniting every reconciliation-layer error kind, used as
/// the `color_eyre`-free error type at module boundaries that want to
/// `match` on a specific failure instead of formatting an `eyre::Report`.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    State(#[from] StateError),
    #[error(transparent)]
    Planning(#[from] PlanningError),
    #[error(transparent)]
    Execution(#[from] ExecutionError),
    #[error(transparent)]
    Hypervisor(#[from] HypervisorError),
    #[error(transparent)]
    Timeout(#[from] TimeoutError),
    #[error(transparent)]
    Dependency(#[from] DependencyError),
    #[error(transparent)]
    Resource(#[from] ResourceError),
    #[error(transparent)]
    CloudInit(#[from] CloudInitError),
    /// The run was cancelled by the caller; this is a first-class
    /// non-error outcome everywhere except here, where it needs a variant
    /// to flow through `?` alongside real errors.
    #[error("reconciliation cancelled")]
    Cancelled,
}
