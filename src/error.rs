use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for `planwright`.
///
/// Each phase of the pipeline (compile, resolve, execute) defines its own
/// variant. Library callers can match on these to decide recovery strategy;
/// glue code continues to use `anyhow::Result` for ad-hoc context chains.
#[derive(Debug, Error)]
pub enum PlanwrightError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Expression compilation ──────────────────────────────────────────
    #[error("compile: {0}")]
    Compile(#[from] CompileError),

    // ── Plan → graph compilation ────────────────────────────────────────
    #[error("graph: {0}")]
    Graph(#[from] GraphError),

    // ── Binding / context resolution ────────────────────────────────────
    #[error("resolve: {0}")]
    Resolve(#[from] ResolveError),

    // ── Expression evaluation ───────────────────────────────────────────
    #[error("eval: {0}")]
    Eval(#[from] EvalError),

    // ── Execution contracts ─────────────────────────────────────────────
    #[error("execution: {0}")]
    Execution(#[from] ExecutionError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Expression compilation errors ──────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error(
        "expression operator {operator} is not supported (supported operators are: Not, And, Or, Equals, Le, Lt, Constant, Parameter, Fluent)"
    )]
    UnsupportedOperator { operator: String },

    #[error("parameter {parameter} is not bound on this action")]
    UnknownParameter { parameter: String },
}

// ─── Plan → graph errors ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("action template {name} is not defined")]
    UnknownTemplate { name: String },

    #[error("action {instance} expects {expected} arguments, got {actual}")]
    ArityMismatch {
        instance: String,
        expected: usize,
        actual: usize,
    },

    #[error("duplicate action instance id: {0}")]
    DuplicateInstance(String),

    #[error("successor {0} does not name a declared action instance")]
    UnknownInstance(String),

    #[error("cycle detected: {}", path.join(" -> "))]
    Cycle { path: Vec<String> },

    #[error("graph must have exactly one {role} node, found {count}")]
    Sentinel { role: &'static str, count: usize },

    #[error("node {node} is not on a path from start to end")]
    Disconnected { node: String },
}

// ─── Resolution errors ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("object {object} (parameter {parameter} of {node}) is not registered")]
    UnboundObject {
        node: String,
        parameter: String,
        object: String,
    },

    #[error("object {object} referenced by a condition of {node} is not registered")]
    UnboundConstant { node: String, object: String },

    #[error("action {action} has no registered callable")]
    UnboundAction { action: String },

    #[error("fluent {fluent} used by {node} has no registered callable")]
    UnboundFluent { node: String, fluent: String },

    #[error("condition on {node} failed to compile: {source}")]
    Compile {
        node: String,
        #[source]
        source: CompileError,
    },
}

// ─── Evaluation errors ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("symbol {0} is not bound in the context")]
    UnknownSymbol(String),

    #[error("function {0} is not bound in the context")]
    UnknownFunction(String),

    #[error("cannot apply {op} to {lhs} and {rhs}")]
    TypeMismatch {
        op: &'static str,
        lhs: String,
        rhs: String,
    },

    #[error("fluent {name} failed: {message}")]
    Callable { name: String, message: String },
}

// ─── Execution errors ───────────────────────────────────────────────────────

/// Typed failure derived from an `ActionResult` at the monitor boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    #[error("preconditions of {node} not met: {detail}")]
    PreconditionFailure { node: String, detail: String },

    #[error("preconditions of {node} timed out")]
    PreconditionTimeout { node: String },

    #[error("preconditions of {node} were skipped")]
    PreconditionSkipped { node: String },

    #[error("preconditions of {node} were never checked")]
    PreconditionNotChecked { node: String },

    #[error("action {node} failed: {detail}")]
    ActionFailure { node: String, detail: String },

    #[error("action {node} timed out")]
    ActionTimeout { node: String },

    #[error("action {node} was skipped")]
    ActionSkipped { node: String },

    #[error("action {node} was not executed")]
    ActionNotExecuted { node: String },

    #[error("action {node} returned no outcome")]
    ActionOutcomeUnknown { node: String },

    #[error("postconditions of {node} not met: {detail}")]
    PostconditionFailure { node: String, detail: String },

    #[error("postconditions of {node} timed out")]
    PostconditionTimeout { node: String },

    #[error("postconditions of {node} were skipped")]
    PostconditionSkipped { node: String },

    #[error("postconditions of {node} were never checked")]
    PostconditionNotChecked { node: String },
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, PlanwrightError>;
