//! Core types for the dynamic module execution engine

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use rhai::AST;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Inferred metadata for one parameter of a callable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSignature {
    /// Declared parameter name
    pub name: String,
    /// Best-effort type tag (`string`, `number`, `boolean`, `array`, or `any`).
    /// Descriptive only, never enforced.
    #[serde(rename = "type")]
    pub type_tag: String,
}

impl ParameterSignature {
    pub fn new(name: impl Into<String>, type_tag: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_tag: type_tag.into(),
        }
    }
}

/// Inferred signature for one callable in a module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionSignature {
    /// Function name as exported by the module
    pub name: String,
    /// Declared parameters in declaration order
    pub parameters: Vec<ParameterSignature>,
    /// Human description, taken from the doc block above the declaration
    pub description: String,
    /// Example call string, module-qualified
    pub example: String,
}

/// A single invocable function inside a compiled module
#[derive(Clone)]
pub struct Callable {
    /// Function name
    pub name: String,
    /// Compiled unit the function lives in, shared by all callables of the module
    pub(crate) ast: Arc<AST>,
}

impl Callable {
    pub(crate) fn new(name: impl Into<String>, ast: Arc<AST>) -> Self {
        Self {
            name: name.into(),
            ast,
        }
    }
}

impl std::fmt::Debug for Callable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Callable").field("name", &self.name).finish()
    }
}

/// One discovered script module: its callables and inferred signatures.
///
/// Owned exclusively by the registry and replaced wholesale on reload,
/// never mutated in place.
#[derive(Debug, Clone)]
pub struct ModuleRecord {
    /// Module name (the file stem)
    pub name: String,
    /// Resolved path of the script file
    pub path: PathBuf,
    /// Map of function name to invocable
    pub callables: HashMap<String, Callable>,
    /// Inferred signatures, recomputed on every load
    pub signatures: Vec<FunctionSignature>,
    /// When this record was loaded
    pub loaded_at: Instant,
}

impl ModuleRecord {
    /// Look up the inferred signature for a callable, if extraction produced one
    pub fn signature(&self, function: &str) -> Option<&FunctionSignature> {
        self.signatures.iter().find(|s| s.name == function)
    }
}

/// Per-module listing handed to the transport layer
#[derive(Debug, Clone, Serialize)]
pub struct ModuleListing {
    pub name: String,
    pub path: PathBuf,
    pub functions: Vec<FunctionSignature>,
}

/// Immutable snapshot of the registry: module name to record
pub type ModuleMap = Arc<HashMap<String, Arc<ModuleRecord>>>;

/// A structurally valid call, produced by the parser
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedCall {
    pub module: String,
    pub function: String,
    /// Positional argument literals, per JSON semantics
    pub args: Vec<serde_json::Value>,
}

/// Outcome of one execution attempt, in the exact shape the transport
/// layer emits: exactly one of `{result}` or `{error}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ExecutionResult {
    Success { result: String },
    Failure { error: String },
}

impl ExecutionResult {
    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionResult::Success { .. })
    }

    /// The result or error text, whichever side is populated
    pub fn text(&self) -> &str {
        match self {
            ExecutionResult::Success { result } => result,
            ExecutionResult::Failure { error } => error,
        }
    }
}

/// Errors from the call-string grammar. Each variant is a distinct
/// diagnostic; the parser checks them in a fixed order so the caller
/// always gets the most specific one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty or invalid function call string")]
    Empty,

    #[error("missing module name (expected module.function(...))")]
    MissingModuleName,

    #[error("missing parentheses in function call")]
    MissingParentheses,

    #[error(
        "invalid module or function name: identifiers must start with a letter or underscore and contain only letters, digits, and underscores"
    )]
    InvalidIdentifier,

    #[error("invalid function call format (expected module.function(arg1, arg2))")]
    InvalidFormat,

    #[error("invalid comma character '\u{ff0c}' in arguments, use the ASCII comma ','")]
    FullWidthComma,

    #[error("trailing comma in arguments")]
    TrailingComma,

    #[error("invalid arguments format, use JSON-compatible values")]
    InvalidArguments,
}

/// Errors from checking a parsed call against the registry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("module '{0}' not found")]
    ModuleNotFound(String),

    #[error("function '{function}' not found in module '{module}'")]
    FunctionNotFound { module: String, function: String },

    #[error("too many arguments for '{function}': expected at most {expected}, got {actual}")]
    TooManyArguments {
        function: String,
        expected: usize,
        actual: usize,
    },

    #[error("missing required parameter '{name}' ({type_tag})")]
    MissingParameter { name: String, type_tag: String },
}

/// Everything that can go wrong between receiving a call string and
/// producing its result
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("argument cannot be normalized: {0}")]
    Sanitize(String),

    #[error("function execution timed out after {0}ms")]
    Timeout(u64),

    #[error("function execution failed: {0}")]
    Runtime(String),

    #[error("result too large (limit {0} bytes)")]
    ResultTooLarge(usize),

    #[error("failed to load module '{module}': {reason}")]
    Load { module: String, reason: String },
}

impl EngineError {
    /// The message that may cross the engine boundary.
    ///
    /// Parse and validation errors describe the caller's own input and pass
    /// through verbatim. Runtime and load detail describes internal state and
    /// is collapsed to a generic message; the full detail only reaches the
    /// logging sink.
    pub fn public_message(&self) -> String {
        match self {
            EngineError::Runtime(_) | EngineError::Load { .. } => {
                "function execution failed".to_string()
            }
            other => other.to_string(),
        }
    }
}
