//! Modcall - dynamic module execution engine
//!
//! Lets a caller invoke a named function from a pool of independently
//! authored Rhai script files using a plain text call string
//! (`module.function(args)`), without granting arbitrary code execution and
//! without restarting the host when scripts are added or edited.
//!
//! ## How a call flows
//!
//! 1. The **parser** turns the call string into `(module, function, args)`
//!    or a precise diagnostic.
//! 2. The **registry** lazily (re)loads script files from a directory,
//!    caching compiled modules under a TTL with file-watch invalidation.
//! 3. The **validator** checks existence, arity, and required-parameter
//!    presence against signatures inferred from the script source.
//! 4. The **sanitizer** clamps and escapes arguments.
//! 5. The **executor** invokes the callable under a deadline and a result
//!    size cap, collapsing any fault into a safe outcome.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use modcall::{CallEngine, ModuleRegistry, RegistryConfig};
//!
//! let registry = Arc::new(ModuleRegistry::new(RegistryConfig::new("./modules")));
//! let engine = CallEngine::new(registry);
//!
//! let result = engine.execute_call(r#"bird.fly("Eagle", 100)"#).await;
//! assert!(result.is_success());
//! ```
//!
//! The engine trusts module code the operator placed on disk; it guards
//! against malformed or hostile *call strings*, not hostile modules. The
//! deadline is a race against the clock, not cancellation: an overrunning
//! callable is abandoned, never interrupted.

pub mod engine;
pub mod executor;
pub mod parser;
pub mod registry;
pub mod sandbox;
pub mod sanitize;
pub mod signature;
pub mod types;
pub mod validate;

pub use engine::{CallEngine, HistorySink, HISTORY_CALL_MAX, HISTORY_OUTCOME_MAX};
pub use executor::dynamic_to_json;
pub use parser::parse_call;
pub use registry::{ModuleRegistry, RegistryConfig, DEFAULT_CACHE_TTL, DEFAULT_EXTENSION};
pub use sandbox::{
    ExecutionLimits,
    // Default limit constants
    DEFAULT_MAX_ARRAY_SIZE, DEFAULT_MAX_MAP_SIZE, DEFAULT_MAX_OPERATIONS, DEFAULT_MAX_RESULT_LEN,
    DEFAULT_MAX_STRING_SIZE, DEFAULT_TIMEOUT_MS,
};
pub use sanitize::{sanitize_args, sanitize_value, SanitizeLimits};
pub use signature::extract_signatures;
pub use types::{
    Callable, EngineError, ExecutionResult, FunctionSignature, ModuleListing, ModuleMap,
    ModuleRecord, ParameterSignature, ParseError, ParsedCall, ValidationError,
};
pub use validate::validate_call;
