//! Deadline-bounded invocation of module callables.
//!
//! Each invocation runs on a fresh, limit-configured engine so one call's
//! state never leaks into the next. The deadline is a race, not a
//! cancellation: a callable that overruns it is abandoned on its blocking
//! thread and its eventual result is discarded.

use std::sync::Arc;
use std::time::Duration;

use rhai::{Dynamic, Engine, Scope};
use tracing::{error, warn};

use crate::sandbox::ExecutionLimits;
use crate::types::{Callable, EngineError};

/// Invoke `callable` positionally with the sanitized arguments, racing the
/// configured deadline. The produced value is converted to its string form
/// and checked against the result size cap.
pub async fn execute(
    callable: &Callable,
    args: &[serde_json::Value],
    limits: &ExecutionLimits,
) -> Result<String, EngineError> {
    let mut dynamic_args = Vec::with_capacity(args.len());
    for arg in args {
        let value = rhai::serde::to_dynamic(arg)
            .map_err(|e| EngineError::Runtime(format!("argument conversion failed: {e}")))?;
        dynamic_args.push(value);
    }

    let ast = Arc::clone(&callable.ast);
    let name = callable.name.clone();
    let limits = limits.clone();
    let timeout_ms = limits.timeout_ms;
    let max_result_len = limits.max_result_len;

    let invocation = tokio::task::spawn_blocking(move || -> Result<String, EngineError> {
        let engine = build_engine(&limits);
        let mut scope = Scope::new();
        let result = engine
            .call_fn::<Dynamic>(&mut scope, &ast, &name, dynamic_args)
            .map_err(|e| EngineError::Runtime(e.to_string()))?;
        Ok(dynamic_to_string(&result))
    });

    match tokio::time::timeout(Duration::from_millis(timeout_ms), invocation).await {
        Err(_) => {
            // the blocking task keeps running; we only stop waiting for it
            warn!(
                function = %callable.name,
                timeout_ms,
                "callable exceeded its deadline and was abandoned"
            );
            Err(EngineError::Timeout(timeout_ms))
        }
        Ok(Err(join_error)) => {
            error!(function = %callable.name, error = %join_error, "invocation task failed");
            Err(EngineError::Runtime(join_error.to_string()))
        }
        Ok(Ok(Err(e))) => Err(e),
        Ok(Ok(Ok(output))) => {
            if output.len() > max_result_len {
                Err(EngineError::ResultTooLarge(max_result_len))
            } else {
                Ok(output)
            }
        }
    }
}

fn build_engine(limits: &ExecutionLimits) -> Engine {
    let mut engine = Engine::new();
    engine.set_max_operations(limits.max_operations);
    engine.set_max_string_size(limits.max_string_size);
    engine.set_max_array_size(limits.max_array_size);
    engine.set_max_map_size(limits.max_map_size);
    engine.set_max_expr_depths(64, 64);
    engine
}

/// String form of a produced value: strings come out raw, unit is empty,
/// everything else is rendered as JSON
fn dynamic_to_string(value: &Dynamic) -> String {
    if value.is_string() {
        value.clone().into_string().unwrap_or_default()
    } else if value.is_unit() {
        String::new()
    } else {
        serde_json::to_string(&dynamic_to_json(value)).unwrap_or_else(|_| value.to_string())
    }
}

/// Convert a script value to `serde_json::Value`
pub fn dynamic_to_json(value: &Dynamic) -> serde_json::Value {
    if value.is_string() {
        serde_json::Value::String(value.clone().into_string().unwrap_or_default())
    } else if value.is_int() {
        serde_json::Value::Number(serde_json::Number::from(value.as_int().unwrap_or(0)))
    } else if value.is_float() {
        serde_json::json!(value.as_float().unwrap_or(0.0))
    } else if value.is_bool() {
        serde_json::Value::Bool(value.as_bool().unwrap_or(false))
    } else if value.is_array() {
        let arr: Vec<Dynamic> = value.clone().into_array().unwrap_or_default();
        serde_json::Value::Array(arr.iter().map(dynamic_to_json).collect())
    } else if value.is_map() {
        let map: rhai::Map = value.clone().cast();
        let mut json_map = serde_json::Map::new();
        for (k, v) in map.iter() {
            json_map.insert(k.to_string(), dynamic_to_json(v));
        }
        serde_json::Value::Object(json_map)
    } else if value.is_unit() {
        serde_json::Value::Null
    } else {
        serde_json::Value::String(format!("{value:?}"))
    }
}
