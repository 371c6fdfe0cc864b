//! Validation of a parsed call against the registry's signatures.
//!
//! Enforcement is limited to existence, arity, and required-parameter
//! presence. Type tags are descriptive only and never checked.

use serde_json::Value;

use crate::types::{Callable, ModuleMap, ValidationError};

/// Check a parsed call against the current registry snapshot and hand back
/// the callable to invoke.
///
/// Required parameters are enforced by position: every declared parameter is
/// required, and an absent, `null`, or empty-string argument at its position
/// counts as missing. Scanning stops at the first offense, so the error is
/// deterministic when several parameters are missing. Note this treats an
/// intentionally passed empty string the same as no argument at all.
pub fn validate_call(
    modules: &ModuleMap,
    module: &str,
    function: &str,
    args: &[Value],
) -> Result<Callable, ValidationError> {
    let record = modules
        .get(module)
        .ok_or_else(|| ValidationError::ModuleNotFound(module.to_string()))?;

    let callable = record
        .callables
        .get(function)
        .ok_or_else(|| ValidationError::FunctionNotFound {
            module: module.to_string(),
            function: function.to_string(),
        })?;

    let parameters = record
        .signature(function)
        .map(|s| s.parameters.as_slice())
        .unwrap_or(&[]);

    if args.len() > parameters.len() {
        return Err(ValidationError::TooManyArguments {
            function: function.to_string(),
            expected: parameters.len(),
            actual: args.len(),
        });
    }

    for (index, parameter) in parameters.iter().enumerate() {
        let missing = match args.get(index) {
            None => true,
            Some(Value::Null) => true,
            Some(Value::String(s)) => s.is_empty(),
            Some(_) => false,
        };
        if missing {
            return Err(ValidationError::MissingParameter {
                name: parameter.name.clone(),
                type_tag: parameter.type_tag.clone(),
            });
        }
    }

    Ok(callable.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FunctionSignature, ModuleRecord, ParameterSignature};
    use serde_json::json;
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::time::Instant;

    fn test_modules() -> ModuleMap {
        let mut engine = rhai::Engine::new();
        engine.set_max_expr_depths(64, 64);
        let ast = Arc::new(
            engine
                .compile("fn bark(name, times) { name }")
                .expect("fixture compiles"),
        );

        let mut callables = HashMap::new();
        callables.insert("bark".to_string(), Callable::new("bark", Arc::clone(&ast)));

        let record = ModuleRecord {
            name: "dog".to_string(),
            path: PathBuf::from("dog.rhai"),
            callables,
            signatures: vec![FunctionSignature {
                name: "bark".to_string(),
                parameters: vec![
                    ParameterSignature::new("name", "string"),
                    ParameterSignature::new("times", "number"),
                ],
                description: String::new(),
                example: "dog.bark(\"Rex\", 3)".to_string(),
            }],
            loaded_at: Instant::now(),
        };

        let mut map = HashMap::new();
        map.insert("dog".to_string(), Arc::new(record));
        Arc::new(map)
    }

    #[test]
    fn test_valid_call() {
        let modules = test_modules();
        let callable = validate_call(&modules, "dog", "bark", &[json!("Rex"), json!(3)]).unwrap();
        assert_eq!(callable.name, "bark");
    }

    #[test]
    fn test_module_not_found() {
        let modules = test_modules();
        assert_eq!(
            validate_call(&modules, "unknown", "test", &[]).unwrap_err(),
            ValidationError::ModuleNotFound("unknown".to_string())
        );
    }

    #[test]
    fn test_function_not_found_distinct_from_module() {
        let modules = test_modules();
        assert_eq!(
            validate_call(&modules, "dog", "meow", &[]).unwrap_err(),
            ValidationError::FunctionNotFound {
                module: "dog".to_string(),
                function: "meow".to_string(),
            }
        );
    }

    #[test]
    fn test_too_many_arguments() {
        let modules = test_modules();
        assert_eq!(
            validate_call(&modules, "dog", "bark", &[json!("Rex"), json!(3), json!(4)])
                .unwrap_err(),
            ValidationError::TooManyArguments {
                function: "bark".to_string(),
                expected: 2,
                actual: 3,
            }
        );
    }

    #[test]
    fn test_first_missing_parameter_wins() {
        let modules = test_modules();
        // both are missing, the first is reported
        assert_eq!(
            validate_call(&modules, "dog", "bark", &[]).unwrap_err(),
            ValidationError::MissingParameter {
                name: "name".to_string(),
                type_tag: "string".to_string(),
            }
        );
    }

    #[test]
    fn test_null_argument_is_missing() {
        let modules = test_modules();
        assert_eq!(
            validate_call(&modules, "dog", "bark", &[json!(null), json!(3)]).unwrap_err(),
            ValidationError::MissingParameter {
                name: "name".to_string(),
                type_tag: "string".to_string(),
            }
        );
    }

    #[test]
    fn test_empty_string_is_missing() {
        let modules = test_modules();
        assert_eq!(
            validate_call(&modules, "dog", "bark", &[json!(""), json!(3)]).unwrap_err(),
            ValidationError::MissingParameter {
                name: "name".to_string(),
                type_tag: "string".to_string(),
            }
        );
    }

    #[test]
    fn test_second_parameter_missing() {
        let modules = test_modules();
        assert_eq!(
            validate_call(&modules, "dog", "bark", &[json!("Rex")]).unwrap_err(),
            ValidationError::MissingParameter {
                name: "times".to_string(),
                type_tag: "number".to_string(),
            }
        );
    }

    #[test]
    fn test_type_tags_not_enforced() {
        let modules = test_modules();
        // a boolean where the tag says string still validates
        assert!(validate_call(&modules, "dog", "bark", &[json!(true), json!("many")]).is_ok());
    }
}
