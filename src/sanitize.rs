//! Argument sanitization applied before values reach module code.
//!
//! Defense in depth on top of the parser's JSON-literal restriction: bounds
//! pathological sizes and neutralizes HTML/log injection. Arguments are data
//! by the time they get here, never source.

use serde_json::{Map, Value};

/// Default cap on string arguments, in characters
pub const DEFAULT_MAX_STRING_LEN: usize = 10_000;
/// Default cap on array arguments, in elements
pub const DEFAULT_MAX_ARRAY_LEN: usize = 1_000;
/// Default cap on object arguments, in keys
pub const DEFAULT_MAX_OBJECT_KEYS: usize = 100;
/// Default cap on object keys, in characters
pub const DEFAULT_MAX_KEY_LEN: usize = 256;
/// Default symmetric bound for numeric arguments
pub const DEFAULT_NUMBER_BOUND: f64 = 1e15;

/// Limits for argument sanitization
#[derive(Debug, Clone)]
pub struct SanitizeLimits {
    /// Strings are truncated to this many characters before escaping
    pub max_string_len: usize,
    /// Arrays are truncated to this many elements
    pub max_array_len: usize,
    /// Objects are truncated to this many keys
    pub max_object_keys: usize,
    /// Keys longer than this (after sanitization) are dropped
    pub max_key_len: usize,
    /// Numbers are clamped to `[-number_bound, number_bound]`
    pub number_bound: f64,
}

impl Default for SanitizeLimits {
    fn default() -> Self {
        Self {
            max_string_len: DEFAULT_MAX_STRING_LEN,
            max_array_len: DEFAULT_MAX_ARRAY_LEN,
            max_object_keys: DEFAULT_MAX_OBJECT_KEYS,
            max_key_len: DEFAULT_MAX_KEY_LEN,
            number_bound: DEFAULT_NUMBER_BOUND,
        }
    }
}

impl SanitizeLimits {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set the string cap
    pub fn with_max_string_len(mut self, len: usize) -> Self {
        self.max_string_len = len;
        self
    }

    /// Builder: set the array cap
    pub fn with_max_array_len(mut self, len: usize) -> Self {
        self.max_array_len = len;
        self
    }

    /// Builder: set the object key-count cap
    pub fn with_max_object_keys(mut self, keys: usize) -> Self {
        self.max_object_keys = keys;
        self
    }

    /// Builder: set the key-length cap
    pub fn with_max_key_len(mut self, len: usize) -> Self {
        self.max_key_len = len;
        self
    }

    /// Builder: set the numeric clamp bound
    pub fn with_number_bound(mut self, bound: f64) -> Self {
        self.number_bound = bound;
        self
    }
}

/// Sanitize each positional argument independently
pub fn sanitize_args(args: &[Value], limits: &SanitizeLimits) -> Vec<Value> {
    args.iter().map(|v| sanitize_value(v, limits)).collect()
}

/// Sanitize a single value, recursing into composites
pub fn sanitize_value(value: &Value, limits: &SanitizeLimits) -> Value {
    match value {
        Value::Null | Value::Bool(_) => value.clone(),
        Value::Number(n) => sanitize_json_number(n, limits),
        Value::String(s) => Value::String(sanitize_string(s, limits.max_string_len)),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .take(limits.max_array_len)
                .map(|v| sanitize_value(v, limits))
                .collect(),
        ),
        Value::Object(entries) => {
            let mut out = Map::new();
            for (key, val) in entries.iter().take(limits.max_object_keys) {
                let key = sanitize_string(key, limits.max_string_len);
                if key.is_empty() || key.chars().count() > limits.max_key_len {
                    continue;
                }
                out.insert(key, sanitize_value(val, limits));
            }
            Value::Object(out)
        }
    }
}

/// Clamp a float into the configured range; non-finite values collapse to 0
pub fn sanitize_number(n: f64, limits: &SanitizeLimits) -> f64 {
    if !n.is_finite() {
        return 0.0;
    }
    n.clamp(-limits.number_bound, limits.number_bound)
}

fn sanitize_json_number(n: &serde_json::Number, limits: &SanitizeLimits) -> Value {
    if let Some(i) = n.as_i64() {
        let bound = limits.number_bound as i64;
        return Value::from(i.clamp(-bound, bound));
    }
    if let Some(u) = n.as_u64() {
        return Value::from(u.min(limits.number_bound as u64));
    }
    let f = sanitize_number(n.as_f64().unwrap_or(0.0), limits);
    serde_json::Number::from_f64(f)
        .map(Value::Number)
        .unwrap_or_else(|| Value::from(0))
}

/// Truncate to the character cap first, then escape the five
/// HTML-significant characters
fn sanitize_string(s: &str, max_len: usize) -> String {
    let truncated: String = s.chars().take(max_len).collect();
    escape_html(&truncated)
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}
