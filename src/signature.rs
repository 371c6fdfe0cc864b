//! Heuristic signature extraction from module source text.
//!
//! Scans the raw script source for each exported callable's declaration and
//! recovers an ordered parameter list, a description, and a usage example.
//! This is a line-oriented text scan, not a real parser: an unusual
//! declaration style yields an empty parameter list and a generic example,
//! never an error. Keep it behind this interface so an AST walk could
//! replace it without touching the registry, parser, or validator.

use regex::Regex;

use crate::types::{FunctionSignature, ParameterSignature};

/// Extract a signature for each callable name from the module's source text
pub fn extract_signatures(
    source: &str,
    callable_names: &[String],
    module_name: &str,
) -> Vec<FunctionSignature> {
    let lines: Vec<&str> = source.lines().collect();
    callable_names
        .iter()
        .map(|name| extract_one(&lines, name, module_name))
        .collect()
}

fn extract_one(lines: &[&str], name: &str, module: &str) -> FunctionSignature {
    let escaped = regex::escape(name);
    // `fn name(...)` declarations, optionally private
    let fn_re = Regex::new(&format!(r"^\s*(?:private\s+)?fn\s+{escaped}\s*\("))
        .expect("function declaration pattern is valid");
    // `let name = |...|` / `const name = |...|` closure assignments
    let closure_re = Regex::new(&format!(r"^\s*(?:let|const)\s+{escaped}\s*=\s*\|"))
        .expect("closure assignment pattern is valid");

    let mut parameters = Vec::new();
    let mut decl_line = None;

    for (idx, line) in lines.iter().enumerate() {
        let (end, close) = if let Some(m) = fn_re.find(line) {
            (m.end(), ')')
        } else if let Some(m) = closure_re.find(line) {
            (m.end(), '|')
        } else {
            continue;
        };

        decl_line = Some(idx);
        if let Some(text) = collect_param_text(lines, idx, end, close) {
            parameters = split_top_level(&text)
                .iter()
                .map(|token| parse_param(token))
                .collect();
        }
        break;
    }

    let (description, mut example) = match decl_line {
        Some(idx) => parse_doc_block(lines, idx),
        None => (String::new(), None),
    };

    if let Some(ex) = example.as_mut() {
        // module-qualify a bare example like `fly("Eagle", 100)`
        if !ex.starts_with(&format!("{module}.")) {
            *ex = format!("{module}.{ex}");
        }
    }

    let example =
        example.unwrap_or_else(|| synthetic_example(module, name, &parameters));

    FunctionSignature {
        name: name.to_string(),
        parameters,
        description,
        example,
    }
}

/// Gather the parameter text between the opening delimiter and its matching
/// close, concatenating lines until the close is seen at nesting depth zero
fn collect_param_text(lines: &[&str], start: usize, after: usize, close: char) -> Option<String> {
    let mut text = String::new();
    let mut depth = 0i32;
    let mut rest = lines[start][after..].to_string();
    let mut idx = start;

    loop {
        for c in rest.chars() {
            if c == close && depth == 0 {
                return Some(text);
            }
            match c {
                '(' | '[' | '<' => depth += 1,
                ')' | ']' | '>' => depth -= 1,
                _ => {}
            }
            text.push(c);
        }
        idx += 1;
        if idx >= lines.len() {
            return None;
        }
        text.push(' ');
        rest = lines[idx].to_string();
    }
}

/// Split parameter text on commas at nesting depth zero only, so nested
/// generic/array/call syntax inside a default value does not break the split
fn split_top_level(text: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0i32;

    for c in text.chars() {
        match c {
            '(' | '[' | '<' => {
                depth += 1;
                current.push(c);
            }
            ')' | ']' | '>' => {
                depth -= 1;
                current.push(c);
            }
            ',' if depth == 0 => {
                parts.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    if !current.trim().is_empty() {
        parts.push(current.trim().to_string());
    }
    parts.retain(|p| !p.is_empty());
    parts
}

/// Split a parameter token on the first colon into name and type; no colon
/// means type `any`. Default values after `=` are stripped from both sides.
fn parse_param(token: &str) -> ParameterSignature {
    match token.split_once(':') {
        Some((name, type_part)) => {
            let type_tag = type_part
                .split('=')
                .next()
                .unwrap_or(type_part)
                .trim()
                .to_string();
            ParameterSignature::new(
                name.trim(),
                if type_tag.is_empty() { "any".to_string() } else { type_tag },
            )
        }
        None => {
            let name = token.split('=').next().unwrap_or(token).trim();
            ParameterSignature::new(name, "any")
        }
    }
}

/// Look backward from the declaration for an immediately preceding
/// `/** ... */` block. Returns the description (first non-tag line) and the
/// `@example` tag's text, if any.
fn parse_doc_block(lines: &[&str], decl_line: usize) -> (String, Option<String>) {
    let Some(mut idx) = decl_line.checked_sub(1) else {
        return (String::new(), None);
    };
    if !lines[idx].trim().ends_with("*/") {
        return (String::new(), None);
    }

    let mut block = Vec::new();
    loop {
        block.push(lines[idx]);
        if lines[idx].trim_start().starts_with("/**") {
            break;
        }
        if idx == 0 {
            return (String::new(), None);
        }
        idx -= 1;
    }
    block.reverse();

    let mut description = String::new();
    let mut example = None;

    for raw in block {
        let mut line = raw.trim();
        line = line.strip_prefix("/**").unwrap_or(line);
        line = line.strip_suffix("*/").unwrap_or(line);
        line = line.trim_start_matches('*').trim();
        if line.is_empty() {
            continue;
        }
        if let Some(rest) = line.strip_prefix("@example") {
            example = Some(rest.trim().to_string());
        } else if !line.starts_with('@') && description.is_empty() {
            description = line.to_string();
        }
    }

    (description, example)
}

/// Build an example call by mapping each parameter's type tag to a
/// representative literal
fn synthetic_example(module: &str, name: &str, params: &[ParameterSignature]) -> String {
    if params.is_empty() {
        return format!("{module}.{name}()");
    }
    let args: Vec<String> = params
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let tag = p.type_tag.to_lowercase();
            if tag.starts_with("string") || tag.starts_with("str") {
                "\"example\"".to_string()
            } else if tag.starts_with("number") || tag.starts_with("int") || tag.starts_with("float")
            {
                (i + 1).to_string()
            } else if tag.starts_with("bool") {
                "true".to_string()
            } else if tag.contains("array") || tag.contains("[]") || tag.starts_with("list") {
                "[1, 2]".to_string()
            } else {
                format!("value{}", i + 1)
            }
        })
        .collect();
    format!("{module}.{name}({})", args.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_typed_parameters() {
        let source = "fn fly(name: string, distance: number) {\n}\n";
        let sigs = extract_signatures(source, &names(&["fly"]), "bird");
        assert_eq!(sigs.len(), 1);
        assert_eq!(
            sigs[0].parameters,
            vec![
                ParameterSignature::new("name", "string"),
                ParameterSignature::new("distance", "number"),
            ]
        );
    }

    #[test]
    fn test_untyped_parameters_default_to_any() {
        let source = "fn purr(name, volume) { }\n";
        let sigs = extract_signatures(source, &names(&["purr"]), "cat");
        assert_eq!(
            sigs[0].parameters,
            vec![
                ParameterSignature::new("name", "any"),
                ParameterSignature::new("volume", "any"),
            ]
        );
    }

    #[test]
    fn test_multiline_declaration() {
        let source = "fn send(\n    recipient: string,\n    message: string\n) { }\n";
        let sigs = extract_signatures(source, &names(&["send"]), "mail");
        assert_eq!(sigs[0].parameters.len(), 2);
        assert_eq!(sigs[0].parameters[1].name, "message");
    }

    #[test]
    fn test_nested_syntax_does_not_break_split() {
        let source = "fn plot(points: array<(number, number)>, title: string) { }\n";
        let sigs = extract_signatures(source, &names(&["plot"]), "chart");
        assert_eq!(sigs[0].parameters.len(), 2);
        assert_eq!(sigs[0].parameters[0].name, "points");
        assert_eq!(sigs[0].parameters[0].type_tag, "array<(number, number)>");
        assert_eq!(sigs[0].parameters[1].name, "title");
    }

    #[test]
    fn test_default_value_stripped() {
        let source = "fn greet(name: string = \"world\") { }\n";
        let sigs = extract_signatures(source, &names(&["greet"]), "hello");
        assert_eq!(sigs[0].parameters[0].name, "name");
        assert_eq!(sigs[0].parameters[0].type_tag, "string");
    }

    #[test]
    fn test_closure_assignment_form() {
        let source = "let shout = |text, volume| text;\n";
        let sigs = extract_signatures(source, &names(&["shout"]), "voice");
        assert_eq!(
            sigs[0].parameters,
            vec![
                ParameterSignature::new("text", "any"),
                ParameterSignature::new("volume", "any"),
            ]
        );
    }

    #[test]
    fn test_doc_block_description_and_example() {
        let source = r#"/**
 * Make the bird fly a given distance.
 * @example fly("Eagle", 100)
 */
fn fly(name: string, distance: number) { }
"#;
        let sigs = extract_signatures(source, &names(&["fly"]), "bird");
        assert_eq!(sigs[0].description, "Make the bird fly a given distance.");
        assert_eq!(sigs[0].example, r#"bird.fly("Eagle", 100)"#);
    }

    #[test]
    fn test_already_qualified_example_kept() {
        let source = "/**\n * Fly.\n * @example bird.fly(\"Owl\", 5)\n */\nfn fly(name) { }\n";
        let sigs = extract_signatures(source, &names(&["fly"]), "bird");
        assert_eq!(sigs[0].example, "bird.fly(\"Owl\", 5)");
    }

    #[test]
    fn test_synthetic_example_by_type_tag() {
        let source = "fn mix(label: string, count: number, loud: boolean, items: array) { }\n";
        let sigs = extract_signatures(source, &names(&["mix"]), "dj");
        assert_eq!(
            sigs[0].example,
            "dj.mix(\"example\", 2, true, [1, 2])"
        );
    }

    #[test]
    fn test_synthetic_example_bare_placeholder_for_any() {
        let source = "fn poke(target) { }\n";
        let sigs = extract_signatures(source, &names(&["poke"]), "game");
        assert_eq!(sigs[0].example, "game.poke(value1)");
    }

    #[test]
    fn test_missing_declaration_yields_empty_signature() {
        let source = "// nothing to see here\n";
        let sigs = extract_signatures(source, &names(&["ghost"]), "spooky");
        assert_eq!(sigs[0].name, "ghost");
        assert!(sigs[0].parameters.is_empty());
        assert_eq!(sigs[0].example, "spooky.ghost()");
        assert!(sigs[0].description.is_empty());
    }

    #[test]
    fn test_no_parameters() {
        let source = "fn ping() { \"pong\" }\n";
        let sigs = extract_signatures(source, &names(&["ping"]), "net");
        assert!(sigs[0].parameters.is_empty());
        assert_eq!(sigs[0].example, "net.ping()");
    }
}
