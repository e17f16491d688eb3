//! Exercise scaffolding
//!
//! Turns a challenge's sample code into an empty starter function and
//! produces the `package.json` that lets each exercise folder run its tests
//! with jest.

use regex::Regex;
use serde_json::{json, Value};
use std::sync::LazyLock;

// function name(a, b) { ... }
static FUNCTION_DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:async\s+)?function\s*\*?\s*([A-Za-z_$][\w$]*)\s*\(([^)]*)\)")
        .expect("hardcoded regex pattern is valid")
});

// var name = function(a, b) { ... }
static FUNCTION_ASSIGNMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(?:var|let|const)\s+([A-Za-z_$][\w$]*)\s*=\s*(?:async\s+)?function\s*\*?\s*(?:[A-Za-z_$][\w$]*)?\s*\(([^)]*)\)",
    )
    .expect("hardcoded regex pattern is valid")
});

/// Name and parameter names of the function the sample code opens with
///
/// Only a leading function declaration or a `var`/`let`/`const` binding of a
/// function expression is recognized.
pub fn leading_function(code: &str) -> Option<(String, Vec<String>)> {
    let code = strip_leading_comments(code);
    let captures = FUNCTION_DECLARATION
        .captures(code)
        .or_else(|| FUNCTION_ASSIGNMENT.captures(code))?;

    let name = captures.get(1)?.as_str().to_string();
    let params = captures
        .get(2)
        .map(|m| m.as_str())
        .unwrap_or_default()
        .split(',')
        .map(|param| {
            // drop default values
            param.split('=').next().unwrap_or_default().trim().to_string()
        })
        .filter(|param| !param.is_empty())
        .collect();

    Some((name, params))
}

/// Empty starter function exported for the spec file
///
/// Returns `None` when the sample code does not open with a recognizable
/// function.
///
/// ```
/// use kata_harvest::output::starter_code;
///
/// let code = starter_code("function addUp(num) {\n  return 0;\n}").unwrap();
/// assert_eq!(
///     code,
///     "function addUp(num) {\n  // Your code here.\n}\n\nmodule.exports = addUp;\n"
/// );
/// assert!(starter_code("const addUp = (num) => 0;").is_none());
/// ```
pub fn starter_code(code: &str) -> Option<String> {
    let (name, params) = leading_function(code)?;
    Some(format!(
        "function {name}({params}) {{\n  // Your code here.\n}}\n\nmodule.exports = {name};\n",
        name = name,
        params = params.join(", ")
    ))
}

/// `package.json` for one exercise folder
pub fn package_json(name: &str) -> Value {
    json!({
        "name": format!("kata-{}", name),
        "version": "0.0.0",
        "description": "Coding challenge exercise in JavaScript.",
        "private": true,
        "devDependencies": {
            "@babel/core": "^7.3.3",
            "@babel/preset-env": "^7.3.1",
            "babel-jest": "^24.1.0",
            "jest": "^24.1.0"
        },
        "jest": {
            "modulePathIgnorePatterns": ["package.json"]
        },
        "babel": {
            "presets": ["@babel/preset-env"]
        },
        "scripts": {
            "test": "jest --no-cache ./*",
            "watch": "jest --no-cache --watch ./*"
        },
        "license": "MIT",
        "dependencies": {}
    })
}

fn strip_leading_comments(mut code: &str) -> &str {
    loop {
        let trimmed = code.trim_start();
        if let Some(rest) = trimmed.strip_prefix("//") {
            code = rest.split_once('\n').map_or("", |(_, tail)| tail);
        } else if let Some(rest) = trimmed.strip_prefix("/*") {
            code = rest.split_once("*/").map_or("", |(_, tail)| tail);
        } else {
            return trimmed;
        }
    }
}
