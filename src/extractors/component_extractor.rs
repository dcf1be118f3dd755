//! Component-source pipeline
//!
//! JSX-like source gets no structural parse. A fixed sequence of regex
//! matchers runs over the original text and appends what it finds to the
//! style or script channel. Nothing is removed from the source: `component`
//! is the input, reformatted when requested.

use regex::{Captures, Regex};

use super::{ExtractedResult, ExtractionConfig};
use crate::error::Result;
use crate::formatters::format_script;

const CSS_IMPORT: &str = r#"import\s+['"](.+\.css)['"]"#;
const STYLED_LITERAL: &str = r"const\s+\w+\s*=\s*styled\.\w+`([^`]+)`";
const INTERPOLATION: &str = r"\$\{[^}]+\}";
const STYLE_OBJECT: &str = r"style\s*=\s*\{\s*\{([^}]+)\}\s*\}";
const CAMEL_BOUNDARY: &str = r"([a-z])([A-Z])";
const UTILITY_FUNCTION: &str = r"function\s+(\w+)\s*\([^)]*\)\s*\{[^}]*\}";
const CONSTANT: &str = r"const\s+(\w+)\s*=\s*[^;]+;";

/// Split component source into style, script and component channels.
///
/// Never fails: if any matcher faults, the source comes back untouched in
/// `component` with empty `style` and `script`.
pub fn extract_component_source(source: &str, config: &ExtractionConfig) -> ExtractedResult {
    or_passthrough(source, scan_component(source, config))
}

/// The matcher patterns are literals, so in practice only this seam sees an `Err`.
fn or_passthrough(source: &str, outcome: Result<ExtractedResult>) -> ExtractedResult {
    match outcome {
        Ok(result) => result,
        Err(e) => {
            tracing::error!(error = %e, "component extraction failed, returning source unchanged");
            ExtractedResult {
                component: source.to_string(),
                ..Default::default()
            }
        }
    }
}

fn scan_component(source: &str, config: &ExtractionConfig) -> Result<ExtractedResult> {
    let mut style = String::new();
    let mut script = String::new();

    collect_css_imports(source, &mut style)?;
    collect_styled_literals(source, &mut style)?;
    collect_style_objects(source, &mut style)?;

    if config.extract_react_components {
        collect_utility_functions(source, &mut script)?;
        collect_constants(source, &mut script)?;
    }

    let component = if config.beautify_output {
        format_script(source)
    } else {
        source.to_string()
    };

    Ok(ExtractedResult {
        markup: String::new(),
        style,
        script,
        component,
    })
}

/// Only a provenance marker is recorded; the imported file is never read.
fn collect_css_imports(source: &str, style: &mut String) -> Result<()> {
    let re = Regex::new(CSS_IMPORT)?;
    let paths: Vec<&str> = re
        .captures_iter(source)
        .filter_map(|cap| cap.get(1))
        .map(|m| m.as_str())
        .collect();
    if paths.is_empty() {
        return Ok(());
    }

    tracing::debug!(count = paths.len(), "css imports detected");
    style.push_str("/* CSS imports detected */\n");
    for path in paths {
        style.push_str(&format!("/* From: {} */\n\n", path));
    }
    Ok(())
}

fn collect_styled_literals(source: &str, style: &mut String) -> Result<()> {
    let re = Regex::new(STYLED_LITERAL)?;
    let interpolation = Regex::new(INTERPOLATION)?;
    let bodies: Vec<&str> = re
        .captures_iter(source)
        .filter_map(|cap| cap.get(1))
        .map(|m| m.as_str())
        .collect();
    if bodies.is_empty() {
        return Ok(());
    }

    tracing::debug!(count = bodies.len(), "styled literals found");
    style.push_str("/* Extracted from styled-components */\n");
    for (index, body) in bodies.into_iter().enumerate() {
        let body = interpolation.replace_all(body, "/* dynamic value */");
        style.push_str(&format!(
            ".styled-component-{} {{\n  {}\n}}\n\n",
            index, body
        ));
    }
    Ok(())
}

fn collect_style_objects(source: &str, style: &mut String) -> Result<()> {
    let re = Regex::new(STYLE_OBJECT)?;
    let camel = Regex::new(CAMEL_BOUNDARY)?;
    let objects: Vec<&str> = re
        .captures_iter(source)
        .filter_map(|cap| cap.get(1))
        .map(|m| m.as_str())
        .collect();
    if objects.is_empty() {
        return Ok(());
    }

    tracing::debug!(count = objects.len(), "inline style objects found");
    style.push_str("/* Extracted from inline style objects */\n");
    for (index, properties) in objects.into_iter().enumerate() {
        let hyphenated = camel.replace_all(properties, "${1}-${2}").to_lowercase();
        style.push_str(&format!(
            ".extracted-style-object-{} {{\n  {}\n}}\n\n",
            index, hyphenated
        ));
    }
    Ok(())
}

fn collect_utility_functions(source: &str, script: &mut String) -> Result<()> {
    let re = Regex::new(UTILITY_FUNCTION)?;
    let functions = lowercase_named(&re, source);
    if functions.is_empty() {
        return Ok(());
    }

    tracing::debug!(count = functions.len(), "utility functions found");
    script.push_str("/* Extracted utility functions */\n");
    for function in functions {
        script.push_str(&function[0]);
        script.push_str("\n\n");
    }
    Ok(())
}

fn collect_constants(source: &str, script: &mut String) -> Result<()> {
    let re = Regex::new(CONSTANT)?;
    let constants = lowercase_named(&re, source);
    if constants.is_empty() {
        return Ok(());
    }

    tracing::debug!(count = constants.len(), "constants found");
    script.push_str("/* Extracted constants and variables */\n");
    for constant in constants {
        script.push_str(&constant[0]);
        script.push('\n');
    }
    Ok(())
}

/// Matches of `re` whose first capture (the declared name) does not start
/// with an uppercase letter.
///
/// Uppercase names are components. A rejected match does not consume its
/// text: scanning resumes one byte after where it started, so declarations
/// nested inside a component body are still found.
fn lowercase_named<'h>(re: &Regex, source: &'h str) -> Vec<Captures<'h>> {
    let mut found = Vec::new();
    let mut at = 0;

    while at <= source.len() {
        let Some(cap) = re.captures_at(source, at) else {
            break;
        };
        let Some(whole) = cap.get(0) else {
            break;
        };
        let is_component = cap
            .get(1)
            .and_then(|name| name.as_str().chars().next())
            .is_some_and(|first| first.is_uppercase());

        if is_component {
            // Matches start with an ASCII keyword, so +1 stays on a char boundary
            at = whole.start() + 1;
        } else {
            at = whole.end().max(whole.start() + 1);
            found.push(cap);
        }
    }
    found
}
