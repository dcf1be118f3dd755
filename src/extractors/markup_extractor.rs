//! Markup pipeline
//!
//! Parses mixed HTML with scraper's error-tolerant parser, then mutates the
//! tree in fixed order: `<style>` elements, `style` attributes, `<script>`
//! elements, inline `on*` handlers. Each category snapshots the node ids it
//! touches before mutating, so the tree is never changed under a live
//! selection.

use html5ever::tendril::StrTendril;
use indexmap::IndexMap;
use scraper::node::Element;
use scraper::{Html, Node};

use super::{
    attr_name, compile_selector, sanitize_markup, select_attached, ExtractedResult,
    ExtractionConfig,
};
use crate::error::Result;
use crate::formatters::{format_markup, format_script, format_style};

/// Handlers the browser gives special meaning; these stay inline.
const RETAINED_HANDLERS: [&str; 2] = ["onselectstart", "oncontextmenu"];

/// Split mixed HTML into markup, style and script.
///
/// Any internal failure yields an all-empty result rather than an error.
pub fn extract_markup(source: &str, config: &ExtractionConfig) -> ExtractedResult {
    match split_markup(source, config) {
        Ok(result) => result,
        Err(e) => {
            tracing::warn!(error = %e, "markup extraction failed, nothing extracted");
            ExtractedResult::default()
        }
    }
}

fn split_markup(source: &str, config: &ExtractionConfig) -> Result<ExtractedResult> {
    let mut document = Html::parse_document(source);
    let mut style = String::new();
    let mut script = String::new();

    take_style_elements(&mut document, &mut style)?;
    if config.convert_inline_styles {
        externalize_inline_styles(&mut document, &mut style)?;
    }
    take_script_elements(&mut document, &mut script)?;
    externalize_event_handlers(&mut document, &mut script)?;

    let serialized = document.root_element().inner_html();
    let markup = sanitize_markup(&serialized)?;

    if config.beautify_output {
        return Ok(ExtractedResult {
            markup: format_markup(&markup),
            style: format_style(&style),
            script: format_script(&script),
            component: String::new(),
        });
    }

    Ok(ExtractedResult {
        markup,
        style,
        script,
        component: String::new(),
    })
}

fn take_style_elements(document: &mut Html, style: &mut String) -> Result<()> {
    let selector = compile_selector("style")?;
    let found: Vec<_> = select_attached(document, &selector)
        .into_iter()
        .map(|el| (el.id(), el.text().collect::<String>()))
        .collect();

    tracing::debug!(count = found.len(), "extracting style elements");

    for (id, text) in found {
        style.push_str(&text);
        style.push_str("\n\n");
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }
    Ok(())
}

fn externalize_inline_styles(document: &mut Html, style: &mut String) -> Result<()> {
    let selector = compile_selector("[style]")?;
    let styled: Vec<_> = select_attached(document, &selector)
        .into_iter()
        .map(|el| el.id())
        .collect();
    if styled.is_empty() {
        return Ok(());
    }

    tracing::debug!(count = styled.len(), "converting inline styles");
    style.push_str("/* Extracted inline styles */\n");

    for (index, id) in styled.into_iter().enumerate() {
        let Some(mut node) = document.tree.get_mut(id) else {
            continue;
        };
        let Node::Element(element) = node.value() else {
            continue;
        };

        let class_name = format!("extracted-style-{}", index);
        let declarations = remove_attr(element, "style").unwrap_or_default();
        style.push_str(&format!(".{} {{\n  {}\n}}\n\n", class_name, declarations));
        add_class(element, &class_name);
    }
    Ok(())
}

fn take_script_elements(document: &mut Html, script: &mut String) -> Result<()> {
    let selector = compile_selector("script")?;
    let found: Vec<_> = select_attached(document, &selector)
        .into_iter()
        .map(|el| {
            let external = el.value().attr("src").is_some_and(|src| !src.trim().is_empty());
            let inline = (!external).then(|| el.text().collect::<String>());
            (el.id(), inline)
        })
        .collect();

    tracing::debug!(count = found.len(), "extracting script elements");

    for (id, inline) in found {
        if let Some(text) = inline {
            script.push_str(&text);
            script.push_str("\n\n");
        }
        // External scripts are dropped along with inline ones
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }
    Ok(())
}

fn externalize_event_handlers(document: &mut Html, script: &mut String) -> Result<()> {
    let selector = compile_selector("*")?;
    let elements: Vec<_> = select_attached(document, &selector)
        .into_iter()
        .map(|el| el.id())
        .collect();

    // Keyed by "<element id>-<event>"; a repeated key replaces the earlier handler
    let mut handlers: IndexMap<String, String> = IndexMap::new();

    for (index, id) in elements.into_iter().enumerate() {
        let Some(mut node) = document.tree.get_mut(id) else {
            continue;
        };
        let Node::Element(element) = node.value() else {
            continue;
        };

        let inline: Vec<(String, String)> = element
            .attrs
            .iter()
            .filter(|(name, _)| is_extractable_handler(&name.local))
            .map(|(name, value)| (name.local.to_string(), value.to_string()))
            .collect();
        if inline.is_empty() {
            continue;
        }

        let existing_id = element
            .attr("id")
            .filter(|id| !id.is_empty())
            .map(str::to_string);
        let element_id = match existing_id {
            Some(existing) => existing,
            None => {
                let generated = format!("element-{}", index);
                set_attr(element, "id", &generated);
                generated
            }
        };

        for (attribute, code) in inline {
            let event = &attribute[2..];
            handlers.insert(
                format!("{}-{}", element_id, event),
                listener_statement(&element_id, &attribute, event, &code),
            );
            remove_attr(element, &attribute);
        }
    }

    if handlers.is_empty() {
        return Ok(());
    }

    tracing::debug!(count = handlers.len(), "externalizing inline event handlers");

    script.push_str("/* Extracted inline event handlers */\n");
    script.push_str("document.addEventListener('DOMContentLoaded', function() {\n");
    for statement in handlers.values() {
        script.push_str(statement);
    }
    script.push_str("});\n");
    Ok(())
}

fn is_extractable_handler(name: &str) -> bool {
    name.starts_with("on") && !RETAINED_HANDLERS.contains(&name)
}

fn listener_statement(element_id: &str, attribute: &str, event: &str, code: &str) -> String {
    format!(
        "// Extracted from inline {} handler\n\
         document.getElementById({}).addEventListener({}, function() {{\n  {}\n}});\n\n",
        attribute,
        js_string(element_id),
        js_string(event),
        code
    )
}

/// Quote `value` as a JS string literal.
fn js_string(value: &str) -> String {
    // Serializing a &str cannot fail
    serde_json::to_string(value).unwrap_or_default()
}

fn remove_attr(element: &mut Element, name: &str) -> Option<String> {
    element
        .attrs
        .shift_remove(&attr_name(name))
        .map(|value| value.to_string())
}

/// Set an attribute, appending it after the existing ones if new.
fn set_attr(element: &mut Element, name: &str, value: &str) {
    element
        .attrs
        .insert(attr_name(name), StrTendril::from_slice(value));
}

/// Add a class token with class-list semantics: no duplicates, single spaces.
fn add_class(element: &mut Element, class_name: &str) {
    let mut tokens: Vec<&str> = Vec::new();
    for token in element.attr("class").unwrap_or_default().split_whitespace() {
        if !tokens.contains(&token) {
            tokens.push(token);
        }
    }
    if !tokens.contains(&class_name) {
        tokens.push(class_name);
    }
    let joined = tokens.join(" ");
    set_attr(element, "class", &joined);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw() -> ExtractionConfig {
        ExtractionConfig {
            convert_inline_styles: true,
            beautify_output: false,
            extract_react_components: false,
        }
    }

    #[test]
    fn test_style_elements_in_document_order() {
        let html = r#"
        <html>
        <head>
            <style>body { margin: 0; }</style>
        </head>
        <body>
            <div><section><style>.deep { color: blue; }</style></section></div>
            <style>.late { color: green; }</style>
        </body>
        </html>
        "#;

        let result = extract_markup(html, &raw());

        assert_eq!(
            result.style,
            "body { margin: 0; }\n\n.deep { color: blue; }\n\n.late { color: green; }\n\n"
        );
        assert!(!result.markup.contains("<style"));
    }

    #[test]
    fn test_inline_styles_become_classes() {
        let html = r#"
            <p style="color: red">One</p>
            <div><span class="note" style="font-weight: bold">Two</span></div>
        "#;

        let result = extract_markup(html, &raw());

        assert!(result.style.starts_with("/* Extracted inline styles */\n"));
        assert!(result
            .style
            .contains(".extracted-style-0 {\n  color: red\n}\n\n"));
        assert!(result
            .style
            .contains(".extracted-style-1 {\n  font-weight: bold\n}\n\n"));
        assert!(result
            .markup
            .contains(r#"<p class="extracted-style-0">One</p>"#));
        assert!(result
            .markup
            .contains(r#"<span class="note extracted-style-1">Two</span>"#));
        assert!(!result.markup.contains("style="));
    }

    #[test]
    fn test_inline_styles_left_alone_when_disabled() {
        let config = ExtractionConfig {
            convert_inline_styles: false,
            ..raw()
        };
        let result = extract_markup(r#"<p style="color: red">One</p>"#, &config);

        assert!(result.style.is_empty());
        assert!(!result.markup.contains("extracted-style"));
    }

    #[test]
    fn test_inline_style_header_only_when_needed() {
        let result = extract_markup("<p>plain</p>", &raw());
        assert!(!result.style.contains("Extracted inline styles"));
    }

    #[test]
    fn test_scripts_extracted_and_external_dropped() {
        let html = r#"
            <script src="https://cdn.example.com/lib.js"></script>
            <p>Body</p>
            <script>console.log("inline");</script>
        "#;

        let result = extract_markup(html, &raw());

        assert_eq!(result.script, "console.log(\"inline\");\n\n");
        assert!(!result.markup.contains("<script"));
        assert!(!result.script.contains("cdn.example.com"));
    }

    #[test]
    fn test_onclick_becomes_listener() {
        let result = extract_markup(r#"<button onclick="foo()">Go</button>"#, &raw());

        // html, head, body, button
        assert!(result
            .script
            .starts_with("/* Extracted inline event handlers */\n"));
        assert!(result
            .script
            .contains("document.addEventListener('DOMContentLoaded', function() {\n"));
        assert!(result.script.contains(
            "document.getElementById(\"element-3\").addEventListener(\"click\", function() {\n  foo()\n});"
        ));
        assert!(result.script.ends_with("});\n"));
        assert!(result
            .markup
            .contains(r#"<button id="element-3">Go</button>"#));
        assert!(!result.markup.contains("onclick"));
    }

    #[test]
    fn test_existing_id_is_reused() {
        let html = r#"<a id="cta" href="/go" onmouseover="hover()" onclick="go()">Go</a>"#;
        let result = extract_markup(html, &raw());

        assert!(result.script.contains(
            "document.getElementById(\"cta\").addEventListener(\"mouseover\", function() {\n  hover()\n});"
        ));
        assert!(result.script.contains("addEventListener(\"click\""));
        assert!(result.markup.contains(r#"<a id="cta" href="/go">Go</a>"#));
        // attribute order decides statement order
        let hover = result.script.find("hover()").unwrap();
        let click = result.script.find("go()").unwrap();
        assert!(hover < click);
    }

    #[test]
    fn test_retained_handlers_stay_inline() {
        let html = r#"<div oncontextmenu="return false" onselectstart="return false">x</div>"#;
        let result = extract_markup(html, &raw());

        assert!(result.script.is_empty());
        assert!(result.markup.contains("oncontextmenu"));
        assert!(result.markup.contains("onselectstart"));
        assert!(!result.markup.contains("id=\"element-"));
    }

    #[test]
    fn test_repeated_handler_key_keeps_last() {
        // The <p> is element 4 and collides with the explicit id
        let html = r#"<div id="element-4" onclick="first()"></div><p onclick="second()"></p>"#;
        let result = extract_markup(html, &raw());

        assert!(result.script.contains("second()"));
        assert!(!result.script.contains("first()"));
        assert_eq!(result.script.matches("addEventListener(\"click\"").count(), 1);
    }

    #[test]
    fn test_handler_ids_follow_global_element_order() {
        let html = r#"
            <ul>
                <li onclick="a()">A</li>
                <li onclick="b()">B</li>
            </ul>
        "#;
        let result = extract_markup(html, &raw());

        // html, head, body, ul, li, li
        assert!(result.markup.contains(r#"<li id="element-4">A</li>"#));
        assert!(result.markup.contains(r#"<li id="element-5">B</li>"#));
        let a = result.script.find("element-4").unwrap();
        let b = result.script.find("element-5").unwrap();
        assert!(a < b);
    }

    #[test]
    fn test_onerror_never_survives() {
        let result = extract_markup(r#"<img src="x" onerror="evil()">"#, &raw());
        assert!(!result.markup.contains("onerror"));
        assert!(result.markup.contains("<img"));
    }

    #[test]
    fn test_second_pass_extracts_nothing() {
        let html = r#"
            <style>h1 { color: red; }</style>
            <h1 style="margin: 0" onclick="hi()">Title</h1>
            <script>init();</script>
        "#;

        let first = extract_markup(html, &raw());
        let second = extract_markup(&first.markup, &raw());

        assert!(second.style.is_empty());
        assert!(second.script.is_empty());
        assert_eq!(second.markup.trim(), first.markup.trim());
    }

    #[test]
    fn test_head_content_survives() {
        let html = r#"<!DOCTYPE html>
<html>
<head>
    <title>My Page</title>
    <meta charset="utf-8">
    <template><i>row</i></template>
    <style>p { color: red; }</style>
</head>
<body><p onclick="go()">x</p></body>
</html>"#;
        let result = extract_markup(html, &raw());

        assert!(result.markup.contains("<title>My Page</title>"));
        assert!(result.markup.contains(r#"<meta charset="utf-8">"#));
        assert!(result.markup.contains("<template><i>row</i></template>"));
        // html, head, title, meta, template, body, p
        assert!(result.markup.contains(r#"<p id="element-6">x</p>"#));
        assert!(!result.markup.contains("<style"));
        assert_eq!(result.style, "p { color: red; }\n\n");
    }

    #[test]
    fn test_template_contents_are_skipped() {
        let html = r#"<template><b onclick="a()">t</b></template><p onclick="b()">x</p>"#;
        let result = extract_markup(html, &raw());

        // html, head, template, body, p
        assert!(result.script.contains("getElementById(\"element-4\")"));
        assert!(!result.script.contains("a()"));
        assert_eq!(result.script.matches("addEventListener(\"click\"").count(), 1);
        assert!(result.markup.contains(r#"<p id="element-4">x</p>"#));
        // the sanitizer still strips the handler inside the template
        assert!(result.markup.contains("<template><b>t</b></template>"));
    }

    #[test]
    fn test_element_id_is_quoted_for_js() {
        let html = r#"<a id='say"hi' onclick="x()">a</a>"#;
        let result = extract_markup(html, &raw());

        assert!(result
            .script
            .contains(r#"document.getElementById("say\"hi").addEventListener("click""#));
    }

    #[test]
    fn test_malformed_input_is_repaired() {
        let result = extract_markup("<div><p>unclosed <span>text", &raw());
        assert!(result.markup.contains("unclosed"));
        assert!(result.markup.contains("</span></p></div>"));
    }

    #[test]
    fn test_round_trip_keeps_structure() {
        let html = r#"<main><h1 style="font-size: 2em">Hi</h1><p>Body <b>bold</b></p></main>"#;
        let result = extract_markup(html, &raw());

        let wrapped = format!(
            "<html><head><style>{}</style></head><body>{}<script>{}</script></body></html>",
            result.style, result.markup, result.script
        );
        let document = Html::parse_document(&wrapped);
        let h1 = compile_selector("main > h1.extracted-style-0").unwrap();
        let bold = compile_selector("main > p > b").unwrap();
        assert_eq!(document.select(&h1).count(), 1);
        assert_eq!(document.select(&bold).count(), 1);
    }

    #[test]
    fn test_beautified_output() {
        let html = r#"<div style="color:red;"><p>Hi</p></div><script>go();</script>"#;
        let result = extract_markup(html, &ExtractionConfig::default());

        assert!(result.markup.contains("<p>Hi</p>\n"));
        assert!(result.style.contains(".extracted-style-0"));
        assert!(result.style.contains("color:red;\n"));
        assert!(result.script.contains("go();\n"));
    }
}
