//! Source splitting extractors
//!
//! Two pipelines share one result shape:
//! - markup: parses HTML and relocates `<style>`, `<script>`, inline styles
//!   and inline event handlers into separate CSS and JS text
//! - component: pattern-scans JSX-like source for CSS fragments and utility code

mod component_extractor;
mod markup_extractor;
mod sanitizer;

pub use component_extractor::extract_component_source;
pub use markup_extractor::extract_markup;
pub use sanitizer::sanitize_markup;

use html5ever::{LocalName, Namespace, QualName};
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

use crate::error::{ExtractError, Result};

/// Per-call extraction options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Turn `style="..."` attributes into generated classes
    pub convert_inline_styles: bool,
    /// Run the formatters over every output channel
    pub beautify_output: bool,
    /// Also pull lowercase-named functions and constants out of component source
    pub extract_react_components: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            convert_inline_styles: true,
            beautify_output: true,
            extract_react_components: false,
        }
    }
}

/// Extraction request from the host
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionRequest {
    /// Selects the component-source pipeline instead of the markup one
    #[serde(default)]
    pub is_component_source: bool,
    #[serde(flatten)]
    pub config: ExtractionConfig,
}

/// Text for each output channel. Every field is always present; a channel
/// that produced nothing is an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedResult {
    pub markup: String,
    pub style: String,
    pub script: String,
    pub component: String,
}

impl ExtractedResult {
    /// True when no channel produced any text.
    pub fn is_empty(&self) -> bool {
        self.markup.is_empty()
            && self.style.is_empty()
            && self.script.is_empty()
            && self.component.is_empty()
    }
}

/// Split `source` into separate channels.
///
/// Empty input is the caller's to reject; the engine assumes non-empty text.
pub fn extract_code(source: &str, request: &ExtractionRequest) -> ExtractedResult {
    if request.is_component_source {
        extract_component_source(source, &request.config)
    } else {
        extract_markup(source, &request.config)
    }
}

pub(crate) fn compile_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| ExtractError::Selector {
        selector: selector.to_string(),
        message: format!("{:?}", e),
    })
}

/// Name of a plain HTML attribute (no namespace).
pub(crate) fn attr_name(name: &str) -> QualName {
    QualName::new(None, Namespace::from(""), LocalName::from(name))
}

/// Elements attached to the document matching `selector`, in document order.
///
/// `Html::select` walks the node arena, which still holds detached nodes, so
/// the walk starts from the tree root instead. `<template>` contents are inert
/// and not part of the document, so the walk does not enter them.
pub(crate) fn select_attached<'a>(
    document: &'a Html,
    selector: &Selector,
) -> Vec<ElementRef<'a>> {
    walk_attached(document, selector, false)
}

/// Like [`select_attached`], but also descends into `<template>` contents.
pub(crate) fn select_attached_with_templates<'a>(
    document: &'a Html,
    selector: &Selector,
) -> Vec<ElementRef<'a>> {
    walk_attached(document, selector, true)
}

fn walk_attached<'a>(
    document: &'a Html,
    selector: &Selector,
    enter_templates: bool,
) -> Vec<ElementRef<'a>> {
    let mut found = Vec::new();
    let mut stack = vec![document.tree.root()];

    while let Some(node) = stack.pop() {
        if let Some(el) = ElementRef::wrap(node) {
            if selector.matches(&el) {
                found.push(el);
            }
            if !enter_templates && el.value().name() == "template" {
                continue;
            }
        }
        stack.extend(node.children().rev());
    }
    found
}
