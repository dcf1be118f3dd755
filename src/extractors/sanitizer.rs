//! Post-extraction sanitizing pass
//!
//! Re-parses serialized markup as a body fragment and strips anything that
//! must not come back: `<style>`/`<script>` elements and a fixed attribute
//! denylist. In body context the `<head>`/`<body>` tags themselves are
//! dropped but their allowed content (title, meta, templates) is kept.

use html5ever::QualName;
use scraper::{Html, Node};

use super::{attr_name, compile_selector, select_attached_with_templates};
use crate::error::Result;

const FORBIDDEN_ELEMENTS: &str = "style, script";
const FORBIDDEN_ATTRIBUTES: [&str; 5] = ["style", "onerror", "onload", "onclick", "onmouseover"];

/// Strip forbidden elements and attributes from `markup`.
pub fn sanitize_markup(markup: &str) -> Result<String> {
    let mut document = Html::parse_fragment(markup);

    let forbidden = compile_selector(FORBIDDEN_ELEMENTS)?;
    let removed: Vec<_> = select_attached_with_templates(&document, &forbidden)
        .into_iter()
        .map(|el| el.id())
        .collect();
    for id in removed {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }

    let any = compile_selector("*")?;
    let elements: Vec<_> = select_attached_with_templates(&document, &any)
        .into_iter()
        .map(|el| el.id())
        .collect();
    let denied: Vec<QualName> = FORBIDDEN_ATTRIBUTES
        .iter()
        .map(|name| attr_name(name))
        .collect();

    for id in elements {
        let Some(mut node) = document.tree.get_mut(id) else {
            continue;
        };
        if let Node::Element(element) = node.value() {
            for name in &denied {
                element.attrs.shift_remove(name);
            }
        }
    }

    Ok(document.root_element().inner_html())
}
