//! Best-effort re-indentation for extracted output
//!
//! Each formatter is a short, fixed list of regex substitutions. None of them
//! parse their input. Running a formatter over its own output will not corrupt
//! it, but the result is not guaranteed to be byte-for-byte identical.

use std::sync::LazyLock;

use regex::Regex;

fn pattern(source: &str) -> Regex {
    Regex::new(source).expect("formatter patterns are literals")
}

static BLANK_LINES: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?m)^\s*\n"));

static TAG_GAP: LazyLock<Regex> = LazyLock::new(|| pattern(r"><"));
static CLOSING_TAG: LazyLock<Regex> = LazyLock::new(|| pattern(r"(</[^>]+>)"));
static OPENING_TAG: LazyLock<Regex> = LazyLock::new(|| pattern(r"(<[^/][^>]*[^/]>)\s*\n"));

static CSS_OPEN: LazyLock<Regex> = LazyLock::new(|| pattern(r"\{"));
static CSS_SEMICOLON: LazyLock<Regex> = LazyLock::new(|| pattern(r";"));
static CSS_CLOSE: LazyLock<Regex> = LazyLock::new(|| pattern(r"\}"));

static JS_OPEN: LazyLock<Regex> = LazyLock::new(|| pattern(r"\{\s*"));
static JS_SEMICOLON: LazyLock<Regex> = LazyLock::new(|| pattern(r";\s*"));
static JS_CLOSE: LazyLock<Regex> = LazyLock::new(|| pattern(r"\}\s*"));

// An indent left dangling in front of a closing brace
static DANGLING_INDENT: LazyLock<Regex> = LazyLock::new(|| pattern(r"\n {2}\n\}"));
static INDENTED_CLOSE: LazyLock<Regex> = LazyLock::new(|| pattern(r"\n {2}\}"));

/// Put tags on their own lines and drop blank lines.
pub fn format_markup(markup: &str) -> String {
    let text = TAG_GAP.replace_all(markup, ">\n<");
    let text = CLOSING_TAG.replace_all(&text, "${1}\n");
    let text = OPENING_TAG.replace_all(&text, "${1}\n");
    BLANK_LINES.replace_all(&text, "").into_owned()
}

/// Break declarations onto indented lines and give `}` its own line.
pub fn format_style(style: &str) -> String {
    let text = CSS_OPEN.replace_all(style, " {\n  ");
    let text = CSS_SEMICOLON.replace_all(&text, ";\n  ");
    let text = CSS_CLOSE.replace_all(&text, "\n}\n");
    let text = DANGLING_INDENT.replace_all(&text, "\n}");
    BLANK_LINES.replace_all(&text, "").into_owned()
}

/// Statement-per-line layout for script and component source.
pub fn format_script(script: &str) -> String {
    let text = JS_OPEN.replace_all(script, "{\n  ");
    let text = JS_SEMICOLON.replace_all(&text, ";\n  ");
    let text = JS_CLOSE.replace_all(&text, "}\n");
    let text = INDENTED_CLOSE.replace_all(&text, "\n}");
    BLANK_LINES.replace_all(&text, "").into_owned()
}
