//! HTML to plain text conversion
//!
//! Conversion is scoped by a [`SelectorSpec`]: only matching subtrees are
//! kept. Each match is re-serialized without links, images and tables, then
//! rendered to markdown-style text by `htmd`.

use crate::error::{ConversionError, Result};
use crate::extraction::SelectorSpec;
use crate::store::{ArtifactStore, ContentKind, PageId};
use htmd::HtmlToMarkdown;
use regex::Regex;
use scraper::{ElementRef, Html, Node};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::OnceLock;
use tracing::{debug, instrument};

/// Subtrees dropped with all their content
const DROPPED: &[&str] = &[
    "img", "picture", "svg", "video", "audio", "iframe", "script", "style", "noscript", "template",
];

/// Elements replaced by their children
const UNWRAPPED: &[&str] = &["a", "thead", "tbody", "tfoot", "colgroup", "col"];

const VOID: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Text produced for one page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedText {
    /// Normalized text, ends with a newline unless empty
    pub text: String,
    /// Number of elements the selector matched
    pub matches: usize,
    /// Word count
    pub word_count: usize,
}

impl ExtractedText {
    /// True when nothing survived selection and conversion
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Selector-scoped HTML to text converter
pub struct TextConverter {
    markdown: HtmlToMarkdown,
}

impl Default for TextConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl TextConverter {
    /// Create a converter
    pub fn new() -> Self {
        Self {
            markdown: HtmlToMarkdown::builder().skip_tags(DROPPED.to_vec()).build(),
        }
    }

    /// Convert `html` to text, keeping only subtrees matched by `selector`.
    ///
    /// Zero matches is not an error: the result is empty.
    #[instrument(skip(self, html, selector), fields(bytes = html.len(), %selector))]
    pub fn convert(&self, html: &str, selector: &SelectorSpec) -> Result<ExtractedText> {
        let fragments = Self::select_markup(html, selector)?;
        let matches = fragments.len();

        let mut blocks = Vec::with_capacity(matches);
        for fragment in &fragments {
            let rendered = self
                .markdown
                .convert(fragment)
                .map_err(|e| ConversionError::RenderFailed(e.to_string()))?;
            let rendered = unescape_markdown(rendered.trim());
            if !rendered.is_empty() {
                blocks.push(rendered);
            }
        }

        let text = normalize(&blocks.join("\n\n"));
        let word_count = text.split_whitespace().count();
        debug!("Converted {} matches into {} words", matches, word_count);

        Ok(ExtractedText {
            text,
            matches,
            word_count,
        })
    }

    /// Store converted text under `id`
    pub fn persist(
        &self,
        store: &ArtifactStore,
        id: &PageId,
        text: &ExtractedText,
    ) -> Result<PathBuf> {
        store.write(id, ContentKind::ExtractedText, &text.text)
    }

    /// Serialize every selected subtree with noise elements removed
    pub fn select_markup(html: &str, selector: &SelectorSpec) -> Result<Vec<String>> {
        let css = selector.tag_selector()?;
        let document = Html::parse_document(html);

        Ok(document
            .select(&css)
            .filter(|el| selector.matches(el))
            .map(|el| {
                let mut out = String::new();
                write_element(&el, &mut out);
                out
            })
            .collect())
    }
}

fn write_element(element: &ElementRef<'_>, out: &mut String) {
    let name = element.value().name();
    if DROPPED.contains(&name) {
        return;
    }
    match name {
        // Rows become paragraphs, cells become space-separated runs
        "table" => write_wrapped("div", element, out),
        "tr" | "caption" => write_wrapped("p", element, out),
        "td" | "th" => {
            write_children(element, out);
            out.push(' ');
        }
        _ if UNWRAPPED.contains(&name) => write_children(element, out),
        _ if VOID.contains(&name) => {
            out.push('<');
            out.push_str(name);
            out.push('>');
        }
        _ => write_wrapped(name, element, out),
    }
}

fn write_wrapped(tag: &str, element: &ElementRef<'_>, out: &mut String) {
    out.push('<');
    out.push_str(tag);
    out.push('>');
    write_children(element, out);
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

fn write_children(element: &ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(&htmlescape::encode_minimal(text)),
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    write_element(&child, out);
                }
            }
            _ => {}
        }
    }
}

/// Drop the backslashes htmd puts before markdown punctuation in prose.
///
/// `\\` collapses to `\` in the same pass, so literal backslashes survive.
fn unescape_markdown(text: &str) -> String {
    static ESCAPES: OnceLock<Regex> = OnceLock::new();
    let escapes = ESCAPES.get_or_init(|| {
        Regex::new(r"\\([\\`*_{}\[\]()#+.!|<>~=-])").expect("valid regex")
    });
    escapes.replace_all(text, "$1").into_owned()
}

/// Trim line ends, collapse blank-line runs, end with one newline
fn normalize(text: &str) -> String {
    static BLANK_RUNS: OnceLock<Regex> = OnceLock::new();
    let blank_runs = BLANK_RUNS.get_or_init(|| Regex::new(r"\n{3,}").expect("valid regex"));

    let trimmed: Vec<&str> = text.lines().map(str::trim_end).collect();
    let joined = trimmed.join("\n");
    let collapsed = blank_runs.replace_all(joined.trim(), "\n\n");

    if collapsed.is_empty() {
        String::new()
    } else {
        format!("{collapsed}\n")
    }
}
