//! # Cells
//!
//! A [`Cell`] is one immutable step of the evaluation pipeline: the echoed input,
//! a successful result, or an error. Cells never format themselves directly; they
//! hand their text to a [`Renderer`], which escapes it and wraps it in a fragment
//! tagged with the cell's [`CellCategory`].

use crossterm::style::Stylize;
use strum::{AsRefStr, Display, EnumString};

/// Category tag attached to every rendered fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum CellCategory {
    Input,
    Result,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    Input { text: String },
    Result { text: String },
    Error { message: String },
}

impl Cell {
    pub fn input(text: impl Into<String>) -> Self {
        Cell::Input { text: text.into() }
    }

    pub fn result(text: impl Into<String>) -> Self {
        Cell::Result { text: text.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Cell::Error {
            message: message.into(),
        }
    }

    pub fn category(&self) -> CellCategory {
        match self {
            Cell::Input { .. } => CellCategory::Input,
            Cell::Result { .. } => CellCategory::Result,
            Cell::Error { .. } => CellCategory::Error,
        }
    }

    /// Raw, unescaped text carried by the cell.
    pub fn text(&self) -> &str {
        match self {
            Cell::Input { text } | Cell::Result { text } => text,
            Cell::Error { message } => message,
        }
    }

    pub fn render<R: Renderer + ?Sized>(&self, renderer: &R) -> R::Fragment {
        let body = renderer.escape(self.text());
        renderer.fragment(self.category(), body)
    }
}

/// Rendering capability injected into [`Cell::render`].
pub trait Renderer {
    type Fragment;

    /// Escapes raw text so it can be embedded in the display surface verbatim.
    fn escape(&self, raw: &str) -> String;

    /// Wraps an already escaped body in a fragment tagged with `category`.
    fn fragment(&self, category: CellCategory, body: String) -> Self::Fragment;
}

/// Renders cells as `<div>` fragments for an HTML cell list.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlRenderer;

impl Renderer for HtmlRenderer {
    type Fragment = String;

    fn escape(&self, raw: &str) -> String {
        let mut escaped = String::with_capacity(raw.len());
        for c in raw.chars() {
            match c {
                '&' => escaped.push_str("&amp;"),
                '<' => escaped.push_str("&lt;"),
                '>' => escaped.push_str("&gt;"),
                '"' => escaped.push_str("&quot;"),
                '\'' => escaped.push_str("&#x27;"),
                '`' => escaped.push_str("&#x60;"),
                c => escaped.push(c),
            }
        }
        escaped
    }

    fn fragment(&self, category: CellCategory, body: String) -> String {
        format!("<div class=\"cell cell-{}\">{}</div>", category, body)
    }
}

pub const DEFAULT_IN_PROMPT: &str = ">> ";

/// Renders cells as terminal lines.
#[derive(Debug, Clone)]
pub struct TerminalRenderer {
    in_prompt: String,
    out_prompt: String,
    color: bool,
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_IN_PROMPT, true)
    }
}

impl TerminalRenderer {
    pub fn new(in_prompt: &str, color: bool) -> Self {
        Self {
            in_prompt: in_prompt.to_string(),
            // results line up under the input text
            out_prompt: " ".repeat(in_prompt.chars().count()),
            color,
        }
    }

    pub fn in_prompt(&self) -> &str {
        &self.in_prompt
    }

    /// A `Warning: ` line, used for the `: text` command.
    pub fn warning(&self, text: &str) -> String {
        let body = self.escape(text);
        if self.color {
            format!("{}{}", "Warning: ".yellow(), body)
        } else {
            format!("Warning: {}", body)
        }
    }
}

impl Renderer for TerminalRenderer {
    type Fragment = String;

    fn escape(&self, raw: &str) -> String {
        raw.chars()
            .map(|c| {
                if c.is_control() && c != '\n' && c != '\t' {
                    c.escape_unicode().to_string()
                } else {
                    c.to_string()
                }
            })
            .collect()
    }

    fn fragment(&self, category: CellCategory, body: String) -> String {
        match (category, self.color) {
            (CellCategory::Input, _) => format!("{}{}", self.in_prompt, body),
            (CellCategory::Result, true) => format!("{}{}", self.out_prompt, body.blue()),
            (CellCategory::Result, false) => format!("{}{}", self.out_prompt, body),
            (CellCategory::Error, true) => format!("{}{}", "Error: ".red(), body),
            (CellCategory::Error, false) => format!("Error: {}", body),
        }
    }
}
