//! Page Renderer
//!
//! Fills the hello page template with instance identity and the counter.
//!
//! Template syntax is deliberately small:
//! - `{{ip}}`, `{{port}}`, `{{index}}`, `{{page_count}}` are replaced with
//!   HTML-escaped values;
//! - `{{#show}} ... {{/show}}` is emitted only when the counter is above zero.

use crate::domain::entities::Page;
use std::path::Path;

const SHOW_OPEN: &str = "{{#show}}";
const SHOW_CLOSE: &str = "{{/show}}";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    #[error("failed to read template {path}: {reason}")]
    Load { path: String, reason: String },
    #[error("unknown placeholder {{{{{0}}}}}")]
    UnknownPlaceholder(String),
    #[error("unterminated tag starting at byte {0}")]
    Unterminated(usize),
    #[error("{{{{#show}}}} section without matching {{{{/show}}}}")]
    UnbalancedSection,
}

/// A parsed-on-demand page template.
#[derive(Debug, Clone)]
pub struct PageRenderer {
    source: String,
}

impl PageRenderer {
    /// Build a renderer from template text.
    pub fn from_source(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    /// Load and validate the template file.
    ///
    /// Rendering a sample page up front turns syntax errors into a startup
    /// failure rather than a 500 on every request.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, RenderError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| RenderError::Load {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let renderer = Self::from_source(source);
        renderer.render(&Page::new(Default::default(), 1))?;
        tracing::debug!("loaded page template from {}", path.display());
        Ok(renderer)
    }

    /// Render a page.
    pub fn render(&self, page: &Page) -> Result<String, RenderError> {
        let mut out = String::with_capacity(self.source.len() + 64);
        let mut rest = self.source.as_str();
        let mut offset = 0;
        // Depth of {{#show}} sections, and depth at which output was suppressed
        let mut depth = 0usize;
        let mut hidden_from: Option<usize> = None;

        while let Some(start) = rest.find("{{") {
            if hidden_from.is_none() {
                out.push_str(&rest[..start]);
            }
            let tag_rest = &rest[start..];
            let end = tag_rest
                .find("}}")
                .ok_or(RenderError::Unterminated(offset + start))?;
            let tag = &tag_rest[..end + 2];

            match tag {
                SHOW_OPEN => {
                    depth += 1;
                    if hidden_from.is_none() && !page.show_count() {
                        hidden_from = Some(depth);
                    }
                }
                SHOW_CLOSE => {
                    if depth == 0 {
                        return Err(RenderError::UnbalancedSection);
                    }
                    if hidden_from == Some(depth) {
                        hidden_from = None;
                    }
                    depth -= 1;
                }
                _ => {
                    let name = tag[2..tag.len() - 2].trim();
                    let value = placeholder(page, name)?;
                    if hidden_from.is_none() {
                        out.push_str(&escape_html(&value));
                    }
                }
            }

            let consumed = start + tag.len();
            rest = &rest[consumed..];
            offset += consumed;
        }

        if depth != 0 {
            return Err(RenderError::UnbalancedSection);
        }
        out.push_str(rest);
        Ok(out)
    }
}

fn placeholder(page: &Page, name: &str) -> Result<String, RenderError> {
    match name {
        "ip" => Ok(page.instance.ip.clone()),
        "port" => Ok(page.instance.port.clone()),
        "index" => Ok(page.instance.index.clone()),
        "page_count" => Ok(page.page_count.to_string()),
        other => Err(RenderError::UnknownPlaceholder(other.to_string())),
    }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
