//! Placeholder templates with a cached page layout.
//!
//! Templates are plain text with `{{name}}` placeholders. Each template is
//! split once into literal and placeholder segments, and every placeholder is
//! resolved exactly once: substituted values are never scanned again.

use crate::error::TemplateError;
use crate::router::Params;
use axum::response::{Html, IntoResponse, Response};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Placeholder in the layout that receives the rendered partial.
pub const CONTENT_KEY: &str = "content";

/// What a placeholder with no matching parameter turns into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingKey {
    /// Insert the literal text `undefined`.
    Undefined,
}

impl MissingKey {
    fn text(self) -> &'static str {
        match self {
            MissingKey::Undefined => "undefined",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

/// A tokenized template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    /// Split template text into literal and placeholder segments.
    ///
    /// A placeholder is `{{`, one or more characters other than `}`, then `}}`.
    /// Anything that does not fit is kept as literal text.
    pub fn parse(source: &str) -> Self {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = source;

        while let Some(start) = rest.find(OPEN) {
            let after_open = &rest[start + OPEN.len()..];
            let name_len = after_open.find('}').unwrap_or(after_open.len());

            if name_len > 0 && after_open[name_len..].starts_with(CLOSE) {
                literal.push_str(&rest[..start]);
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Placeholder(after_open[..name_len].to_string()));
                rest = &after_open[name_len + CLOSE.len()..];
            } else {
                // Not a placeholder here; keep the first brace and rescan after it
                literal.push_str(&rest[..start + 1]);
                rest = &rest[start + 1..];
            }
        }

        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Self { segments }
    }

    /// Resolve every placeholder against `params`.
    pub fn render(&self, params: &Params, missing: MissingKey) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(name) => match params.get(name) {
                    Some(value) => out.push_str(value),
                    None => out.push_str(missing.text()),
                },
            }
        }
        out
    }

    /// Names of the placeholders, in order of appearance.
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Placeholder(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }
}

/// Renders page templates from a directory into a fixed layout.
///
/// The layout is read and parsed once, at construction. Partials are read from
/// disk on every render, so edits to them show up immediately.
#[derive(Debug)]
pub struct TemplateEngine {
    dir: PathBuf,
    layout: Template,
    missing: MissingKey,
}

impl TemplateEngine {
    /// Load the layout from `dir/layout_name`.
    pub async fn new(dir: impl Into<PathBuf>, layout_name: &str) -> Result<Self, TemplateError> {
        let dir = dir.into();
        let source = read_template(&dir.join(layout_name)).await?;
        let layout = Template::parse(&source);

        if !layout.placeholders().any(|name| name == CONTENT_KEY) {
            warn!(
                layout = %layout_name,
                "Layout has no {{{{{}}}}} placeholder; pages will not show their content",
                CONTENT_KEY
            );
        }

        info!("Loaded layout {:?} from {:?}", layout_name, dir);

        Ok(Self {
            dir,
            layout,
            missing: MissingKey::Undefined,
        })
    }

    /// Read a partial and substitute its placeholders.
    ///
    /// With `params` absent the partial is returned as written.
    pub async fn render_partial(
        &self,
        name: &str,
        params: Option<&Params>,
    ) -> Result<String, TemplateError> {
        let source = read_template(&self.dir.join(name)).await?;
        debug!(template = %name, "Rendering partial");

        Ok(match params {
            None => source,
            Some(params) => Template::parse(&source).render(params, self.missing),
        })
    }

    /// Render a partial inside the layout as a complete HTML response.
    pub async fn render(
        &self,
        name: &str,
        params: Option<&Params>,
    ) -> Result<Response, TemplateError> {
        let content = self.render_partial(name, params).await?;

        let mut layout_params = Params::new();
        layout_params.insert(CONTENT_KEY.to_string(), content);

        Ok(Html(self.layout.render(&layout_params, self.missing)).into_response())
    }
}

async fn read_template(path: &Path) -> Result<String, TemplateError> {
    fs::read_to_string(path).await.map_err(|source| TemplateError::Read {
        path: path.display().to_string(),
        source,
    })
}
