//! Post page template
//!
//! Templates are plain documents with three placeholders: `{{TITLE}}`,
//! `{{DATE}}` and `{{CONTENT}}`. Rendering is straight substitution.
//!
//! Drafts are rendered before their publish slot is known, so the date is
//! usually [`DATE_PLACEHOLDER`] and gets swapped for the slot timestamp with
//! [`resolve_date`] at publish time.

use thiserror::Error;

pub const TITLE_TOKEN: &str = "{{TITLE}}";
pub const DATE_TOKEN: &str = "{{DATE}}";
pub const CONTENT_TOKEN: &str = "{{CONTENT}}";

/// Stand-in for the publish date until a slot is assigned
pub const DATE_PLACEHOLDER: &str = "DATE_PLACEHOLDER";

const DEFAULT_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" /><meta name="viewport" content="width=device-width, initial-scale=1" />
  <meta name="robots" content="noindex, nofollow" />
  <title>{{TITLE}} | ZZX-Labs Blog</title>
  <link rel="stylesheet" href="/static/styles.css" />
  <script src="/static/script.js" defer></script>
</head>
<body>
<header><div id="zzx-header"></div></header>
<main class="container">
  <h1>{{TITLE}}</h1>
  <p class="meta">{{DATE}}</p>
  <article>
    {{CONTENT}}
  </article>
  <p><a class="btn alt" href="/blog/">← Back to Blog</a></p>
</main>
<footer><div id="zzx-footer"></div></footer>
</body>
</html>"#;

#[derive(Debug, Error, PartialEq)]
pub enum TemplateError {
    #[error("Template is missing the {0} placeholder")]
    MissingPlaceholder(&'static str),
}

/// A page template with title, date and content placeholders
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    source: String,
}

impl Template {
    /// Parses template text, requiring all three placeholders
    pub fn parse(source: impl Into<String>) -> Result<Self, TemplateError> {
        let source = source.into();
        for token in [TITLE_TOKEN, DATE_TOKEN, CONTENT_TOKEN] {
            if !source.contains(token) {
                return Err(TemplateError::MissingPlaceholder(token));
            }
        }
        Ok(Self { source })
    }

    /// The built-in page layout
    pub fn builtin() -> Self {
        Self {
            source: DEFAULT_TEMPLATE.to_string(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Substitutes the three placeholders
    pub fn render(&self, title: &str, date: &str, content: &str) -> String {
        self.source
            .replace(TITLE_TOKEN, title)
            .replace(DATE_TOKEN, date)
            .replace(CONTENT_TOKEN, content)
    }
}

impl Default for Template {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Replaces [`DATE_PLACEHOLDER`] in rendered markup with the publish date
pub fn resolve_date(markup: &str, date: &str) -> String {
    markup.replace(DATE_PLACEHOLDER, date)
}
