//! Report template loading and placeholder substitution
//!
//! Placeholders are `{{UPPER_SNAKE}}` keys. The built-in template and
//! stylesheet are compiled into the binary; a template directory holding
//! `portfolio_template.html` and `styles.css` overrides them.

use crate::errors::{FolioError, Result};
use regex::Regex;
use std::path::Path;
use tracing::debug;

pub const TEMPLATE_FILE: &str = "portfolio_template.html";
pub const STYLES_FILE: &str = "styles.css";

const BUILTIN_TEMPLATE: &str = include_str!("../../templates/portfolio_template.html");
const BUILTIN_STYLES: &str = include_str!("../../templates/styles.css");

const STYLESHEET_LINK: &str = r#"<link rel="stylesheet" href="styles.css">"#;
const PLACEHOLDER_PATTERN: &str = r"\{\{([A-Z0-9_]+)\}\}";

/// HTML template plus its stylesheet
#[derive(Debug, Clone)]
pub struct Template {
    html: String,
    css: String,
}

impl Default for Template {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Template {
    pub fn new(html: impl Into<String>, css: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            css: css.into(),
        }
    }

    /// The template compiled into the binary
    pub fn builtin() -> Self {
        Self::new(BUILTIN_TEMPLATE, BUILTIN_STYLES)
    }

    /// Load from a template directory, or the built-in copy when `dir` is `None`
    pub fn load(dir: Option<&Path>) -> Result<Self> {
        let Some(dir) = dir else {
            return Ok(Self::builtin());
        };

        let read = |name: &str| {
            let path = dir.join(name);
            std::fs::read_to_string(&path).map_err(|e| {
                FolioError::RenderError(format!("cannot read {}: {}", path.display(), e))
            })
        };

        debug!(dir = %dir.display(), "loading report template");
        Ok(Self::new(read(TEMPLATE_FILE)?, read(STYLES_FILE)?))
    }

    /// Template with the stylesheet inlined in place of its `<link>`
    pub fn inlined(&self) -> String {
        self.html
            .replace(STYLESHEET_LINK, &format!("<style>\n{}\n</style>", self.css))
    }

    /// Inline the stylesheet and substitute every known placeholder
    pub fn render(&self, values: &[(&str, String)]) -> String {
        fill(&self.inlined(), values)
    }
}

/// Replace `{{KEY}}` with its value for every pair
pub fn fill(html: &str, values: &[(&str, String)]) -> String {
    values.iter().fold(html.to_string(), |acc, (key, value)| {
        acc.replace(&format!("{{{{{}}}}}", key), value)
    })
}

/// Placeholder keys still present in `html`, deduplicated in order
pub fn leftover_placeholders(html: &str) -> Vec<String> {
    let Ok(re) = Regex::new(PLACEHOLDER_PATTERN) else {
        return Vec::new();
    };

    let mut keys: Vec<String> = Vec::new();
    for caps in re.captures_iter(html) {
        let key = caps[1].to_string();
        if !keys.contains(&key) {
            keys.push(key);
        }
    }
    keys
}

/// Escape text for HTML element and attribute content
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
