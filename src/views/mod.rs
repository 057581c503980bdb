//! HTML views
//!
//! Templates live in `templates/` and are embedded into the binary. Each page
//! template renders only its content fragment: full page loads wrap that
//! fragment in `base.html`, htmx requests receive the fragment alone.
//!
//! Registered filters:
//! - `money`: a number with two decimals (`12.5` -> `12.50`)
//! - `percent`: a number with one decimal (`33.333` -> `33.3`)

use anyhow::{anyhow, Result};
use rust_embed::RustEmbed;
use std::collections::HashMap;
use std::error::Error as StdError;
use tera::{Context as TeraContext, Tera, Value};

mod error;

pub use error::ViewError;

/// Embedded page templates
#[derive(RustEmbed)]
#[folder = "templates/"]
#[include = "*.html"]
struct Templates;

/// Layout that wraps every full page
const LAYOUT: &str = "base.html";

/// Template renderer shared by all handlers
pub struct ViewEngine {
    tera: Tera,
}

impl ViewEngine {
    /// Load the embedded templates.
    pub fn new() -> Result<Self> {
        let mut sources = Vec::new();
        for name in Templates::iter() {
            let file = Templates::get(&name)
                .ok_or_else(|| anyhow!("Embedded template disappeared: {}", name))?;
            let source = String::from_utf8(file.data.into_owned())
                .map_err(|_| ViewError::InvalidEncoding(name.to_string()))?;
            sources.push((name.to_string(), source));
        }

        tracing::debug!("Loaded {} embedded template(s)", sources.len());
        Self::from_sources(sources)
    }

    /// Build an engine from `(name, source)` pairs.
    pub fn from_sources<I, N, S>(templates: I) -> Result<Self>
    where
        I: IntoIterator<Item = (N, S)>,
        N: AsRef<str>,
        S: AsRef<str>,
    {
        let mut tera = Tera::default();
        tera.register_filter("money", money);
        tera.register_filter("percent", percent);
        tera.add_raw_templates(templates)
            .map_err(|e| ViewError::TemplateError(describe("templates", &e)))?;

        Ok(Self { tera })
    }

    /// Render a single template with context
    pub fn render(&self, template: &str, context: &TeraContext) -> Result<String> {
        self.tera
            .render(template, context)
            .map_err(|e| ViewError::TemplateError(describe(template, &e)).into())
    }

    /// Render a page template, wrapped in the layout unless `fragment_only`.
    ///
    /// The layout receives the page context plus the rendered `content`.
    pub fn render_page(
        &self,
        template: &str,
        context: &TeraContext,
        fragment_only: bool,
    ) -> Result<String> {
        let content = self.render(template, context)?;
        if fragment_only {
            return Ok(content);
        }

        let mut page = context.clone();
        page.insert("content", &content);
        self.render(LAYOUT, &page)
    }

    /// Check whether a template is loaded
    pub fn has_template(&self, template: &str) -> bool {
        self.tera.get_template_names().any(|name| name == template)
    }

    /// Minimal standalone error page, used when templates cannot help
    pub fn simple_error_page(title: &str, message: &str) -> String {
        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>
        body {{
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            max-width: 480px;
            margin: 64px auto;
            padding: 0 20px;
            color: #1e293b;
        }}
        h1 {{ font-size: 1.25rem; margin-bottom: 0.5rem; }}
        a {{ color: #2563eb; }}
    </style>
</head>
<body>
    <h1>{title}</h1>
    <p>{message}</p>
    <p><a href="/expenses">Back to expenses</a></p>
</body>
</html>"#,
            title = tera::escape_html(title),
            message = tera::escape_html(message),
        )
    }
}

/// Flatten a tera error and its causes into one message
fn describe(template: &str, error: &tera::Error) -> String {
    let mut message = format!("Failed to render '{}': {}", template, error);
    let mut source = error.source();
    while let Some(s) = source {
        message.push_str(&format!("\n  Caused by: {}", s));
        source = s.source();
    }
    message
}

fn money(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let amount = number(value, "money")?;
    Ok(Value::String(format!("{:.2}", amount)))
}

fn percent(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let share = number(value, "percent")?;
    Ok(Value::String(format!("{:.1}", share)))
}

fn number(value: &Value, filter: &str) -> tera::Result<f64> {
    value
        .as_f64()
        .ok_or_else(|| tera::Error::msg(format!("Filter `{}` expects a number, got {}", filter, value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> ViewEngine {
        ViewEngine::from_sources(vec![
            ("base.html", "<main>{{ content | safe }}</main>"),
            ("page.html", "<p>{{ name }}</p>"),
            ("amount.html", "{{ value | money }}|{{ share | percent }}"),
            ("broken.html", "{{ missing.field }}"),
        ])
        .expect("Failed to build engine")
    }

    #[test]
    fn test_render_template() {
        let mut ctx = TeraContext::new();
        ctx.insert("name", "Groceries");

        let html = engine().render("page.html", &ctx).unwrap();
        assert_eq!(html, "<p>Groceries</p>");
    }

    #[test]
    fn test_render_escapes_html() {
        let mut ctx = TeraContext::new();
        ctx.insert("name", "<script>");

        let html = engine().render("page.html", &ctx).unwrap();
        assert_eq!(html, "<p>&lt;script&gt;</p>");
    }

    #[test]
    fn test_render_page_wraps_in_layout() {
        let mut ctx = TeraContext::new();
        ctx.insert("name", "Rent");

        let engine = engine();
        let full = engine.render_page("page.html", &ctx, false).unwrap();
        assert_eq!(full, "<main><p>Rent</p></main>");

        let fragment = engine.render_page("page.html", &ctx, true).unwrap();
        assert_eq!(fragment, "<p>Rent</p>");
    }

    #[test]
    fn test_money_and_percent_filters() {
        let mut ctx = TeraContext::new();
        ctx.insert("value", &12.5);
        ctx.insert("share", &33.3333);

        let html = engine().render("amount.html", &ctx).unwrap();
        assert_eq!(html, "12.50|33.3");
    }

    #[test]
    fn test_money_filter_accepts_integers() {
        let mut ctx = TeraContext::new();
        ctx.insert("value", &250);
        ctx.insert("share", &50);

        let html = engine().render("amount.html", &ctx).unwrap();
        assert_eq!(html, "250.00|50.0");
    }

    #[test]
    fn test_money_filter_rejects_text() {
        let mut ctx = TeraContext::new();
        ctx.insert("value", "abc");
        ctx.insert("share", &1.0);

        assert!(engine().render("amount.html", &ctx).is_err());
    }

    #[test]
    fn test_render_error_carries_cause() {
        let err = engine()
            .render("broken.html", &TeraContext::new())
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("broken.html"));
    }

    #[test]
    fn test_unknown_template() {
        assert!(engine().render("nope.html", &TeraContext::new()).is_err());
        assert!(!engine().has_template("nope.html"));
        assert!(engine().has_template("page.html"));
    }

    #[test]
    fn test_invalid_template_source() {
        let result = ViewEngine::from_sources(vec![("bad.html", "{% if %}")]);
        assert!(result.is_err());
    }

    #[test]
    fn test_embedded_templates_load() {
        let engine = ViewEngine::new().expect("Embedded templates should parse");
        for name in [
            "base.html",
            "login.html",
            "error.html",
            "statistics.html",
            "expenses/list.html",
            "expenses/rows.html",
            "expenses/form.html",
        ] {
            assert!(engine.has_template(name), "missing template {}", name);
        }
    }

    #[test]
    fn test_simple_error_page_escapes() {
        let html = ViewEngine::simple_error_page("Oops", "<b>bad</b>");
        assert!(html.contains("&lt;b&gt;bad&lt;&#x2F;b&gt;"));
        assert!(!html.contains("<b>bad</b>"));
    }
}
