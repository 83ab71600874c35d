//! Built-in renderers for `report.html`.

use crate::domain::model::{ReportRow, TemplateContext};
use crate::domain::ports::ReportRenderer;
use crate::utils::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Renderer selected from configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum RendererKind {
    #[default]
    Html,
    Json,
}

impl ReportRenderer for RendererKind {
    fn render(&self, context: &TemplateContext) -> Result<String> {
        match self {
            RendererKind::Html => HtmlRenderer::default().render(context),
            RendererKind::Json => JsonRenderer.render(context),
        }
    }
}

/// Tabular HTML page; networks are separated by horizontal rules.
#[derive(Debug, Clone, Default)]
pub struct HtmlRenderer {
    pub title: Option<String>,
}

impl ReportRenderer for HtmlRenderer {
    fn render(&self, context: &TemplateContext) -> Result<String> {
        let title = self
            .title
            .clone()
            .unwrap_or_else(|| format!("Moss Networks {}", context.result_id));
        let mut html = String::with_capacity(4096 + context.entries.len() * 256);

        html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
        let _ = writeln!(html, "<title>{}</title>", escape(&title));
        html.push_str("</head>\n<body>\n");
        let _ = writeln!(html, "<h1>{}</h1>", escape(&title));
        let _ = writeln!(html, "<p>Generated: {}</p>", escape(&context.date));
        let _ = writeln!(html, "<p>Options: {}</p>", escape(&context.options));
        let _ = writeln!(
            html,
            "<p>Matches: {} original, {} shown, {} filtered</p>",
            context.original_count, context.retained_count, context.filtered_count
        );

        if context.entries.is_empty() {
            html.push_str("<p>No networks to review.</p>\n");
        } else {
            html.push_str("<table>\n<tr><th>Student 1</th><th>Student 2</th><th>Lines Matched</th><th>Partnered</th></tr>\n");
            for row in &context.entries {
                match row {
                    ReportRow::GroupBoundary => {
                        html.push_str("<tr><td colspan=\"4\"><hr></td></tr>\n");
                    }
                    ReportRow::Entry(entry) => {
                        let link = escape(&entry.result_url);
                        let _ = writeln!(
                            html,
                            "<tr><td><a href=\"{link}\">{} ({}%)</a></td><td><a href=\"{link}\">{} ({}%)</a></td><td align=\"right\">{}</td><td>{}</td></tr>",
                            escape(&entry.student1),
                            entry.percent1,
                            escape(&entry.student2),
                            entry.percent2,
                            entry.lines,
                            if entry.partnered { "Y" } else { "" },
                        );
                    }
                }
            }
            html.push_str("</table>\n");
        }

        html.push_str("</body>\n</html>\n");
        Ok(html)
    }
}

/// Emits the template context itself, for downstream tooling.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRenderer;

impl ReportRenderer for JsonRenderer {
    fn render(&self, context: &TemplateContext) -> Result<String> {
        Ok(serde_json::to_string_pretty(context)?)
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
