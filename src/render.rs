use anyhow::{Context, Result};
use handlebars::Handlebars;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::hovercard::CardContent;

const CARD_TEMPLATE: &str = "card";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Markdown,
    Json,
    Html,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "json" => Ok(OutputFormat::Json),
            "html" => Ok(OutputFormat::Html),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

pub struct CardRenderer {
    template_engine: Handlebars<'static>,
    format: OutputFormat,
}

impl CardRenderer {
    pub fn new(format: OutputFormat, template_path: Option<&Path>) -> Result<Self> {
        let mut template_engine = Handlebars::new();
        template_engine.register_escape_fn(handlebars::no_escape);

        match template_path {
            Some(path) => {
                let template = std::fs::read_to_string(path)
                    .with_context(|| format!("reading template {}", path.display()))?;
                template_engine.register_template_string(CARD_TEMPLATE, template)?;
            }
            None => {
                template_engine.register_template_string(
                    CARD_TEMPLATE,
                    include_str!("../templates/card.md.hbs"),
                )?;
            }
        }

        Ok(Self {
            template_engine,
            format,
        })
    }

    pub fn render(&self, content: &CardContent) -> Result<String> {
        match self.format {
            OutputFormat::Markdown => self.render_markdown(content),
            OutputFormat::Json => Ok(serde_json::to_string_pretty(content)?),
            OutputFormat::Html => self.render_html(content),
        }
    }

    fn render_markdown(&self, content: &CardContent) -> Result<String> {
        Ok(self.template_engine.render(CARD_TEMPLATE, content)?)
    }

    fn render_html(&self, content: &CardContent) -> Result<String> {
        let markdown = self.render_markdown(content)?;
        let parser = pulldown_cmark::Parser::new(&markdown);
        let mut html = String::new();
        pulldown_cmark::html::push_html(&mut html, parser);

        Ok(format!(
            r#"<div class="version-hovercard">
{}</div>
"#,
            html
        ))
    }
}
