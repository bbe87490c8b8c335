use owo_colors::OwoColorize;
use serde_json::{Value, json};

use crate::objection::Modality;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Text,
    Json,
}

impl OutputMode {
    pub fn parse(raw: &str) -> Result<Self, String> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!(
                "Invalid output '{other}'. Supported values: text, json."
            )),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Json => "json",
        }
    }
}

/// Model markdown for the terminal. Headings are bold when `styled`.
pub fn render_markdown(text: &str, styled: bool) -> String {
    if !styled {
        return text.to_string();
    }

    text.lines()
        .map(|line| {
            if line.trim_start().starts_with('#') {
                line.bold().to_string()
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_json(model: &str, modality: Modality, text: &str) -> Value {
    json!({
        "model": model,
        "modality": modality,
        "text": text,
    })
}
