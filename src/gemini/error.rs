use std::fmt;

use reqwest::StatusCode;

#[derive(Debug)]
pub enum GeminiError {
    Request(reqwest::Error),
    Api { status: StatusCode, body: String },
    EmptyResponse { block_reason: Option<String> },
}

impl fmt::Display for GeminiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Request(source) => write!(f, "Gemini request failed: {source}"),
            Self::Api { status, body } => write!(f, "Gemini API error {status}: {body}"),
            Self::EmptyResponse { block_reason: None } => {
                write!(f, "Gemini response did not contain text")
            }
            Self::EmptyResponse {
                block_reason: Some(reason),
            } => write!(f, "Gemini response did not contain text ({reason})"),
        }
    }
}

impl std::error::Error for GeminiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Request(source) => Some(source),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for GeminiError {
    fn from(source: reqwest::Error) -> Self {
        Self::Request(source)
    }
}
