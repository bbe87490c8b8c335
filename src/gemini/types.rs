use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::objection::prompt::{PromptBundle, PromptPart};

#[derive(Debug, Clone, Serialize)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

/// Untagged union of text and inline media parts.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

/// Base64 inline payload for image and audio parts.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

impl From<&PromptPart> for Part {
    fn from(part: &PromptPart) -> Self {
        match part {
            PromptPart::Text(text) => Self::Text { text: text.clone() },
            PromptPart::Blob { mime_type, data } => Self::InlineData {
                inline_data: InlineData {
                    mime_type: mime_type.clone(),
                    data: STANDARD.encode(data),
                },
            },
        }
    }
}

impl From<&PromptBundle> for GenerateContentRequest {
    /// All parts travel in a single user turn, in bundle order.
    fn from(bundle: &PromptBundle) -> Self {
        Self {
            contents: vec![Content {
                role: "user".to_string(),
                parts: bundle.parts().iter().map(Part::from).collect(),
            }],
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<CandidateContent>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

/// Response parts may carry function calls or other payloads; only text is read.
#[derive(Debug, Deserialize)]
pub struct ResponsePart {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate, if it has any.
    pub fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect();
        (!text.is_empty()).then_some(text)
    }

    pub fn block_reason(&self) -> Option<String> {
        self.prompt_feedback
            .as_ref()
            .and_then(|feedback| feedback.block_reason.clone())
            .or_else(|| {
                self.candidates
                    .first()
                    .and_then(|candidate| candidate.finish_reason.clone())
                    .filter(|reason| reason != "STOP")
            })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelList {
    #[serde(default)]
    pub models: Vec<ModelInfo>,
    pub next_page_token: Option<String>,
}

/// One entry of the `models` listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub supported_generation_methods: Vec<String>,
}

impl ModelInfo {
    pub fn supports_generate_content(&self) -> bool {
        self.supported_generation_methods
            .iter()
            .any(|method| method == "generateContent")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    #[test]
    fn blob_parts_serialize_as_camel_case_inline_data() {
        let bundle = PromptBundle::new(vec![
            PromptPart::Text("instrução".to_string()),
            PromptPart::Blob {
                mime_type: "audio/ogg".to_string(),
                data: vec![0, 1, 2, 255],
            },
        ]);

        let body = serde_json::to_value(GenerateContentRequest::from(&bundle)).unwrap();
        assert_eq!(
            body,
            json!({
                "contents": [{
                    "role": "user",
                    "parts": [
                        { "text": "instrução" },
                        { "inlineData": { "mimeType": "audio/ogg", "data": "AAEC/w==" } }
                    ]
                }]
            })
        );
    }

    #[test]
    fn response_text_joins_first_candidate_parts() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [
                { "content": { "parts": [{ "text": "## WhatsApp\n" }, { "text": "Oi!" }] } },
                { "content": { "parts": [{ "text": "ignored" }] } }
            ]
        }))
        .unwrap();
        assert_eq!(response.text().as_deref(), Some("## WhatsApp\nOi!"));
    }

    #[test]
    fn response_without_candidates_reports_block_reason() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "promptFeedback": { "blockReason": "SAFETY" }
        }))
        .unwrap();
        assert_eq!(response.text(), None);
        assert_eq!(response.block_reason().as_deref(), Some("SAFETY"));
    }

    #[test]
    fn non_text_parts_are_skipped() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": { "parts": [{ "functionCall": { "name": "x" } }] },
                "finishReason": "MALFORMED_FUNCTION_CALL"
            }]
        }))
        .unwrap();
        assert_eq!(response.text(), None);
        assert_eq!(
            response.block_reason().as_deref(),
            Some("MALFORMED_FUNCTION_CALL")
        );
    }

    #[test]
    fn model_info_filters_on_generate_content() {
        let list: ModelList = serde_json::from_value(json!({
            "models": [
                { "name": "models/gemini-flash-latest", "supportedGenerationMethods": ["generateContent", "countTokens"] },
                { "name": "models/text-embedding-004", "supportedGenerationMethods": ["embedContent"] }
            ],
            "nextPageToken": "abc"
        }))
        .unwrap();
        let names: Vec<_> = list
            .models
            .iter()
            .filter(|model| model.supports_generate_content())
            .map(|model| model.name.as_str())
            .collect();
        assert_eq!(names, ["models/gemini-flash-latest"]);
        assert_eq!(list.next_page_token.as_deref(), Some("abc"));

        let serialized = serde_json::to_value(&list.models[1]).unwrap();
        assert_eq!(serialized.get("displayName"), None::<&Value>);
    }
}
