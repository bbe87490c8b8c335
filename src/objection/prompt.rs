use std::fs;
use std::path::Path;

use crate::objection::input::UserInput;
use crate::objection::library::load_library_block;

/// Where the rendered reference library goes inside a template.
pub const LIBRARY_TOKEN: &str = "{biblioteca}";

pub const TEXT_LABEL: &str = "OBJEÇÃO:";
pub const IMAGE_FRAMING: &str = "Analise a imagem:";
pub const AUDIO_FRAMING: &str = "Analise o áudio:";

const BUILTIN_TEMPLATE: &str = include_str!("../../prompts/advisor.txt");

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptPart {
    Text(String),
    Blob { mime_type: String, data: Vec<u8> },
}

/// Ordered parts of one generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptBundle {
    parts: Vec<PromptPart>,
}

impl PromptBundle {
    pub fn new(parts: Vec<PromptPart>) -> Self {
        Self { parts }
    }

    pub fn parts(&self) -> &[PromptPart] {
        &self.parts
    }
}

/// System instruction source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    text: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PromptTemplate {
    pub fn builtin() -> Self {
        Self::new(BUILTIN_TEMPLATE)
    }

    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn load(path: &Path) -> Result<Self, String> {
        let text = fs::read_to_string(path)
            .map_err(|err| format!("Failed to read template '{}': {err}", path.display()))?;
        if text.trim().is_empty() {
            return Err(format!("Template '{}' is empty.", path.display()));
        }
        Ok(Self::new(text))
    }

    pub fn uses_library(&self) -> bool {
        self.text.contains(LIBRARY_TOKEN)
    }

    /// Instruction text with `library_block` substituted for [`LIBRARY_TOKEN`].
    pub fn render(&self, library_block: &str) -> String {
        self.text.replace(LIBRARY_TOKEN, library_block)
    }

    /// Builds the instruction, reading the library only if the template asks for it.
    pub fn instruction(&self, library: &Path) -> String {
        if self.uses_library() {
            self.render(&load_library_block(library))
        } else {
            self.text.clone()
        }
    }
}

/// Orders instruction, framing and payload for one input.
pub fn assemble(instruction: String, input: UserInput) -> PromptBundle {
    let parts = match input {
        UserInput::Text(text) => vec![
            PromptPart::Text(instruction),
            PromptPart::Text(format!("{TEXT_LABEL} {text}")),
        ],
        UserInput::Image {
            bytes, mime_type, ..
        } => vec![
            PromptPart::Text(instruction),
            PromptPart::Text(IMAGE_FRAMING.to_string()),
            PromptPart::Blob {
                mime_type,
                data: bytes,
            },
        ],
        UserInput::Audio { bytes, mime_type } => vec![
            PromptPart::Text(instruction),
            PromptPart::Text(AUDIO_FRAMING.to_string()),
            PromptPart::Blob {
                mime_type,
                data: bytes,
            },
        ],
    };
    PromptBundle::new(parts)
}
