use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

pub const DEFAULT_LIBRARY_PATH: &str = "biblioteca.json";

/// Interpolated in place of the library when the file cannot be used.
pub const LIBRARY_PLACEHOLDER: &str = "Erro ao carregar biblioteca.";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Category {
    pub titulo: String,
    #[serde(default)]
    pub livros: Vec<String>,
}

/// Reference books grouped by category, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceLibrary {
    categories: Vec<(String, Category)>,
}

#[derive(Debug)]
pub enum LibraryError {
    Read { path: PathBuf, source: io::Error },
    Parse { path: PathBuf, source: serde_json::Error },
}

impl fmt::Display for LibraryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read { path, source } => {
                write!(f, "Failed to read library '{}': {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "Failed to parse library '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for LibraryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
        }
    }
}

impl ReferenceLibrary {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        let object: Map<String, Value> = serde_json::from_str(raw)?;
        let categories = object
            .into_iter()
            .map(|(key, value)| serde_json::from_value(value).map(|category| (key, category)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { categories })
    }

    pub fn load(path: &Path) -> Result<Self, LibraryError> {
        let raw = fs::read_to_string(path).map_err(|source| LibraryError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw).map_err(|source| LibraryError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn categories(&self) -> impl Iterator<Item = (&str, &Category)> {
        self.categories
            .iter()
            .map(|(key, category)| (key.as_str(), category))
    }

    pub fn book_count(&self) -> usize {
        self.categories
            .iter()
            .map(|(_, category)| category.livros.len())
            .sum()
    }

    /// Text block inserted into the instruction.
    pub fn render(&self) -> String {
        let mut block = String::new();
        for (_, category) in &self.categories {
            block.push('\n');
            block.push_str(&category.titulo);
            block.push_str(":\n");
            for book in &category.livros {
                block.push_str("- ");
                block.push_str(book);
                block.push('\n');
            }
        }
        block
    }
}

/// Reads and renders the library, falling back to [`LIBRARY_PLACEHOLDER`].
pub fn load_library_block(path: &Path) -> String {
    match ReferenceLibrary::load(path) {
        Ok(library) => {
            debug!(
                path = %path.display(),
                books = library.book_count(),
                "loaded reference library"
            );
            library.render()
        }
        Err(err) => {
            warn!("{err}");
            LIBRARY_PLACEHOLDER.to_string()
        }
    }
}
