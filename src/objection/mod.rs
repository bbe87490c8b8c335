//! Turning one objection into a prompt bundle.
//!
//! [`input`] picks the active modality, [`library`] renders the reference
//! list and [`prompt`] assembles the ordered parts sent to the model.

pub mod input;
pub mod library;
pub mod prompt;

pub use input::{InputError, InputSources, Modality, UserInput};
pub use library::{LIBRARY_PLACEHOLDER, ReferenceLibrary, load_library_block};
pub use prompt::{PromptBundle, PromptPart, PromptTemplate, assemble};
