use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use image::ImageFormat;
use serde::Serialize;
use tracing::debug;

/// Recordings are always captured as WAV.
pub const RECORDING_MIME_TYPE: &str = "audio/wav";

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "png", "jpeg"];
pub const AUDIO_EXTENSIONS: &[&str] = &["wav", "mp3", "m4a", "ogg"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Text,
    Image,
    Audio,
}

impl Modality {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Audio => "audio",
        }
    }
}

/// The single objection sent in one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserInput {
    Text(String),
    Image {
        bytes: Vec<u8>,
        mime_type: String,
        width: u32,
        height: u32,
    },
    Audio {
        bytes: Vec<u8>,
        mime_type: String,
    },
}

impl UserInput {
    pub fn modality(&self) -> Modality {
        match self {
            Self::Text(_) => Modality::Text,
            Self::Image { .. } => Modality::Image,
            Self::Audio { .. } => Modality::Audio,
        }
    }

    /// One-line description shown before the request goes out.
    pub fn preview(&self) -> String {
        match self {
            Self::Text(text) => format!("text: {} chars", text.chars().count()),
            Self::Image {
                mime_type,
                width,
                height,
                ..
            } => format!("image: {width}x{height} {mime_type}"),
            Self::Audio { bytes, mime_type } => {
                format!("audio: {mime_type}, {} bytes", bytes.len())
            }
        }
    }
}

#[derive(Debug)]
pub enum InputError {
    NoInput,
    Read {
        path: PathBuf,
        source: io::Error,
    },
    UnsupportedExtension {
        path: PathBuf,
        allowed: &'static [&'static str],
    },
    Image {
        path: PathBuf,
        source: image::ImageError,
    },
    UnsupportedImageFormat {
        path: PathBuf,
    },
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoInput => write!(
                f,
                "No input provided. Pass the objection text, --image, --record or --audio."
            ),
            Self::Read { path, source } => {
                write!(f, "Failed to read '{}': {source}", path.display())
            }
            Self::UnsupportedExtension { path, allowed } => write!(
                f,
                "Unsupported file '{}'. Allowed extensions: {}.",
                path.display(),
                allowed.join(", ")
            ),
            Self::Image { path, source } => {
                write!(f, "Failed to decode image '{}': {source}", path.display())
            }
            Self::UnsupportedImageFormat { path } => write!(
                f,
                "Image '{}' is neither PNG nor JPEG.",
                path.display()
            ),
        }
    }
}

impl std::error::Error for InputError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            Self::Image { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Everything the user handed over for one run.
#[derive(Debug, Clone, Default)]
pub struct InputSources {
    pub text: Option<String>,
    pub image: Option<PathBuf>,
    pub recording: Option<PathBuf>,
    pub audio: Option<PathBuf>,
    /// Declared type of `audio`; guessed from the extension when absent.
    pub audio_mime: Option<String>,
}

impl InputSources {
    /// Picks the active input.
    ///
    /// Sources are visited as text, image, audio and each present one
    /// replaces the previous choice. A recording beats an uploaded audio file.
    pub fn select(&self) -> Result<UserInput, InputError> {
        let mut selected = None;

        if let Some(text) = self.text.as_deref().filter(|text| !text.trim().is_empty()) {
            selected = Some(UserInput::Text(text.to_string()));
        }

        if let Some(path) = &self.image {
            selected = Some(read_image(path)?);
        }

        if let Some(path) = &self.recording {
            selected = Some(UserInput::Audio {
                bytes: read_file(path)?,
                mime_type: RECORDING_MIME_TYPE.to_string(),
            });
        } else if let Some(path) = &self.audio {
            let extension = check_extension(path, AUDIO_EXTENSIONS)?;
            let mime_type = self
                .audio_mime
                .as_deref()
                .map(str::trim)
                .filter(|mime| !mime.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| audio_mime_for_extension(&extension).to_string());
            selected = Some(UserInput::Audio {
                bytes: read_file(path)?,
                mime_type,
            });
        }

        let input = selected.ok_or(InputError::NoInput)?;
        debug!(modality = input.modality().as_str(), "selected input");
        Ok(input)
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>, InputError> {
    fs::read(path).map_err(|source| InputError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn check_extension(path: &Path, allowed: &'static [&'static str]) -> Result<String, InputError> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .filter(|ext| allowed.contains(&ext.as_str()))
        .ok_or_else(|| InputError::UnsupportedExtension {
            path: path.to_path_buf(),
            allowed,
        })
}

fn read_image(path: &Path) -> Result<UserInput, InputError> {
    check_extension(path, IMAGE_EXTENSIONS)?;
    let bytes = read_file(path)?;

    let image_error = |source| InputError::Image {
        path: path.to_path_buf(),
        source,
    };
    let mime_type = match image::guess_format(&bytes).map_err(image_error)? {
        ImageFormat::Png => "image/png",
        ImageFormat::Jpeg => "image/jpeg",
        _ => {
            return Err(InputError::UnsupportedImageFormat {
                path: path.to_path_buf(),
            });
        }
    };
    // Decoded for the preview only; the original bytes are what gets sent.
    let decoded = image::load_from_memory(&bytes).map_err(image_error)?;

    Ok(UserInput::Image {
        width: decoded.width(),
        height: decoded.height(),
        mime_type: mime_type.to_string(),
        bytes,
    })
}

fn audio_mime_for_extension(extension: &str) -> &'static str {
    match extension {
        "mp3" => "audio/mpeg",
        "m4a" => "audio/x-m4a",
        "ogg" => "audio/ogg",
        _ => "audio/wav",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file(label: &str, extension: &str, bytes: &[u8]) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let path = std::env::temp_dir().join(format!("advisor-input-{label}-{nanos}.{extension}"));
        fs::write(&path, bytes).expect("temp file should be writable");
        path
    }

    fn temp_png(label: &str, width: u32, height: u32) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let path = std::env::temp_dir().join(format!("advisor-input-{label}-{nanos}.png"));
        image::RgbImage::new(width, height)
            .save(&path)
            .expect("png should be writable");
        path
    }

    #[test]
    fn nothing_provided_is_no_input() {
        let err = InputSources::default().select().unwrap_err();
        assert!(matches!(err, InputError::NoInput));
    }

    #[test]
    fn blank_text_counts_as_absent() {
        let sources = InputSources {
            text: Some("  \n\t".to_string()),
            ..Default::default()
        };
        assert!(matches!(sources.select(), Err(InputError::NoInput)));
    }

    #[test]
    fn non_blank_text_is_sent_unchanged() {
        let sources = InputSources {
            text: Some("  Está caro demais.\n".to_string()),
            ..Default::default()
        };
        assert_eq!(
            sources.select().unwrap(),
            UserInput::Text("  Está caro demais.\n".to_string())
        );
    }

    #[test]
    fn image_replaces_text_and_keeps_original_bytes() {
        let path = temp_png("image", 4, 3);
        let on_disk = fs::read(&path).unwrap();
        let sources = InputSources {
            text: Some("texto".to_string()),
            image: Some(path),
            ..Default::default()
        };

        match sources.select().unwrap() {
            UserInput::Image {
                bytes,
                mime_type,
                width,
                height,
            } => {
                assert_eq!(bytes, on_disk);
                assert_eq!(mime_type, "image/png");
                assert_eq!((width, height), (4, 3));
            }
            other => panic!("expected image, got {other:?}"),
        }
    }

    #[test]
    fn audio_upload_replaces_image() {
        let image = temp_png("under-audio", 1, 1);
        let audio = temp_file("upload", "mp3", b"ID3fake");
        let sources = InputSources {
            image: Some(image),
            audio: Some(audio),
            ..Default::default()
        };
        assert_eq!(
            sources.select().unwrap(),
            UserInput::Audio {
                bytes: b"ID3fake".to_vec(),
                mime_type: "audio/mpeg".to_string(),
            }
        );
    }

    #[test]
    fn recording_wins_over_upload_with_fixed_mime() {
        let recording = temp_file("recording", "webm", b"RIFFrecorded");
        let upload = temp_file("upload", "ogg", b"OggSuploaded");
        let sources = InputSources {
            recording: Some(recording),
            audio: Some(upload),
            audio_mime: Some("audio/ogg".to_string()),
            ..Default::default()
        };
        assert_eq!(
            sources.select().unwrap(),
            UserInput::Audio {
                bytes: b"RIFFrecorded".to_vec(),
                mime_type: RECORDING_MIME_TYPE.to_string(),
            }
        );
    }

    #[test]
    fn declared_audio_mime_is_carried_through() {
        let upload = temp_file("declared", "M4A", b"....ftypM4A");
        let sources = InputSources {
            audio: Some(upload),
            audio_mime: Some("audio/mp4".to_string()),
            ..Default::default()
        };
        let input = sources.select().unwrap();
        assert_eq!(
            input,
            UserInput::Audio {
                bytes: b"....ftypM4A".to_vec(),
                mime_type: "audio/mp4".to_string(),
            }
        );
        assert_eq!(input.preview(), "audio: audio/mp4, 11 bytes");
    }

    #[test]
    fn audio_extension_must_be_allowed() {
        let upload = temp_file("flac", "flac", b"fLaC");
        let sources = InputSources {
            audio: Some(upload),
            ..Default::default()
        };
        let err = sources.select().unwrap_err();
        assert!(matches!(err, InputError::UnsupportedExtension { .. }));
        assert!(err.to_string().contains("wav, mp3, m4a, ogg"));
    }

    #[test]
    fn image_with_wrong_content_is_rejected() {
        let path = temp_file("not-an-image", "png", b"definitely not a png");
        let sources = InputSources {
            image: Some(path),
            ..Default::default()
        };
        assert!(matches!(
            sources.select(),
            Err(InputError::Image { .. })
        ));
    }

    #[test]
    fn missing_file_reports_path() {
        let sources = InputSources {
            recording: Some(PathBuf::from("/nonexistent/advisor/rec.wav")),
            ..Default::default()
        };
        let err = sources.select().unwrap_err();
        assert!(err.to_string().contains("/nonexistent/advisor/rec.wav"));
    }
}
