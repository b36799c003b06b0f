//! # Media Utilities
//!
//! Classification of generated assets, lightbox state, saving downloads,
//! and the optional dictation capability.

use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{info, warn};

const VIDEO_EXTENSIONS: [&str; 3] = ["mp4", "webm", "mov"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

/// Strips query string and fragment, returning the path part of a URL.
fn url_path(url: &str) -> &str {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    &url[..end]
}

/// Lowercased extension of the last path segment, if any.
fn extension(url: &str) -> Option<String> {
    let path = url_path(url);
    let last_segment = path.rsplit('/').next().unwrap_or(path);
    last_segment
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
}

/// True when the URL names a real video file (`.mp4`, `.webm`, `.mov`).
pub fn is_video_url(url: &str) -> bool {
    extension(url).is_some_and(|ext| VIDEO_EXTENSIONS.contains(&ext.as_str()))
}

pub fn media_kind(url: &str) -> MediaKind {
    if is_video_url(url) {
        MediaKind::Video
    } else {
        MediaKind::Image
    }
}

/// A full-size image viewer. Never opened for video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lightbox {
    pub url: String,
    pub title: String,
}

impl Lightbox {
    pub fn open(url: &str, title: &str) -> Option<Self> {
        if is_video_url(url) {
            return None;
        }
        Some(Self {
            url: url.to_string(),
            title: title.to_string(),
        })
    }
}

/// `vizzy-<timestamp>-<tag>.<ext>`, keeping the asset's extension (PNG when unknown).
pub fn download_file_name(url: &str, now: DateTime<Utc>, tag: &str) -> String {
    let ext = extension(url)
        .filter(|ext| ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| "png".to_string());
    format!("vizzy-{}-{}.{}", now.format("%Y%m%d-%H%M%S%3f"), tag, ext)
}

/// Writes downloaded bytes into `dir`, creating it if needed.
pub async fn save_download(dir: &Path, url: &str, bytes: &[u8]) -> std::io::Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let id = uuid::Uuid::new_v4().simple().to_string();
    let path = dir.join(download_file_name(url, Utc::now(), &id[..8]));
    tokio::fs::write(&path, bytes).await?;
    info!("Saved {} ({} bytes) to {}", url, bytes.len(), path.display());
    Ok(path)
}

// ============================================================================
// Dictation
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum DictationError {
    /// The capture command could not be started or exited unsuccessfully.
    Capture(String),
    /// Nothing was recognized.
    Empty,
}

impl fmt::Display for DictationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DictationError::Capture(msg) => write!(f, "dictation failed: {msg}"),
            DictationError::Empty => write!(f, "no speech recognized"),
        }
    }
}

impl std::error::Error for DictationError {}

/// Speech-to-text. Optional: when no implementation is detected the
/// dictation control is hidden.
#[async_trait]
pub trait Dictation: Send + Sync {
    fn name(&self) -> &str;

    /// Records one utterance and returns its transcript.
    async fn listen(&self) -> Result<String, DictationError>;
}

/// Runs an external recorder/transcriber and reads the transcript from stdout.
pub struct CommandDictation {
    program: String,
    args: Vec<String>,
}

impl CommandDictation {
    pub fn new(program: String, args: Vec<String>) -> Self {
        Self { program, args }
    }
}

#[async_trait]
impl Dictation for CommandDictation {
    fn name(&self) -> &str {
        &self.program
    }

    async fn listen(&self) -> Result<String, DictationError> {
        info!("Starting dictation via {}", self.program);
        let output = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .output()
            .await
            .map_err(|e| DictationError::Capture(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("Dictation command exited with {}: {}", output.status, stderr.trim());
            return Err(DictationError::Capture(format!("exit status {}", output.status)));
        }

        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if text.is_empty() {
            return Err(DictationError::Empty);
        }
        Ok(text)
    }
}

/// Feature detection: a dictation backend exists only if a command is
/// configured and can be found. Absence is not an error.
pub fn detect_dictation(command: Option<&[String]>) -> Option<Box<dyn Dictation>> {
    let (program, args) = command?.split_first()?;
    let program_path = Path::new(program);
    let found = if program_path.components().count() > 1 {
        program_path.is_file()
    } else {
        std::env::var_os("PATH")
            .map(|paths| std::env::split_paths(&paths).any(|dir| dir.join(program).is_file()))
            .unwrap_or(false)
    };

    if !found {
        warn!("Dictation command '{}' not found; dictation disabled", program);
        return None;
    }

    info!("Dictation enabled via {}", program);
    Some(Box::new(CommandDictation::new(program.clone(), args.to_vec())))
}
