//! Artifact persistence - decoded images and request bodies
//!
//! Layout under the configured root:
//!
//! ```text
//! <root>/image/<case>_<style>.<ext>
//! <root>/body-json/<case>_request_<style>.json
//! ```
//!
//! File names depend only on (case, style, extension), so a rerun
//! overwrites the previous artifact instead of adding a new one.

use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::E2eResult;
use crate::payload::{ImageStyle, RenderKind};

pub const IMAGE_DIR: &str = "image";
pub const BODY_JSON_DIR: &str = "body-json";

const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "webp"];

/// Writes artifacts below an explicit root directory
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    root: PathBuf,
}

impl ArtifactWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn image_dir(&self) -> PathBuf {
        self.root.join(IMAGE_DIR)
    }

    pub fn body_json_dir(&self) -> PathBuf {
        self.root.join(BODY_JSON_DIR)
    }

    /// Decode a base64 image (data-URI prefix allowed) into `<root>/image/<filename>`
    pub fn save_image(&self, base64_data: &str, filename: &str) -> E2eResult<PathBuf> {
        let bytes = decode_image(base64_data)?;
        let dir = self.image_dir();
        std::fs::create_dir_all(&dir)?;

        let path = dir.join(filename);
        std::fs::write(&path, &bytes)?;

        info!(
            "Image saved: {}/{}/{} ({} bytes)",
            self.root.display(),
            IMAGE_DIR,
            filename,
            bytes.len()
        );
        Ok(path)
    }

    /// Serialize a document as indented UTF-8 JSON into `<root>/body-json/<filename>`
    pub fn save_json<T: Serialize + ?Sized>(
        &self,
        document: &T,
        filename: &str,
    ) -> E2eResult<PathBuf> {
        let json = serde_json::to_string_pretty(document)?;
        let dir = self.body_json_dir();
        std::fs::create_dir_all(&dir)?;

        let path = dir.join(filename);
        std::fs::write(&path, json)?;

        info!("Request body saved: {}/{}/{}", self.root.display(), BODY_JSON_DIR, filename);
        Ok(path)
    }

    /// Image artifacts currently on disk, sorted by file name
    pub fn list_images(&self) -> Vec<(PathBuf, u64)> {
        let dir = self.image_dir();
        if !dir.exists() {
            return Vec::new();
        }

        let images: Vec<(PathBuf, u64)> = walkdir::WalkDir::new(&dir)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| {
                e.path()
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                    .unwrap_or(false)
            })
            .map(|e| {
                let size = e.metadata().map(|m| m.len()).unwrap_or(0);
                (e.into_path(), size)
            })
            .collect();

        debug!("Found {} image artifact(s) in {}", images.len(), dir.display());
        images
    }
}

/// Strip an optional data-URI header and decode standard base64.
///
/// Everything up to and including the first comma is dropped when a
/// comma is present. ASCII whitespace is ignored, so line-wrapped
/// payloads decode too.
pub fn decode_image(base64_data: &str) -> E2eResult<Vec<u8>> {
    let payload = match base64_data.split_once(',') {
        Some((_, rest)) => rest,
        None => base64_data,
    };
    let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    Ok(STANDARD.decode(compact)?)
}

/// `<case>_<style>.<ext>`
pub fn image_filename(kind: RenderKind, style: ImageStyle, extension: &str) -> String {
    format!("{}_{}.{}", kind.case_name(), style.key(), extension)
}

/// `<case>_request_<style>.json`
pub fn request_filename(kind: RenderKind, style: ImageStyle) -> String {
    format!("{}_request_{}.json", kind.case_name(), style.key())
}
