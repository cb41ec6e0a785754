use crate::channels::ContentStream;
use crate::error::{Error, Result};
use futures::StreamExt;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

pub const DOWNLOAD_ROUTE: &str = "/downloaded";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
    Audio,
}

impl MediaKind {
    pub fn extension(self) -> &'static str {
        match self {
            MediaKind::Image => "jpg",
            MediaKind::Video => "mp4",
            MediaKind::Audio => "m4a",
        }
    }
}

#[derive(Debug, Clone)]
pub struct MediaStore {
    dir: PathBuf,
    base_url: Option<String>,
}

impl MediaStore {
    pub fn new(dir: impl Into<PathBuf>, base_url: Option<String>) -> Self {
        Self {
            dir: dir.into(),
            base_url: base_url
                .map(|url| url.trim().trim_end_matches('/').to_string())
                .filter(|url| !url.is_empty()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, message_id: &str, kind: MediaKind) -> PathBuf {
        self.dir.join(format!("{message_id}.{}", kind.extension()))
    }

    /// Public URL of a persisted file: `<base_url>/downloaded/<file name>`.
    pub fn public_url(&self, path: &Path) -> Result<String> {
        let base = self
            .base_url
            .as_deref()
            .ok_or_else(|| Error::Config("public base url is not set".to_string()))?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::Config(format!("no file name in {}", path.display())))?;
        Ok(format!("{base}{DOWNLOAD_ROUTE}/{name}"))
    }

    pub async fn persist(
        &self,
        message_id: &str,
        kind: MediaKind,
        mut stream: ContentStream,
    ) -> Result<PathBuf> {
        ensure_file_token(message_id)?;
        let path = self.path_for(message_id, kind);

        fs::create_dir_all(&self.dir)
            .await
            .map_err(|err| Error::content_fetch(message_id, err))?;
        let mut file = fs::File::create(&path)
            .await
            .map_err(|err| Error::content_fetch(message_id, err))?;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk)
                .await
                .map_err(|err| Error::content_fetch(message_id, err))?;
        }
        file.flush()
            .await
            .map_err(|err| Error::content_fetch(message_id, err))?;

        Ok(path)
    }
}

/// Message ids become file names, so only plain tokens are accepted.
pub fn ensure_file_token(message_id: &str) -> Result<()> {
    let plain = !message_id.is_empty()
        && message_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if plain {
        Ok(())
    } else {
        Err(Error::content_fetch(message_id, "message id is not a plain token"))
    }
}
