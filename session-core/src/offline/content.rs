use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Mutex;
use thiserror::Error;

use crate::error::SessionError;

/// A piece of constitution content, parsed from the composite ids the UI
/// uses: `"5"` is chapter 5, `"5.3"` is article 3 of chapter 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentRef {
    Chapter(u32),
    Article { chapter: u32, article: u32 },
}

impl ContentRef {
    /// The chapter that backs this content. Articles are not independently
    /// cached; their availability is their parent chapter's.
    pub fn chapter(&self) -> u32 {
        match self {
            ContentRef::Chapter(chapter) => *chapter,
            ContentRef::Article { chapter, .. } => *chapter,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid content id '{id}'")]
pub struct ContentIdError {
    pub id: String,
}

impl FromStr for ContentRef {
    type Err = ContentIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ContentIdError { id: s.to_string() };
        match s.split_once('.') {
            None => s.trim().parse().map(ContentRef::Chapter).map_err(|_| invalid()),
            Some((chapter, rest)) => {
                let chapter = chapter.trim().parse().map_err(|_| invalid())?;
                // Portion after the first separator may itself carry a
                // sub-article suffix; only the leading number matters.
                let article = rest
                    .split('.')
                    .next()
                    .unwrap_or_default()
                    .trim()
                    .parse()
                    .map_err(|_| invalid())?;
                Ok(ContentRef::Article { chapter, article })
            }
        }
    }
}

impl std::fmt::Display for ContentRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentRef::Chapter(chapter) => write!(f, "{}", chapter),
            ContentRef::Article { chapter, article } => write!(f, "{}.{}", chapter, article),
        }
    }
}

/// Persisted record for a downloaded chapter. Existence of the record is the
/// availability signal; `version` is recorded for a future revision check
/// but not enforced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChapterPayload {
    pub chapter: u32,
    pub title: String,
    pub body: serde_json::Value,
    #[serde(default)]
    pub version: Option<String>,
    pub saved_at: DateTime<Utc>,
}

/// Storage for explicitly-downloaded chapters. Reads are idempotent and
/// side-effect-free; multiple status indicators may query concurrently.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn store_chapter(&self, payload: ChapterPayload) -> Result<(), SessionError>;
    async fn remove_chapter(&self, chapter: u32) -> Result<(), SessionError>;
    async fn is_chapter_available(&self, chapter: u32) -> Result<bool, SessionError>;
    async fn list_chapters(&self) -> Result<Vec<u32>, SessionError>;
}

/// Availability for any content reference. Articles delegate to their parent
/// chapter. Storage failures resolve to unavailable; unavailability is a
/// valid answer, not an error.
pub async fn is_available_offline(store: &dyn ContentStore, content: &ContentRef) -> bool {
    match store.is_chapter_available(content.chapter()).await {
        Ok(available) => available,
        Err(e) => {
            tracing::warn!(
                chapter = content.chapter(),
                error = %e,
                "Offline availability check failed, treating as unavailable"
            );
            false
        }
    }
}

/// One JSON document per chapter under a content directory.
pub struct FileContentStore {
    dir: PathBuf,
}

impl FileContentStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn chapter_path(&self, chapter: u32) -> PathBuf {
        self.dir.join(format!("chapter-{}.json", chapter))
    }
}

#[async_trait]
impl ContentStore for FileContentStore {
    async fn store_chapter(&self, payload: ChapterPayload) -> Result<(), SessionError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.chapter_path(payload.chapter);
        let bytes = serde_json::to_vec_pretty(&payload)?;
        tokio::fs::write(&path, bytes).await?;
        tracing::info!(chapter = payload.chapter, path = %path.display(), "Chapter saved for offline use");
        Ok(())
    }

    async fn remove_chapter(&self, chapter: u32) -> Result<(), SessionError> {
        match tokio::fs::remove_file(self.chapter_path(chapter)).await {
            Ok(()) => {
                tracing::info!(chapter, "Offline chapter removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn is_chapter_available(&self, chapter: u32) -> Result<bool, SessionError> {
        Ok(tokio::fs::try_exists(self.chapter_path(chapter)).await?)
    }

    async fn list_chapters(&self) -> Result<Vec<u32>, SessionError> {
        let mut chapters = Vec::new();
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(chapters),
            Err(e) => return Err(e.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some(number) = name
                .strip_prefix("chapter-")
                .and_then(|rest| rest.strip_suffix(".json"))
            {
                if let Ok(chapter) = number.parse() {
                    chapters.push(chapter);
                }
            }
        }
        chapters.sort_unstable();
        Ok(chapters)
    }
}

/// In-memory store for tests and ephemeral embedders.
#[derive(Default)]
pub struct MemoryContentStore {
    chapters: Mutex<HashMap<u32, ChapterPayload>>,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn store_chapter(&self, payload: ChapterPayload) -> Result<(), SessionError> {
        self.chapters
            .lock()
            .expect("content lock poisoned")
            .insert(payload.chapter, payload);
        Ok(())
    }

    async fn remove_chapter(&self, chapter: u32) -> Result<(), SessionError> {
        self.chapters
            .lock()
            .expect("content lock poisoned")
            .remove(&chapter);
        Ok(())
    }

    async fn is_chapter_available(&self, chapter: u32) -> Result<bool, SessionError> {
        Ok(self
            .chapters
            .lock()
            .expect("content lock poisoned")
            .contains_key(&chapter))
    }

    async fn list_chapters(&self) -> Result<Vec<u32>, SessionError> {
        let mut chapters: Vec<u32> = self
            .chapters
            .lock()
            .expect("content lock poisoned")
            .keys()
            .copied()
            .collect();
        chapters.sort_unstable();
        Ok(chapters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(chapter: u32) -> ChapterPayload {
        ChapterPayload {
            chapter,
            title: format!("Chapter {}", chapter),
            body: serde_json::json!({ "articles": [] }),
            version: None,
            saved_at: Utc::now(),
        }
    }

    #[test]
    fn chapter_ids_parse() {
        assert_eq!("5".parse::<ContentRef>().unwrap(), ContentRef::Chapter(5));
        assert_eq!(" 12 ".parse::<ContentRef>().unwrap(), ContentRef::Chapter(12));
    }

    #[test]
    fn composite_ids_parse_as_articles() {
        assert_eq!(
            "5.3".parse::<ContentRef>().unwrap(),
            ContentRef::Article {
                chapter: 5,
                article: 3
            }
        );
        // Only the portion before the first separator names the chapter.
        assert_eq!(
            "5.3.1".parse::<ContentRef>().unwrap().chapter(),
            5
        );
    }

    #[test]
    fn garbage_ids_are_rejected() {
        assert!("".parse::<ContentRef>().is_err());
        assert!("five".parse::<ContentRef>().is_err());
        assert!("5.x".parse::<ContentRef>().is_err());
    }

    #[tokio::test]
    async fn article_availability_delegates_to_the_chapter() {
        let store = MemoryContentStore::new();
        store.store_chapter(payload(5)).await.unwrap();

        let chapter: ContentRef = "5".parse().unwrap();
        let article: ContentRef = "5.3".parse().unwrap();
        let other_article: ContentRef = "6.1".parse().unwrap();

        assert!(is_available_offline(&store, &chapter).await);
        assert!(is_available_offline(&store, &article).await);
        assert!(!is_available_offline(&store, &other_article).await);
    }

    #[tokio::test]
    async fn file_store_roundtrip_and_listing() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileContentStore::new(dir.path());

        assert!(!store.is_chapter_available(4).await.unwrap());
        store.store_chapter(payload(4)).await.unwrap();
        store.store_chapter(payload(1)).await.unwrap();

        assert!(store.is_chapter_available(4).await.unwrap());
        assert_eq!(store.list_chapters().await.unwrap(), vec![1, 4]);

        store.remove_chapter(4).await.unwrap();
        assert!(!store.is_chapter_available(4).await.unwrap());
        // Removing twice is fine.
        store.remove_chapter(4).await.unwrap();
    }

    #[tokio::test]
    async fn storage_failure_resolves_to_unavailable() {
        struct BrokenStore;

        #[async_trait]
        impl ContentStore for BrokenStore {
            async fn store_chapter(&self, _: ChapterPayload) -> Result<(), SessionError> {
                unimplemented!()
            }
            async fn remove_chapter(&self, _: u32) -> Result<(), SessionError> {
                unimplemented!()
            }
            async fn is_chapter_available(&self, _: u32) -> Result<bool, SessionError> {
                Err(SessionError::Storage(std::io::Error::other("disk on fire")))
            }
            async fn list_chapters(&self) -> Result<Vec<u32>, SessionError> {
                unimplemented!()
            }
        }

        let content: ContentRef = "2".parse().unwrap();
        assert!(!is_available_offline(&BrokenStore, &content).await);
    }
}
