//! Storage collaborators: an in-memory store and a read-only directory of `.txt` files.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::traits::DocumentStore;
use crate::types::{Document, DocumentId};

#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    docs: RwLock<Vec<Document>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self { Self::default() }

    /// Store `content` under `name`. Ids start at 1 and increase.
    ///
    /// Returns `Ok(None)` when a document with the same name already exists;
    /// the first upload is kept.
    pub fn store(&self, name: &str, content: &str) -> Result<Option<Document>> {
        let mut docs = self.docs.write().map_err(|_| Error::StorageUnavailable("document store lock poisoned".into()))?;
        if docs.iter().any(|d| d.name == name) {
            debug!(name, "skipping duplicate document name");
            return Ok(None);
        }
        let id = docs.last().map_or(1, |d| d.id + 1);
        let doc = Document::new(id, name, content);
        docs.push(doc.clone());
        Ok(Some(doc))
    }

    pub fn len(&self) -> Result<usize> {
        let docs = self.docs.read().map_err(|_| Error::StorageUnavailable("document store lock poisoned".into()))?;
        Ok(docs.len())
    }

    pub fn is_empty(&self) -> Result<bool> { Ok(self.len()? == 0) }
}

impl DocumentStore for InMemoryDocumentStore {
    fn list_documents(&self) -> Result<Vec<Document>> {
        let docs = self.docs.read().map_err(|_| Error::StorageUnavailable("document store lock poisoned".into()))?;
        Ok(docs.clone())
    }
}

/// Treats every `*.txt` file under `root` as a stored document.
///
/// Files are listed recursively and sorted by path, so ids (1-based positions)
/// are stable for an unchanged directory.
#[derive(Debug, Clone)]
pub struct DirectoryDocumentStore {
    root: PathBuf,
}

impl DirectoryDocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self { Self { root: root.into() } }

    pub fn root(&self) -> &Path { &self.root }

    /// An entry that cannot be read (unreadable directory, broken link)
    /// fails the whole listing rather than dropping its documents.
    fn list_txt_files(&self) -> Result<Vec<PathBuf>> {
        let mut txt_files = Vec::new();
        for entry in walkdir::WalkDir::new(&self.root).follow_links(true) {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(self.root.as_path()).display().to_string();
                warn!(path = %path, error = %e, "cannot read document directory entry");
                Error::StorageUnavailable(format!("{}: {}", path, e))
            })?;
            if !entry.file_type().is_file() { continue; }
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) == Some("txt") { txt_files.push(path.to_path_buf()); }
        }
        txt_files.sort();
        Ok(txt_files)
    }

    fn read_file_content(file_path: &Path) -> Result<String> {
        match fs::read_to_string(file_path) {
            Ok(content) => Ok(content),
            Err(_) => {
                let bytes = fs::read(file_path)
                    .map_err(|e| Error::StorageUnavailable(format!("{}: {}", file_path.display(), e)))?;
                warn!(path = %file_path.display(), "non-UTF-8 document decoded lossily");
                Ok(String::from_utf8_lossy(&bytes).into_owned())
            }
        }
    }
}

impl DocumentStore for DirectoryDocumentStore {
    fn list_documents(&self) -> Result<Vec<Document>> {
        if !self.root.is_dir() {
            return Err(Error::StorageUnavailable(format!("document directory {} does not exist", self.root.display())));
        }
        let files = self.list_txt_files()?;
        let mut docs = Vec::with_capacity(files.len());
        for (position, path) in files.iter().enumerate() {
            let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
            let content = Self::read_file_content(path)?;
            docs.push(Document::new(position as DocumentId + 1, name, content));
        }
        debug!(root = %self.root.display(), documents = docs.len(), "listed directory store");
        Ok(docs)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn poisoned_store_reports_storage_unavailable_everywhere() {
        let store = Arc::new(InMemoryDocumentStore::new());
        store.store("a.txt", "alpha").unwrap();

        let writer = Arc::clone(&store);
        let joined = thread::spawn(move || {
            let _guard = writer.docs.write().unwrap();
            panic!("poison the lock");
        })
        .join();
        assert!(joined.is_err());

        assert!(matches!(store.len(), Err(Error::StorageUnavailable(_))));
        assert!(matches!(store.is_empty(), Err(Error::StorageUnavailable(_))));
        assert!(matches!(store.list_documents(), Err(Error::StorageUnavailable(_))));
        assert!(matches!(store.store("b.txt", "bravo"), Err(Error::StorageUnavailable(_))));
    }
}
