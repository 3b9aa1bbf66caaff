//! Local scratch copy of the document being processed

use std::path::{Path, PathBuf};

/// A scratch path keyed by message identifier. The file is removed when the
/// guard is dropped, whichever way processing ends.
///
/// Contents are written to a `.partial` sibling and renamed into place, so
/// `exists()` never reports a half-written copy.
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
    staging: PathBuf,
}

impl ScratchFile {
    /// Reserve the scratch path for a message. Identifiers that are not a
    /// single path segment are rejected.
    pub fn for_message(dir: &Path, id: &str) -> Result<Self, String> {
        if id.is_empty() || id.contains('/') || id.contains('\\') || id.contains("..") {
            return Err(format!("Message identifier is not a valid file name: '{}'", id));
        }
        Ok(Self {
            path: dir.join(id),
            staging: dir.join(format!("{}.partial", id)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    pub async fn write(&self, data: &[u8]) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.staging, data).await?;
        tokio::fs::rename(&self.staging, &self.path).await
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.staging);
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "Scratch file removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to remove scratch file"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn file_is_removed_on_drop() {
        let dir = tempdir().unwrap();
        let path = {
            let scratch = ScratchFile::for_message(dir.path(), "doc-1").unwrap();
            scratch.write(b"%PDF").await.unwrap();
            assert!(scratch.exists());
            scratch.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn write_leaves_only_the_final_file() {
        let dir = tempdir().unwrap();
        let scratch = ScratchFile::for_message(dir.path(), "doc-1").unwrap();
        scratch.write(b"%PDF").await.unwrap();

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["doc-1".to_string()]);
        assert_eq!(std::fs::read(scratch.path()).unwrap(), b"%PDF");
    }

    #[test]
    fn partial_copy_does_not_count_as_present() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("doc-1.partial"), b"%PD").unwrap();

        let scratch = ScratchFile::for_message(dir.path(), "doc-1").unwrap();
        assert!(!scratch.exists());
        drop(scratch);
        assert!(!dir.path().join("doc-1.partial").exists());
    }

    #[test]
    fn drop_without_file_is_quiet() {
        let dir = tempdir().unwrap();
        let scratch = ScratchFile::for_message(dir.path(), "never-written").unwrap();
        assert!(!scratch.exists());
        drop(scratch);
    }

    #[test]
    fn identifiers_must_be_file_names() {
        let dir = tempdir().unwrap();
        for id in ["", "../etc", "a/b", "a\\b"] {
            assert!(ScratchFile::for_message(dir.path(), id).is_err(), "{:?}", id);
        }
    }
}
