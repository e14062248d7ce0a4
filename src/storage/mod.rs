use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{LetterMergeError, Result};

/// Where generated documents are published.
pub trait ArtifactStore {
    /// Store `bytes` as `file_name`, grant read access to anyone holding the
    /// link, and return that link. An existing artifact of the same name is
    /// replaced.
    fn publish(&self, file_name: &str, bytes: &[u8]) -> Result<String>;
}

/// A shared folder on the local filesystem, served under a public base URL.
///
/// The folder is created (if absent) once, when the store is opened.
#[derive(Debug, Clone)]
pub struct LocalFolderStore {
    folder: PathBuf,
    folder_name: String,
    public_base_url: String,
}

impl LocalFolderStore {
    pub fn open(root: &Path, folder_name: &str, public_base_url: &str) -> Result<Self> {
        let folder = root.join(folder_name);
        std::fs::create_dir_all(&folder).map_err(|source| LetterMergeError::Storage {
            path: folder.clone(),
            source,
        })?;
        debug!(folder = %folder.display(), "artifact folder ready");
        Ok(Self {
            folder,
            folder_name: folder_name.to_string(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// Public link for an artifact in this folder.
    pub fn link_for(&self, file_name: &str) -> String {
        format!(
            "{}/{}/{}",
            self.public_base_url,
            urlencoding::encode(&self.folder_name),
            urlencoding::encode(file_name)
        )
    }
}

impl ArtifactStore for LocalFolderStore {
    fn publish(&self, file_name: &str, bytes: &[u8]) -> Result<String> {
        let path = self.folder.join(file_name);
        let storage_err = |source| LetterMergeError::Storage {
            path: path.clone(),
            source,
        };
        std::fs::write(&path, bytes).map_err(storage_err)?;
        grant_link_read(&path).map_err(storage_err)?;
        Ok(self.link_for(file_name))
    }
}

#[cfg(unix)]
fn grant_link_read(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o644))
}

// Non-unix targets inherit the folder's ACL; nothing to widen per file.
#[cfg(not(unix))]
fn grant_link_read(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
