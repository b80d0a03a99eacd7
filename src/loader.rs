//! Desired-state loading: walk a configuration tree and parse auth-mount
//! declarations out of it.

use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::config::{DesiredMount, EnableAuthOptions};
use crate::error::{Error, Result};

/// Files under this relative prefix declare auth mounts. Anything else in
/// the tree is not handled yet and is skipped, not rejected.
const AUTH_MOUNT_PREFIX: &str = "sys/auth";

/// One regular file found under the configuration root.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    /// Path relative to the walked root
    pub relative_path: PathBuf,
    pub file_name: String,
    pub content: String,
}

/// Lazily yields every regular file under `root`. Unreadable files come
/// back as per-file errors tagged with their path; the walk itself
/// continues past them.
pub fn walk_config_files(root: &Path) -> impl Iterator<Item = Result<ConfigFile>> {
    let root = root.to_path_buf();
    WalkDir::new(&root)
        .into_iter()
        .filter_map(move |entry| match entry {
            Ok(entry) if entry.file_type().is_file() => {
                Some(read_config_file(&root, entry.path()))
            }
            Ok(_) => None,
            Err(err) => {
                let path = err.path().unwrap_or(&root).to_path_buf();
                Some(Err(Error::Io {
                    path,
                    source: err.into(),
                }))
            }
        })
}

fn read_config_file(root: &Path, path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let relative_path = path.strip_prefix(root).unwrap_or(path).to_path_buf();
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(ConfigFile {
        relative_path,
        file_name,
        content,
    })
}

impl DesiredMount {
    /// Parse a walked file into a desired mount. `Ok(None)` means the file
    /// sits outside the `sys/auth` convention and carries no mount. The
    /// mount path is the file name with its extension stripped.
    pub fn from_file(file: &ConfigFile) -> Result<Option<DesiredMount>> {
        if !file.relative_path.starts_with(AUTH_MOUNT_PREFIX) {
            debug!(path = %file.relative_path.display(), "file can not be handled yet, skipping");
            return Ok(None);
        }

        let options: EnableAuthOptions =
            serde_json::from_str(&file.content).map_err(|source| Error::Parse {
                path: file.relative_path.clone(),
                source,
            })?;

        let path = Path::new(&file.file_name)
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| file.file_name.clone());

        Ok(Some(DesiredMount { path, options }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(relative: &str, content: &str) -> ConfigFile {
        let relative_path = PathBuf::from(relative);
        let file_name = relative_path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .into_owned();
        ConfigFile {
            relative_path,
            file_name,
            content: content.into(),
        }
    }

    #[test]
    fn auth_mount_file_parses_to_desired_mount() {
        let parsed = DesiredMount::from_file(&file(
            "sys/auth/approle.json",
            r#"{"type": "approle", "config": {"default_lease_ttl": "1h"}}"#,
        ))
        .unwrap()
        .expect("should produce a mount");
        assert_eq!(parsed.path, "approle");
        assert_eq!(parsed.options.auth_type, "approle");
        assert_eq!(parsed.options.config.default_lease_ttl, "1h");
    }

    #[test]
    fn file_outside_convention_is_skipped_without_error() {
        let parsed =
            DesiredMount::from_file(&file("sys/policy/foo.json", "not even json")).unwrap();
        assert!(parsed.is_none());
    }

    #[test]
    fn malformed_json_is_tagged_with_the_path() {
        let err = DesiredMount::from_file(&file("sys/auth/broken.json", "{")).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
        assert!(err.to_string().contains("sys/auth/broken.json"));
    }

    #[test]
    fn walk_yields_regular_files_with_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let auth_dir = dir.path().join("sys/auth");
        std::fs::create_dir_all(&auth_dir).unwrap();
        std::fs::write(auth_dir.join("approle.json"), r#"{"type": "approle"}"#).unwrap();
        std::fs::write(dir.path().join("README.md"), "docs").unwrap();

        let mut relative: Vec<_> = walk_config_files(dir.path())
            .map(|file| file.unwrap().relative_path)
            .collect();
        relative.sort();
        assert_eq!(
            relative,
            vec![PathBuf::from("README.md"), PathBuf::from("sys/auth/approle.json")]
        );
    }
}
