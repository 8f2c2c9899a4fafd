use anyhow::{Result, bail};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Where uploaded files live. Storage paths are opaque to the core.
pub trait MediaStore: Send + Sync {
    /// Persist `bytes` under a name derived from `suggested_name` and return
    /// the storage path. Never overwrites an existing file.
    fn save(&self, bytes: &[u8], suggested_name: &str) -> Result<String>;

    fn delete(&self, storage_path: &str) -> Result<()>;
}

/// Best-effort removal of files whose rows are already gone.
pub(crate) fn discard_files(store: &dyn MediaStore, paths: &[String]) {
    for path in paths {
        if let Err(e) = store.delete(path) {
            warn!("Failed to delete media file {}: {:#}", path, e);
        }
    }
}

const MAX_NAME_ATTEMPTS: u32 = 10_000;

/// Flat directory of uploads. The storage path is the file name inside
/// `dir`; collisions get a ` (n)` suffix before the extension.
pub struct FsMediaStore {
    dir: PathBuf,
}

impl FsMediaStore {
    pub fn new(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir)?;
        info!("Media storage directory: {}", dir.display());
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn file_path(&self, storage_path: &str) -> Result<PathBuf> {
        if storage_path.is_empty()
            || storage_path.contains(['/', '\\'])
            || storage_path == "."
            || storage_path == ".."
        {
            bail!("Invalid storage path {:?}", storage_path);
        }
        Ok(self.dir.join(storage_path))
    }
}

impl MediaStore for FsMediaStore {
    fn save(&self, bytes: &[u8], suggested_name: &str) -> Result<String> {
        let base = sanitize_name(suggested_name);

        for counter in 0..MAX_NAME_ATTEMPTS {
            let name = numbered_name(&base, counter);
            let path = self.dir.join(&name);
            let mut file = match fs::OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            };
            if let Err(e) = file.write_all(bytes).and_then(|_| file.flush()) {
                drop(file);
                let _ = fs::remove_file(&path);
                return Err(e.into());
            }
            info!("Saved media file {} ({} bytes)", name, bytes.len());
            return Ok(name);
        }

        bail!("No free file name for {:?}", base)
    }

    fn delete(&self, storage_path: &str) -> Result<()> {
        let path = self.file_path(storage_path)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                info!("Deleted media file {}", storage_path);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("Media file {} already gone", storage_path);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Keep only the final path component so uploads cannot escape the directory.
fn sanitize_name(suggested: &str) -> String {
    let last = suggested.rsplit(['/', '\\']).next().unwrap_or("").trim();
    if last.is_empty() || last == "." || last == ".." {
        "upload".to_string()
    } else {
        last.to_string()
    }
}

/// `cat.jpg`, `cat (1).jpg`, `cat (2).jpg`, ...
fn numbered_name(base: &str, counter: u32) -> String {
    if counter == 0 {
        return base.to_string();
    }
    match base.rfind('.') {
        Some(dot) if dot > 0 => format!("{} ({}){}", &base[..dot], counter, &base[dot..]),
        _ => format!("{} ({})", base, counter),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store(tag: &str) -> FsMediaStore {
        let dir = std::env::temp_dir().join(format!("chirp_media_{}_{}", tag, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        FsMediaStore::new(dir).unwrap()
    }

    #[test]
    fn numbered_names() {
        assert_eq!(numbered_name("cat.jpg", 0), "cat.jpg");
        assert_eq!(numbered_name("cat.jpg", 2), "cat (2).jpg");
        assert_eq!(numbered_name("README", 1), "README (1)");
        assert_eq!(numbered_name(".env", 1), ".env (1)");
    }

    #[test]
    fn sanitize_strips_directories() {
        assert_eq!(sanitize_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_name("C:\\photos\\me.png"), "me.png");
        assert_eq!(sanitize_name(""), "upload");
        assert_eq!(sanitize_name("dir/"), "upload");
    }

    #[test]
    fn save_never_overwrites() {
        let store = temp_store("collide");

        let first = store.save(b"one", "cat.jpg").unwrap();
        let second = store.save(b"two", "cat.jpg").unwrap();
        let third = store.save(b"three", "cat.jpg").unwrap();

        assert_eq!(first, "cat.jpg");
        assert_eq!(second, "cat (1).jpg");
        assert_eq!(third, "cat (2).jpg");
        assert_eq!(fs::read(store.dir().join(&first)).unwrap(), b"one");
        assert_eq!(fs::read(store.dir().join(&second)).unwrap(), b"two");

        let _ = fs::remove_dir_all(store.dir());
    }

    #[test]
    fn delete_is_idempotent_and_rejects_traversal() {
        let store = temp_store("delete");
        let path = store.save(b"x", "a.txt").unwrap();

        store.delete(&path).unwrap();
        assert!(!store.dir().join(&path).exists());
        store.delete(&path).unwrap();

        assert!(store.delete("../outside").is_err());
        assert!(store.delete("..").is_err());

        let _ = fs::remove_dir_all(store.dir());
    }
}
