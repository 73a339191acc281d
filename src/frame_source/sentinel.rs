use log::debug;
use std::{
    fs,
    path::{Path, PathBuf},
    time::SystemTime,
};

/// Watches the sentinel image dropped by the camera software.
///
/// A file is reported once per distinct `(path, mtime)` signature; a missing
/// file is not an error.
#[derive(Debug)]
pub(crate) struct SentinelWatcher {
    path: PathBuf,
    last_signature: Option<(PathBuf, SystemTime)>,
}

impl SentinelWatcher {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self {
            path,
            last_signature: None,
        }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Point at a different file and forget the last signature
    pub(crate) fn retarget(&mut self, path: PathBuf) {
        if path != self.path {
            self.path = path;
            self.last_signature = None;
        }
    }

    fn signature(&self) -> Option<(PathBuf, SystemTime)> {
        let modified = fs::metadata(&self.path).and_then(|m| m.modified()).ok()?;
        Some((self.path.clone(), modified))
    }

    /// Bytes of the sentinel if its signature changed since the last read
    pub(crate) fn poll(&mut self) -> Option<Vec<u8>> {
        let signature = self.signature()?;
        if self.last_signature.as_ref() == Some(&signature) {
            return None;
        }
        self.last_signature = Some(signature);
        self.read()
    }

    /// Bytes of the sentinel regardless of its signature
    pub(crate) fn read_forced(&mut self) -> Option<Vec<u8>> {
        self.last_signature = self.signature();
        if self.last_signature.is_none() {
            return None;
        }
        self.read()
    }

    fn read(&self) -> Option<Vec<u8>> {
        match fs::read(&self.path) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                debug!("Failed to read {}: {}", self.path.display(), e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    fn scratch_dir(name: &str) -> TempDir {
        tempfile::Builder::new()
            .prefix(&format!("photobooth-sentinel-{name}-"))
            .tempdir()
            .unwrap()
    }

    #[test]
    fn test_missing_file_is_silent() {
        let dir = scratch_dir("missing");
        let mut watcher = SentinelWatcher::new(dir.path().join("Disconnected.jpg"));
        assert!(watcher.poll().is_none());
        assert!(watcher.read_forced().is_none());
    }

    #[test]
    fn test_reports_once_per_signature() {
        let dir = scratch_dir("signature");
        let path = dir.path().join("Disconnected.jpg");
        fs::write(&path, b"one").unwrap();

        let mut watcher = SentinelWatcher::new(path.clone());
        assert_eq!(watcher.poll().as_deref(), Some(&b"one"[..]));
        assert!(watcher.poll().is_none());

        fs::write(&path, b"two").unwrap();
        let file = fs::File::options().write(true).open(&path).unwrap();
        file.set_modified(SystemTime::now() + Duration::from_secs(5)).unwrap();
        drop(file);
        assert_eq!(watcher.poll().as_deref(), Some(&b"two"[..]));
        assert!(watcher.poll().is_none());
    }

    #[test]
    fn test_forced_read_consumes_signature() {
        let dir = scratch_dir("forced");
        let path = dir.path().join("Disconnected.jpg");
        fs::write(&path, b"img").unwrap();

        let mut watcher = SentinelWatcher::new(path);
        assert!(watcher.read_forced().is_some());
        assert!(watcher.poll().is_none());
        assert!(watcher.read_forced().is_some());
    }

    #[test]
    fn test_retarget_resets_signature() {
        let dir = scratch_dir("retarget");
        let a = dir.path().join("a.jpg");
        let b = dir.path().join("b.jpg");
        fs::write(&a, b"a").unwrap();
        fs::write(&b, b"b").unwrap();

        let mut watcher = SentinelWatcher::new(a);
        assert!(watcher.poll().is_some());
        watcher.retarget(b.clone());
        assert_eq!(watcher.path(), b.as_path());
        assert_eq!(watcher.poll().as_deref(), Some(&b"b"[..]));
    }
}
