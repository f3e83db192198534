//! Screenshots captured during a run

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::portal::Portal;

/// Where a screenshot was taken
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureKind {
    /// A step failed
    Error,
    /// A wait ran out of time
    Timeout,
    /// The run completed
    Final,
}

impl CaptureKind {
    fn subdir(&self) -> Option<&'static str> {
        match self {
            CaptureKind::Error => Some("errors"),
            CaptureKind::Timeout => Some("timeouts"),
            CaptureKind::Final => None,
        }
    }
}

/// Screenshot directory of one run (`<output>/screenshots`)
#[derive(Debug, Clone)]
pub struct ScreenshotStore {
    root: PathBuf,
}

impl ScreenshotStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Store under the skill output directory
    pub fn for_output_dir(output_dir: &Path) -> Self {
        Self::new(output_dir.join("screenshots"))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Drop screenshots left by a previous run
    pub fn reset(&self) -> std::io::Result<()> {
        match std::fs::remove_dir_all(&self.root) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Timestamped path for a new capture
    pub fn next_path(&self, kind: CaptureKind) -> PathBuf {
        let dir = match kind.subdir() {
            Some(sub) => self.root.join(sub),
            None => self.root.clone(),
        };
        let stamp = chrono::Utc::now().timestamp_millis();
        let mut path = dir.join(format!("{}.png", stamp));
        let mut n = 1;
        while path.exists() {
            path = dir.join(format!("{}-{}.png", stamp, n));
            n += 1;
        }
        path
    }

    /// Capture the current page; failures are logged, never raised
    pub async fn capture<P: Portal + ?Sized>(&self, portal: &P, kind: CaptureKind) -> Option<PathBuf> {
        let png = match portal.screenshot().await {
            Ok(png) => png,
            Err(e) => {
                warn!("Could not capture screenshot: {}", e);
                return None;
            }
        };

        let path = self.next_path(kind);
        if let Some(parent) = path.parent() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                warn!("Could not create {}: {}", parent.display(), e);
                return None;
            }
        }
        match tokio::fs::write(&path, png).await {
            Ok(()) => {
                debug!("Screenshot saved to {}", path.display());
                Some(path)
            }
            Err(e) => {
                warn!("Could not write screenshot {}: {}", path.display(), e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_by_kind() {
        let store = ScreenshotStore::for_output_dir(Path::new("/out"));
        let error = store.next_path(CaptureKind::Error);
        let timeout = store.next_path(CaptureKind::Timeout);
        let last = store.next_path(CaptureKind::Final);
        assert_eq!(error.parent().unwrap(), Path::new("/out/screenshots/errors"));
        assert_eq!(timeout.parent().unwrap(), Path::new("/out/screenshots/timeouts"));
        assert_eq!(last.parent().unwrap(), Path::new("/out/screenshots"));
        assert_eq!(last.extension().unwrap(), "png");
    }

    #[test]
    fn test_next_path_avoids_collisions() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ScreenshotStore::new(tmp.path());
        let first = store.next_path(CaptureKind::Final);
        std::fs::write(&first, b"png").unwrap();
        let second = store.next_path(CaptureKind::Final);
        assert_ne!(first, second);
    }

    #[test]
    fn test_reset_missing_dir_is_ok() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ScreenshotStore::new(tmp.path().join("screenshots"));
        store.reset().unwrap();
        std::fs::create_dir_all(store.root().join("errors")).unwrap();
        store.reset().unwrap();
        assert!(!store.root().exists());
    }
}
