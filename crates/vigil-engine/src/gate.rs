//! Maintenance-mode gate.

use std::path::{Path, PathBuf};

/// Reports whether alert suppression is active, based on the existence of an
/// operator-managed marker file.
///
/// The marker is owned by the operator, not the engine; the gate only
/// observes it. Each check hits the filesystem freshly so removal of the
/// marker is seen on the very next evaluation, never a cached value.
#[derive(Debug, Clone)]
pub struct MaintenanceGate {
    marker: PathBuf,
}

impl MaintenanceGate {
    /// Creates a gate watching the given marker path.
    #[must_use]
    pub fn new(marker: impl Into<PathBuf>) -> Self {
        Self {
            marker: marker.into(),
        }
    }

    /// Returns the marker path being watched.
    #[must_use]
    pub fn marker(&self) -> &Path {
        &self.marker
    }

    /// Returns true iff the marker file currently exists.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.marker.exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn inactive_when_marker_absent() {
        let dir = tempfile::tempdir().unwrap();
        let gate = MaintenanceGate::new(dir.path().join("maintenance"));
        assert!(!gate.is_active());
    }

    #[test]
    fn tracks_marker_creation_and_removal_without_caching() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("maintenance");
        let gate = MaintenanceGate::new(&marker);

        assert!(!gate.is_active());

        fs::write(&marker, b"").unwrap();
        assert!(gate.is_active());

        fs::remove_file(&marker).unwrap();
        assert!(!gate.is_active());
    }
}
