use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::SessionError;
use crate::models::User;

/// File-backed cache of the logged-in user. This is the only state the
/// engine persists.
#[derive(Debug, Clone)]
pub struct SessionCache {
    path: PathBuf,
}

impl SessionCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self, user: &User) -> Result<(), SessionError> {
        let json = serde_json::to_string_pretty(user).map_err(|source| SessionError::Corrupt {
            path: self.path.clone(),
            source,
        })?;
        std::fs::write(&self.path, json)
            .map_err(|source| self.io_error(source))?;
        debug!(path = %self.path.display(), user_id = %user.id, "session saved");
        Ok(())
    }

    pub fn load(&self) -> Result<Option<User>, SessionError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(self.io_error(err)),
        };

        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| SessionError::Corrupt {
                path: self.path.clone(),
                source,
            })
    }

    pub fn clear(&self) -> Result<(), SessionError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(self.io_error(err)),
        }
    }

    fn io_error(&self, source: std::io::Error) -> SessionError {
        SessionError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRole;

    fn teacher() -> User {
        User {
            id: "1".to_string(),
            name: "Dr. Sarah Johnson".to_string(),
            email: "teacher@easeattend.com".to_string(),
            role: UserRole::Teacher,
            department: Some("Computer Science".to_string()),
            student_id: None,
        }
    }

    #[test]
    fn save_load_clear() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SessionCache::new(dir.path().join("session.json"));

        assert_eq!(cache.load().unwrap(), None);
        cache.save(&teacher()).unwrap();
        assert_eq!(cache.load().unwrap(), Some(teacher()));

        cache.clear().unwrap();
        assert_eq!(cache.load().unwrap(), None);
        cache.clear().unwrap();
    }

    #[test]
    fn corrupt_cache_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = SessionCache::new(&path).load().unwrap_err();
        assert!(matches!(err, SessionError::Corrupt { .. }));
    }
}
