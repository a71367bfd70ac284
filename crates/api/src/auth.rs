use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Read-only access to the bearer credential plus a hook for 401 responses.
///
/// Token issuance and refresh live outside this crate; callers only read
/// the current token and report when the backend rejected it.
pub trait Credentials: Send + Sync {
    /// Current bearer token, if any.
    fn token(&self) -> Option<String>;

    /// Called once the backend answered 401 for the current token.
    fn on_unauthorized(&self);
}

/// Credential held in memory for the lifetime of the process.
#[derive(Debug, Default)]
pub struct StaticCredentials {
    token: Mutex<Option<String>>,
}

impl StaticCredentials {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }

    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }
}

impl Credentials for StaticCredentials {
    fn token(&self) -> Option<String> {
        self.token.lock().ok().and_then(|guard| guard.clone())
    }

    fn on_unauthorized(&self) {
        if let Ok(mut guard) = self.token.lock() {
            *guard = None;
        }
    }
}

/// Credential persisted in a single file, read on every request.
#[derive(Debug, Clone)]
pub struct TokenFile {
    path: PathBuf,
}

impl TokenFile {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the token, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns any I/O error from creating the directory or writing the file.
    pub fn store(&self, token: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, token.trim())
    }

    /// Remove the stored token. A missing file is not an error.
    ///
    /// # Errors
    ///
    /// Returns I/O errors other than `NotFound`.
    pub fn clear(&self) -> io::Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err),
        }
    }
}

impl Credentials for TokenFile {
    fn token(&self) -> Option<String> {
        let raw = fs::read_to_string(&self.path).ok()?;
        let token = raw.trim();
        if token.is_empty() {
            None
        } else {
            Some(token.to_string())
        }
    }

    fn on_unauthorized(&self) {
        if let Err(err) = self.clear() {
            tracing::warn!(path = %self.path.display(), error = %err, "failed to clear token file");
        }
    }
}
