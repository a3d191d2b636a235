//! Credential store that persists the bearer token between invocations

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use folio_client::{Credential, CredentialStore};
use tracing::warn;

pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `$HOME/.folio/token`, or `.folio-token` in the working directory
    pub fn default_path() -> PathBuf {
        match std::env::var_os("HOME") {
            Some(home) => Path::new(&home).join(".folio").join("token"),
            None => PathBuf::from(".folio-token"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, token: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&self.path)?;
        // `mode` only applies on creation
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(fs::Permissions::from_mode(0o600))?;
        }
        file.write_all(token.as_bytes())
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self) -> Option<Credential> {
        let token = fs::read_to_string(&self.path).ok()?;
        match Credential::parse(&token) {
            Ok(credential) => Some(credential),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Ignoring unreadable token file");
                None
            }
        }
    }

    fn set(&self, credential: Credential) {
        if let Err(e) = self.write(credential.token()) {
            warn!(path = %self.path.display(), error = %e, "Failed to save token");
        }
    }

    fn clear(&self) {
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "Failed to remove token"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // header.{"sub":"u1","email":"a@b.co","admin":false,"iat":0,"exp":4102444800}.sig
    const TOKEN: &str = "eyJhbGciOiJIUzI1NiJ9.\
eyJzdWIiOiJ1MSIsImVtYWlsIjoiYUBiLmNvIiwiYWRtaW4iOmZhbHNlLCJpYXQiOjAsImV4cCI6NDEwMjQ0NDgwMH0.\
c2ln";

    #[test]
    fn test_set_get_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("nested").join("token"));
        assert!(store.get().is_none());

        store.set(Credential::parse(TOKEN).unwrap());
        let loaded = store.get().unwrap();
        assert_eq!(loaded.token(), TOKEN);
        assert_eq!(loaded.principal().email, "a@b.co");

        store.clear();
        assert!(store.get().is_none());
        // Clearing twice is harmless
        store.clear();
    }

    #[test]
    fn test_corrupt_file_reads_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token");
        fs::write(&path, "not a token").unwrap();
        assert!(FileCredentialStore::new(path).get().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_token_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token");
        fs::write(&path, "old").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        let store = FileCredentialStore::new(&path);
        store.set(Credential::parse(TOKEN).unwrap());

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(fs::read_to_string(&path).unwrap(), TOKEN);
    }
}
