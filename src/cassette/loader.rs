//! Locating and loading cassette fixtures by name.

use std::path::{Path, PathBuf};

use super::format::Cassette;
use crate::error::{DeckError, Result};

/// Resolves a fixture name to its raw bytes.
pub trait FixtureLocator: Send + Sync {
    /// Returns the fixture content.
    ///
    /// # Errors
    ///
    /// Returns [`DeckError::MissingFixture`] when no fixture has that name.
    fn locate(&self, name: &str) -> Result<Vec<u8>>;

    /// Locates and decodes a cassette.
    ///
    /// # Errors
    ///
    /// Propagates [`FixtureLocator::locate`] errors and returns
    /// [`DeckError::MalformedFixture`] if the content does not decode.
    fn load(&self, name: &str) -> Result<Cassette> {
        let bytes = self.locate(name)?;
        Cassette::from_slice(name, &bytes)
    }
}

/// Finds `<name>.json` files in a directory.
#[derive(Debug, Clone)]
pub struct DirectoryLocator {
    root: PathBuf,
}

impl DirectoryLocator {
    /// Creates a locator rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory fixtures are read from.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl FixtureLocator for DirectoryLocator {
    fn locate(&self, name: &str) -> Result<Vec<u8>> {
        let file_name = format!("{name}.json");
        let path = self.root.join(&file_name);
        std::fs::read(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => DeckError::MissingFixture(file_name),
            _ => DeckError::Io(e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fixture_carries_file_name_with_extension() {
        let dir = tempfile::tempdir().unwrap();
        let locator = DirectoryLocator::new(dir.path());
        let err = locator.load("🏅👻🍻").unwrap_err();
        assert!(matches!(err, DeckError::MissingFixture(name) if name == "🏅👻🍻.json"));
    }

    #[test]
    fn loads_named_fixture() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("single.json"),
            r#"[{"request": {"url": "http://a"}, "response": {"url": "http://a", "status": 204}}]"#,
        )
        .unwrap();

        let cassette = DirectoryLocator::new(dir.path()).load("single").unwrap();
        assert_eq!(cassette.len(), 1);
        assert_eq!(cassette.interactions[0].response.status, 204);
    }

    #[test]
    fn malformed_fixture_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.json"), "not json").unwrap();
        let err = DirectoryLocator::new(dir.path()).load("bad").unwrap_err();
        assert!(matches!(err, DeckError::MalformedFixture { name, .. } if name == "bad"));
    }
}
