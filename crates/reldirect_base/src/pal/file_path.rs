use relative_path::{RelativePath, RelativePathBuf};
use std::path::Path;

/* 📖 # Why use RelativePathBuf for FilePath?

Every file the redirector reads (today only its configuration) is addressed
relative to the PAL's base directory. Wrapping RelativePathBuf keeps absolute
system paths out of engine code and lets MockPal key its in-memory files by the
same type.
*/

/// Path relative to the PAL base directory.
///
/// ```
/// use reldirect_base::FilePath;
///
/// let path = FilePath::from("reldirect.toml");
/// assert_eq!(path.to_string(), "reldirect.toml");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilePath(RelativePathBuf);

impl FilePath {
    pub fn as_relative(&self) -> &RelativePath {
        &self.0
    }

    /// Converts to a regular Path, without any base directory applied.
    pub fn as_path(&self) -> &Path {
        Path::new(self.0.as_str())
    }
}

impl From<&str> for FilePath {
    fn from(s: &str) -> Self {
        Self(RelativePathBuf::from(s))
    }
}

impl From<String> for FilePath {
    fn from(s: String) -> Self {
        Self(RelativePathBuf::from(s))
    }
}

impl From<&Path> for FilePath {
    fn from(p: &Path) -> Self {
        Self(RelativePathBuf::from(p.to_string_lossy().into_owned()))
    }
}

impl std::fmt::Display for FilePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_file_path_from_str() {
        let path = FilePath::from("conf/reldirect.toml");
        assert_eq!(path.as_path(), Path::new("conf/reldirect.toml"));
        assert_eq!(path.as_relative(), RelativePath::new("conf/reldirect.toml"));
    }

    #[test]
    fn test_file_path_from_path() {
        let pb = PathBuf::from("conf/reldirect.toml");
        assert_eq!(FilePath::from(pb.as_path()), FilePath::from("conf/reldirect.toml"));
    }

    #[test]
    fn test_file_path_display() {
        let path = FilePath::from(String::from("reldirect.toml"));
        assert_eq!(path.to_string(), "reldirect.toml");
    }
}
