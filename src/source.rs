//! Providers of template source text.
use crate::report::{error_missing_template, Error, ErrorKind};
use std::{
    collections::HashMap,
    fmt::Debug,
    fs,
    path::{Path, PathBuf},
};

/// Template source text together with the path it was loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Loaded {
    pub path: String,
    pub text: String,
}

/// Returns template source text for a template name.
///
/// Called once per parse, never while rendering.
pub trait Source: Debug + Send + Sync {
    /// Load the named template.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] of kind [`ErrorKind::Source`] when the template
    /// does not exist or cannot be read.
    fn load(&self, name: &str) -> Result<Loaded, Error>;
}

/// Serves templates from memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    templates: HashMap<String, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a template, replacing any template with the same name.
    ///
    /// Returns the [`MemorySource`], so additional methods may be chained.
    pub fn with_template<N, T>(mut self, name: N, text: T) -> Self
    where
        N: Into<String>,
        T: Into<String>,
    {
        self.templates.insert(name.into(), text.into());
        self
    }
}

impl Source for MemorySource {
    fn load(&self, name: &str) -> Result<Loaded, Error> {
        self.templates
            .get(name)
            .map(|text| Loaded {
                path: name.to_owned(),
                text: text.clone(),
            })
            .ok_or_else(|| error_missing_template(name))
    }
}

/// Serves templates from files below a root directory.
#[derive(Debug, Clone)]
pub struct FileSource {
    root: PathBuf,
}

impl FileSource {
    pub fn new<P>(root: P) -> Self
    where
        P: AsRef<Path>,
    {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
}

impl Source for FileSource {
    fn load(&self, name: &str) -> Result<Loaded, Error> {
        let path = self.root.join(name);
        let text = fs::read_to_string(&path).map_err(|error| {
            Error::of(ErrorKind::Source, "unreadable template")
                .with_name(name)
                .with_help(format!("failed to read `{}`: {error}", path.display()))
        })?;

        Ok(Loaded {
            path: path.to_string_lossy().into_owned(),
            text,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{FileSource, MemorySource, Source};
    use crate::report::ErrorKind;
    use std::fs;

    #[test]
    fn test_memory_source() {
        let source = MemorySource::new().with_template("a", "hello");

        assert_eq!(source.load("a").unwrap().text, "hello");
        assert_eq!(source.load("b").unwrap_err().kind(), ErrorKind::Source);
    }

    #[test]
    fn test_file_source() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("page.html"), "<p>{x}</p>").unwrap();
        let source = FileSource::new(dir.path());

        let loaded = source.load("page.html").unwrap();
        assert_eq!(loaded.text, "<p>{x}</p>");
        assert!(loaded.path.ends_with("page.html"));
        assert_eq!(
            source.load("missing.html").unwrap_err().kind(),
            ErrorKind::Source
        );
    }
}
