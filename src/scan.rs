//! Batch diagnostics over template files.
//!
//! Scanning parses each template in isolation and records what went wrong,
//! without rendering anything. A failing template never aborts the batch.
mod result;

pub use result::ScanResult;

use crate::{
    compile::{identify, parse_template},
    render::RenderingContext,
    report::{capture, Error, ErrorKind},
    resolver::Resolver,
    settings::Settings,
};
use indexmap::IndexMap;
use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};
use walkdir::WalkDir;

/// Extensions searched by [`TemplateScanner::find_templates`] when none are
/// given.
pub const DEFAULT_EXTENSIONS: [&str; 3] = ["html", "txt", "xml"];

/// Parses template files and collects their errors and deprecations.
#[derive(Debug, Clone)]
pub struct TemplateScanner {
    resolver: Arc<Resolver>,
    settings: Settings,
}

impl TemplateScanner {
    /// Create a [`TemplateScanner`] that knows the built-in helpers.
    pub fn new() -> Self {
        Self {
            resolver: Arc::new(Resolver::default()),
            settings: Settings::default(),
        }
    }

    /// Create a [`TemplateScanner`] that parses with the helpers and settings
    /// of the given [`RenderingContext`].
    pub fn with_context(context: &RenderingContext) -> Self {
        Self {
            resolver: Arc::new(context.resolver().clone()),
            settings: context.settings().clone(),
        }
    }

    /// Parse each template file and return the results keyed by path, in the
    /// order given.
    ///
    /// Every template is parsed with its own copy of the resolver, and the
    /// deprecations it raises are captured for the duration of its parse only.
    pub fn scan<P>(&self, templates: &[P]) -> IndexMap<String, ScanResult>
    where
        P: AsRef<Path>,
    {
        templates
            .iter()
            .map(|path| {
                let result = self.scan_one(path.as_ref());
                (result.path.clone(), result)
            })
            .collect()
    }

    fn scan_one(&self, path: &Path) -> ScanResult {
        let name = path.to_string_lossy().into_owned();
        log::trace!("scanning `{name}`");

        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(error) => {
                let error = Error::of(ErrorKind::Source, "unreadable template")
                    .with_name(name.as_str())
                    .with_help(error.to_string());

                return ScanResult {
                    identifier: identify(Some(name.as_str()), "", 0).0,
                    path: name,
                    errors: vec![error],
                    deprecations: vec![],
                    template: None,
                };
            }
        };

        let resolver = self.resolver.scoped_copy();
        let (parsed, deprecations) =
            capture(|| parse_template(&text, Some(name.as_str()), &resolver, &self.settings));
        let identifier = identify(Some(name.as_str()), &text, resolver.signature()).0;
        let (template, errors) = match parsed {
            Ok(template) => (Some(template), vec![]),
            Err(error) => (None, vec![error]),
        };

        ScanResult {
            identifier,
            path: name,
            errors,
            deprecations,
            template,
        }
    }

    /// Return every file below the given directories whose name ends with one
    /// of the extensions. The extension `*` matches any file.
    ///
    /// Symbolic links are followed. Unreadable entries are skipped.
    pub fn find_templates<P>(paths: &[P], extensions: &[&str]) -> Vec<PathBuf>
    where
        P: AsRef<Path>,
    {
        if extensions.is_empty() {
            return vec![];
        }

        let mut found = vec![];
        for root in paths {
            for entry in WalkDir::new(root)
                .follow_links(true)
                .min_depth(1)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|entry| entry.ok())
            {
                if entry.file_type().is_file() && matches_extension(entry.path(), extensions) {
                    found.push(entry.into_path());
                }
            }
        }

        found
    }
}

impl Default for TemplateScanner {
    fn default() -> Self {
        Self::new()
    }
}

fn matches_extension(path: &Path, extensions: &[&str]) -> bool {
    let Some(name) = path.file_name().map(|name| name.to_string_lossy()) else {
        return false;
    };

    extensions
        .iter()
        .any(|extension| *extension == "*" || name.ends_with(&format!(".{extension}")))
}

#[cfg(test)]
mod tests {
    use super::{TemplateScanner, DEFAULT_EXTENSIONS};
    use crate::{
        helper::{ArgumentSchema, Arguments, Children, Helper},
        render::RenderingContext,
        report::{Error, ErrorKind},
        value::Value,
        Engine,
    };
    use pretty_assertions::assert_eq;
    use std::{fs, path::Path};

    struct Old;

    impl Helper for Old {
        fn arguments(&self) -> ArgumentSchema {
            ArgumentSchema::new().with_deprecation("use f:format.raw")
        }

        fn render(
            &self,
            _: &Arguments,
            children: &Children,
            context: &mut RenderingContext,
        ) -> Result<Value, Error> {
            children.render(context)
        }
    }

    struct Dynamic;

    impl Helper for Dynamic {
        fn arguments(&self) -> ArgumentSchema {
            ArgumentSchema::new()
        }

        fn render(
            &self,
            _: &Arguments,
            _: &Children,
            _: &mut RenderingContext,
        ) -> Result<Value, Error> {
            Ok(Value::Null)
        }
    }

    fn write(dir: &Path, name: &str, text: &str) -> String {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, text).unwrap();

        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_scan_records_each_template() {
        let dir = tempfile::tempdir().unwrap();
        let good = write(dir.path(), "good.html", "<f:if condition=\"{a}\">{b}</f:if>");
        let bad = write(dir.path(), "bad.html", "<f:if>");
        let old = write(dir.path(), "old.html", "line\n<x:old/>");
        let dynamic = write(dir.path(), "dynamic.html", "<x:dynamic/>");
        let missing = dir.path().join("missing.html").to_string_lossy().into_owned();

        let engine = Engine::default()
            .with_helper("x", "old", Old)
            .with_helper("x", "dynamic", Dynamic);
        let scanner = TemplateScanner::with_context(&engine.context());
        let results = scanner.scan(&[&good, &bad, &old, &dynamic, &missing]);

        assert_eq!(
            results.keys().collect::<Vec<_>>(),
            vec![&good, &bad, &old, &dynamic, &missing]
        );

        assert!(results[&good].can_be_compiled());
        assert!(results[&good].identifier.contains("good_html_"));

        assert_eq!(results[&bad].errors.len(), 1);
        assert!(results[&bad].template.is_none());
        assert!(!results[&bad].can_be_compiled());

        let deprecations = &results[&old].deprecations;
        assert_eq!(deprecations.len(), 1);
        assert_eq!(deprecations[0].file, old);
        assert_eq!(deprecations[0].line, 2);
        assert!(results[&old].errors.is_empty());

        assert!(results[&dynamic].errors.is_empty());
        assert!(!results[&dynamic].can_be_compiled());

        assert_eq!(results[&missing].errors[0].kind(), ErrorKind::Source);
    }

    #[test]
    fn test_find_templates() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.html", "");
        write(dir.path(), "nested/b.xml", "");
        write(dir.path(), "nested/deeper/c.txt", "");
        write(dir.path(), "notes.md", "");

        let names = |extensions: &[&str]| -> Vec<String> {
            TemplateScanner::find_templates(&[dir.path()], extensions)
                .iter()
                .map(|path| {
                    path.strip_prefix(dir.path())
                        .unwrap()
                        .to_string_lossy()
                        .replace('\\', "/")
                })
                .collect()
        };

        assert_eq!(
            names(&DEFAULT_EXTENSIONS),
            vec!["a.html", "nested/b.xml", "nested/deeper/c.txt"]
        );
        assert_eq!(names(&["md"]), vec!["notes.md"]);
        assert_eq!(names(&["*"]).len(), 4);
        assert!(names(&[]).is_empty());
    }
}
