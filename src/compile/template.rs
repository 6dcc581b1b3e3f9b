use super::{parse::tree::Node, Compiler};
use crate::report::Error;
use xxhash_rust::xxh3::{xxh3_64, xxh3_64_with_seed};

/// A parsed template that can be rendered with a `Store`.
///
/// The syntax tree is immutable once parsed. Parsing the same source again
/// produces a new [`Template`].
#[derive(Debug, Clone)]
pub struct Template {
    /// The name of the [`Template`], usually the path it was loaded from.
    name: Option<String>,
    /// Stable cache key derived from the name.
    identifier: String,
    /// Hash of the source and the helpers it was parsed with, detects stale
    /// cache entries.
    fingerprint: String,
    /// The source data from which this [`Template`] was generated.
    source: String,
    /// The root of the syntax tree.
    root: Node,
}

impl Template {
    /// Create a new [`Template`] from a parsed syntax tree.
    ///
    /// `signature` is the [`Resolver::signature`][`crate::Resolver::signature`]
    /// of the resolver the tree was parsed with.
    pub(crate) fn new(name: Option<&str>, source: &str, root: Node, signature: u64) -> Self {
        let (identifier, fingerprint) = identify(name, source, signature);

        Self {
            name: name.map(str::to_owned),
            identifier,
            fingerprint,
            source: source.to_owned(),
            root,
        }
    }

    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Return the cache key of this [`Template`].
    #[inline]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Return the hash of the source text and the registered helpers.
    #[inline]
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    #[inline]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Return the root [`Node`] of the syntax tree.
    #[inline]
    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Return true if every helper in this [`Template`] supports compilation,
    /// so it can be cached as a closed executable.
    pub fn is_compilable(&self) -> bool {
        Compiler::compile(self).is_closed()
    }

    /// Attach the template source and name to an [`Error`] raised while
    /// rendering this [`Template`].
    pub(crate) fn locate(&self, error: Error) -> Error {
        locate(error, self.name.as_deref(), &self.source)
    }
}

/// Attach the template source and name to an [`Error`].
pub(crate) fn locate(error: Error, name: Option<&str>, source: &str) -> Error {
    let error = error.with_source(source);
    match name {
        Some(name) => error.with_name(name),
        None => error,
    }
}

/// Return the identifier and fingerprint of a template.
///
/// The identifier is the name with every character that is not alphanumeric
/// replaced by `_`, followed by a short hash of the name. Unnamed templates are
/// identified by their fingerprint.
///
/// The fingerprint hashes the source seeded with the resolver `signature`, so a
/// cached executable is not reused once the helpers it was parsed with change.
pub fn identify(name: Option<&str>, source: &str, signature: u64) -> (String, String) {
    let fingerprint = format!("{:016x}", xxh3_64_with_seed(source.as_bytes(), signature));
    let identifier = match name {
        Some(name) => {
            let sanitized: String = name
                .chars()
                .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
                .collect();
            format!("{sanitized}_{:08x}", xxh3_64(name.as_bytes()) as u32)
        }
        None => format!("template_{fingerprint}"),
    };

    (identifier, fingerprint)
}
