use crate::{
    helper::{
        AliasHelper, ArgumentSchema, CaseHelper, CycleHelper, ForHelper, Helper, HelperDescriptor,
        HelperId, IfHelper, RawHelper,
    },
    report::{list_names, Error, ErrorKind, UNRESOLVED_HELPER},
};
use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};
use xxhash_rust::xxh3::Xxh3;

/// Maps namespaced helper names to registered helpers.
///
/// The argument schema of a helper type is computed once, on first
/// registration, and shared by every name the type is registered under.
///
/// A [`Resolver`] shared between renders must not be mutated. Use
/// [`Resolver::scoped_copy`] to register helpers for an isolated pass.
#[derive(Debug, Clone)]
pub struct Resolver {
    /// Namespace to local name to descriptor.
    namespaces: HashMap<String, BTreeMap<String, HelperDescriptor>>,
    schemas: HashMap<HelperId, Arc<ArgumentSchema>>,
    /// Hash of the registrations, updated on every change.
    signature: u64,
}

impl Resolver {
    /// Create a [`Resolver`] with no namespaces or helpers.
    pub fn empty() -> Self {
        let mut resolver = Self {
            namespaces: HashMap::new(),
            schemas: HashMap::new(),
            signature: 0,
        };
        resolver.signature = resolver.compute_signature();

        resolver
    }

    /// Register a helper under `namespace:name`, replacing any helper already
    /// registered there.
    ///
    /// The namespace is created if it does not exist.
    pub fn register<H>(&mut self, namespace: &str, name: &str, helper: H)
    where
        H: Helper,
    {
        self.register_shared(namespace, name, Arc::new(helper));
    }

    /// Register a shared helper under `namespace:name`.
    pub fn register_shared(&mut self, namespace: &str, name: &str, helper: Arc<dyn Helper>) {
        let schema = self
            .schemas
            .entry(helper.id())
            .or_insert_with(|| Arc::new(helper.arguments()))
            .clone();
        let descriptor = HelperDescriptor::new(format!("{namespace}:{name}"), helper, schema);
        log::trace!("registered helper `{}`", descriptor.name());

        self.namespaces
            .entry(namespace.to_string())
            .or_default()
            .insert(name.to_string(), descriptor);
        self.signature = self.compute_signature();
    }

    /// Register a helper under `namespace:name`.
    ///
    /// Returns the [`Resolver`], so additional methods may be chained.
    #[inline]
    pub fn with_helper<H>(mut self, namespace: &str, name: &str, helper: H) -> Self
    where
        H: Helper,
    {
        self.register(namespace, name, helper);
        self
    }

    /// Register an empty namespace.
    ///
    /// Tags in a registered namespace are always treated as helpers.
    pub fn add_namespace(&mut self, namespace: &str) {
        self.namespaces.entry(namespace.to_string()).or_default();
        self.signature = self.compute_signature();
    }

    /// Return true if the namespace is registered.
    #[inline]
    pub fn has_namespace(&self, namespace: &str) -> bool {
        self.namespaces.contains_key(namespace)
    }

    /// Return true if a helper is registered under `namespace:name`.
    pub fn contains(&self, namespace: &str, name: &str) -> bool {
        self.namespaces
            .get(namespace)
            .is_some_and(|helpers| helpers.contains_key(name))
    }

    /// Return the [`HelperDescriptor`] registered under `namespace:name`.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] of kind [`ErrorKind::UnresolvedHelper`] when nothing
    /// is registered under the name, or of kind [`ErrorKind::Configuration`]
    /// when the helper can never be invoked as declared.
    ///
    /// # Examples
    ///
    /// ```
    /// use vellum::{ErrorKind, Resolver};
    ///
    /// let resolver = Resolver::default();
    /// assert_eq!(resolver.resolve("f", "cycle").unwrap().name(), "f:cycle");
    /// assert_eq!(
    ///     resolver.resolve("f", "nope").unwrap_err().kind(),
    ///     ErrorKind::UnresolvedHelper
    /// );
    /// ```
    pub fn resolve(&self, namespace: &str, name: &str) -> Result<HelperDescriptor, Error> {
        let Some(helpers) = self.namespaces.get(namespace) else {
            return Err(
                Error::of(ErrorKind::UnresolvedHelper, UNRESOLVED_HELPER).with_help(format!(
                    "namespace `{namespace}` is not registered, register a helper in it \
                    with `.with_helper`"
                )),
            );
        };
        let Some(descriptor) = helpers.get(name) else {
            let known: Vec<&String> = helpers.keys().collect();
            return Err(
                Error::of(ErrorKind::UnresolvedHelper, UNRESOLVED_HELPER).with_help(format!(
                    "no helper named `{name}` in namespace `{namespace}`, known helpers are {}",
                    list_names(&known)
                )),
            );
        };

        descriptor.validate()?;
        Ok(descriptor.clone())
    }

    /// Return a hash of the registered namespaces and helpers.
    ///
    /// Templates parsed with resolvers of different signatures may produce
    /// different trees from the same source, so the signature is part of
    /// their fingerprint. Helpers are told apart by name and type.
    #[inline]
    pub fn signature(&self) -> u64 {
        self.signature
    }

    fn compute_signature(&self) -> u64 {
        let mut namespaces: Vec<_> = self.namespaces.iter().collect();
        namespaces.sort_unstable_by(|(a, _), (b, _)| a.cmp(b));

        let mut hasher = Xxh3::new();
        for (namespace, helpers) in namespaces {
            hasher.update(namespace.as_bytes());
            hasher.update(b":");
            for (name, descriptor) in helpers {
                hasher.update(name.as_bytes());
                hasher.update(b"=");
                hasher.update(descriptor.id().name().as_bytes());
                hasher.update(b";");
            }
            hasher.update(b"\n");
        }

        hasher.digest()
    }

    /// Return an independent copy of this [`Resolver`].
    ///
    /// Registrations on the copy do not affect this resolver.
    #[inline]
    pub fn scoped_copy(&self) -> Self {
        self.clone()
    }
}

impl Default for Resolver {
    /// Create a [`Resolver`] with the built-in helpers in namespace `f`.
    fn default() -> Self {
        let mut resolver = Self::empty();
        resolver.register("f", "for", ForHelper);
        resolver.register("f", "if", IfHelper);
        resolver.register("f", "cycle", CycleHelper);
        resolver.register("f", "alias", AliasHelper);
        resolver.register("f", "format.raw", RawHelper);
        resolver.register("f", "format.case", CaseHelper);

        resolver
    }
}
