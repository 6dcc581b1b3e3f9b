use crate::{
    compile::{identify, locate, parse_template, Cache, Compiler, MemoryCache, Template},
    helper::Helper,
    render::{self, RenderingContext, Store},
    report::{error_missing_template, Error, ErrorKind},
    resolver::Resolver,
    settings::Settings,
    source::{Loaded, Source},
};
use std::{collections::HashMap, sync::Arc};

/// Facilitates compiling and rendering templates, and provides storage
/// for helpers and named templates.
///
/// The helpers, settings and cache are shared with every render through a
/// [`RenderingContext`], so an [`Engine`] can render from many threads at
/// once.
#[derive(Debug)]
pub struct Engine {
    settings: Arc<Settings>,
    /// Helpers that this engine is aware of.
    resolver: Arc<Resolver>,
    cache: Arc<dyn Cache>,
    /// Templates that this Engine is aware of.
    templates: HashMap<String, Template>,
    /// Where templates missing from `templates` are loaded from.
    source: Option<Arc<dyn Source>>,
}

impl Engine {
    /// Create a new instance of [`Engine`] with the given [`Settings`].
    ///
    /// The engine knows the built-in helpers and caches compiled templates
    /// in memory.
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: Arc::new(settings),
            resolver: Arc::new(Resolver::default()),
            cache: Arc::new(MemoryCache::new()),
            templates: HashMap::new(),
            source: None,
        }
    }

    /// Use the given [`Source`] to load templates that were not added.
    ///
    /// Returns the [`Engine`], so additional methods may be chained.
    #[inline]
    pub fn with_source<S>(mut self, source: S) -> Self
    where
        S: Source + 'static,
    {
        self.source = Some(Arc::new(source));
        self
    }

    /// Store compiled templates in the given [`Cache`].
    ///
    /// Returns the [`Engine`], so additional methods may be chained.
    #[inline]
    pub fn with_cache<C>(mut self, cache: C) -> Self
    where
        C: Cache + 'static,
    {
        self.cache = Arc::new(cache);
        self
    }

    /// Compile a new [`Template`].
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when compilation fails, which most likely means the source
    /// contains invalid syntax or invokes a helper incorrectly.
    ///
    /// # Examples
    ///
    /// ```
    /// use vellum::Engine;
    ///
    /// let engine = Engine::default();
    /// let template = engine.compile("hello, {name}!");
    /// assert!(template.is_ok());
    /// ```
    #[inline]
    pub fn compile(&self, text: &str) -> Result<Template, Error> {
        parse_template(text, None, &self.resolver, &self.settings)
    }

    /// Compile a new [`Template`] with the given name.
    ///
    /// The name identifies the template in errors, deprecation notices and
    /// the cache.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when compilation fails.
    #[inline]
    pub fn compile_named(&self, name: &str, text: &str) -> Result<Template, Error> {
        parse_template(text, Some(name), &self.resolver, &self.settings)
    }

    /// Return a fresh [`RenderingContext`] sharing the helpers, cache and
    /// settings of this [`Engine`].
    pub fn context(&self) -> RenderingContext {
        RenderingContext::new(
            self.resolver.clone(),
            self.cache.clone(),
            self.settings.clone(),
        )
    }

    /// Render a [`Template`] with the given [`Store`].
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] if rendering fails, which may happen when a helper
    /// returns an `Error` itself, an argument has the wrong type, or an accessor
    /// reaches a property that is not accessible.
    ///
    /// # Examples
    ///
    /// ```
    /// use vellum::{Store, Engine};
    ///
    /// let engine = Engine::default();
    /// let template = engine.compile("hello, {name}!").unwrap();
    /// let result = engine.render(&template, &Store::new().with_must("name", "taylor"));
    ///
    /// assert_eq!(result.unwrap(), "hello, taylor!")
    /// ```
    #[inline]
    pub fn render(&self, template: &Template, store: &Store) -> Result<String, Error> {
        self.render_with(template, &mut self.context().with_variables(store.clone()))
    }

    /// Render a [`Template`] with the given [`RenderingContext`].
    ///
    /// Compiles the template, or reuses its cached executable, unless
    /// compilation is disabled in the [`Settings`].
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] if rendering fails.
    pub fn render_with(
        &self,
        template: &Template,
        context: &mut RenderingContext,
    ) -> Result<String, Error> {
        if !self.settings.compile {
            return render::render_with(template, context);
        }

        let executable = Compiler::compile_or_fetch(context.cache(), template);
        executable
            .execute(context)
            .map_err(|error| template.locate(error))
    }

    /// Render the named [`Template`] with the given [`Store`].
    ///
    /// Templates that were not added are loaded from the [`Source`], if one
    /// is attached. A loaded template is only parsed when the cache holds no
    /// executable for its current text and helpers.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] of kind [`ErrorKind::Source`] if the template does
    /// not exist, or any error raised while compiling or rendering it.
    ///
    /// # Examples
    ///
    /// ```
    /// use vellum::{source::MemorySource, Engine, Store};
    ///
    /// let engine = Engine::default()
    ///     .with_source(MemorySource::new().with_template("greeting", "hi {name}"));
    /// let result = engine.render_named("greeting", &Store::new().with_must("name", "casey"));
    ///
    /// assert_eq!(result.unwrap(), "hi casey");
    /// ```
    pub fn render_named(&self, name: &str, store: &Store) -> Result<String, Error> {
        if let Some(template) = self.get_template(name) {
            return self.render(template, store);
        }

        let loaded = self.load_source(name)?;
        let mut context = self.context().with_variables(store.clone());
        if self.settings.compile {
            let (identifier, fingerprint) =
                identify(Some(loaded.path.as_str()), &loaded.text, self.resolver.signature());
            if let Some(executable) = Compiler::fetch(self.cache.as_ref(), &identifier, &fingerprint)
            {
                log::debug!("cache hit for `{identifier}`, not parsing");
                return executable
                    .execute(&mut context)
                    .map_err(|error| locate(error, Some(loaded.path.as_str()), &loaded.text));
            }
        }

        let template = self.compile_named(&loaded.path, &loaded.text)?;
        self.render_with(&template, &mut context)
    }

    /// Compile and store a new [`Template`] with the given name.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when a `Template` with the given name already exists,
    /// or when compilation fails, which most likely means the source contains invalid
    /// syntax.
    ///
    /// # Examples
    ///
    /// ```
    /// use vellum::Engine;
    ///
    /// let mut engine = Engine::default();
    /// let result = engine.add_template("template_name", "hello, {name}!");
    /// assert!(result.is_ok());
    ///
    /// let second = engine.add_template("template_name", "hello again");
    /// assert!(second.is_err());
    /// ```
    pub fn add_template(&mut self, name: &str, text: &str) -> Result<(), Error> {
        if self.templates.contains_key(name) {
            return Err(Error::of(ErrorKind::Source, "duplicate template").with_help(format!(
                "template with name `{name}` already exists in engine, \
                overwrite it with `.add_template_must`"
            )));
        }

        self.add_template_must(name, text)
    }

    /// Compile and store a new [`Template`] with the given name.
    ///
    /// If a `Template` with the given name already exists in the [`Engine`],
    /// it is overwritten.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when compilation fails, which most likely means the source
    /// contains invalid syntax.
    ///
    /// # Examples
    ///
    /// ```
    /// use vellum::Engine;
    ///
    /// let mut engine = Engine::default();
    /// engine.add_template_must("template_name", "hello, {name}!").unwrap();
    /// engine.add_template_must("template_name", "bye, {name}!").unwrap();
    /// ```
    pub fn add_template_must(&mut self, name: &str, text: &str) -> Result<(), Error> {
        let template = self.compile_named(name, text)?;

        self.templates.insert(name.to_owned(), template);
        Ok(())
    }

    /// Return the named [`Template`], if it was added.
    ///
    /// # Examples
    ///
    /// ```
    /// use vellum::Engine;
    ///
    /// let mut engine = Engine::default();
    /// engine.add_template_must("template_name", "hello, {name}!").unwrap();
    ///
    /// let template = engine.get_template("template_name");
    /// assert!(template.is_some());
    /// ```
    #[inline]
    pub fn get_template(&self, name: &str) -> Option<&Template> {
        self.templates.get(name)
    }

    /// Load and compile the named template from the [`Source`].
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] if no source is attached, the source does not have
    /// the template, or it fails to compile.
    pub fn load(&self, name: &str) -> Result<Template, Error> {
        let loaded = self.load_source(name)?;

        self.compile_named(&loaded.path, &loaded.text)
    }

    fn load_source(&self, name: &str) -> Result<Loaded, Error> {
        self.source
            .as_ref()
            .ok_or_else(|| error_missing_template(name))?
            .load(name)
    }

    /// Add a [`Helper`] under `namespace:name`.
    ///
    /// # Errors
    ///
    /// If a helper is already registered under the name, an [`Error`] is returned.
    pub fn add_helper<H>(&mut self, namespace: &str, name: &str, helper: H) -> Result<(), Error>
    where
        H: Helper,
    {
        if self.resolver.contains(namespace, name) {
            return Err(
                Error::of(ErrorKind::Configuration, "duplicate helper").with_help(format!(
                    "helper `{namespace}:{name}` already exists in engine, \
                    overwrite it with `.add_helper_must`"
                )),
            );
        }

        self.add_helper_must(namespace, name, helper);
        Ok(())
    }

    /// Add a [`Helper`] under `namespace:name`.
    ///
    /// If a helper is already registered under the name, it is overwritten.
    #[inline]
    pub fn add_helper_must<H>(&mut self, namespace: &str, name: &str, helper: H)
    where
        H: Helper,
    {
        Arc::make_mut(&mut self.resolver).register(namespace, name, helper);
    }

    /// Add a [`Helper`] under `namespace:name`.
    ///
    /// Returns the [`Engine`], so additional methods may be chained.
    ///
    /// If a helper is already registered under the name, it is overwritten.
    #[inline]
    pub fn with_helper<H>(mut self, namespace: &str, name: &str, helper: H) -> Self
    where
        H: Helper,
    {
        self.add_helper_must(namespace, name, helper);
        self
    }

    #[inline]
    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    #[inline]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}
