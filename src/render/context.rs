use super::{HelperVariableContainer, ScopedVariableProvider, Store, VariableProvider};
use crate::{
    compile::{Cache, NullCache},
    resolver::Resolver,
    settings::Settings,
};
use std::{
    fmt::{Debug, Formatter},
    sync::Arc,
};

/// Everything a single render reads and writes besides the template itself.
///
/// A context belongs to one render at a time. Cloning it shares the
/// variables, resolver and cache, and copies the helper state.
#[derive(Clone)]
pub struct RenderingContext {
    provider: Arc<dyn VariableProvider>,
    helper_variables: HelperVariableContainer,
    resolver: Arc<Resolver>,
    cache: Arc<dyn Cache>,
    settings: Arc<Settings>,
}

impl RenderingContext {
    /// Create a new [`RenderingContext`] with no variables.
    pub fn new(resolver: Arc<Resolver>, cache: Arc<dyn Cache>, settings: Arc<Settings>) -> Self {
        Self {
            provider: Arc::new(Store::new()),
            helper_variables: HelperVariableContainer::new(),
            resolver,
            cache,
            settings,
        }
    }

    /// Replace the variables and return the context.
    pub fn with_variables<T>(mut self, provider: T) -> Self
    where
        T: VariableProvider + 'static,
    {
        self.provider = Arc::new(provider);

        self
    }

    /// Return the current [`VariableProvider`].
    pub fn variable_provider(&self) -> Arc<dyn VariableProvider> {
        Arc::clone(&self.provider)
    }

    /// Replace the current [`VariableProvider`] and return the previous one.
    pub fn set_variable_provider(
        &mut self,
        provider: Arc<dyn VariableProvider>,
    ) -> Arc<dyn VariableProvider> {
        std::mem::replace(&mut self.provider, provider)
    }

    /// Run the closure with the given variables layered over the current ones,
    /// restoring the current provider afterwards.
    pub fn with_scope<T, F>(&mut self, local: Store, run: F) -> T
    where
        F: FnOnce(&mut Self) -> T,
    {
        let scoped = ScopedVariableProvider::new(self.variable_provider(), local);
        let previous = self.set_variable_provider(Arc::new(scoped));
        let result = run(self);
        self.provider = previous;

        result
    }

    pub fn helper_variables(&self) -> &HelperVariableContainer {
        &self.helper_variables
    }

    pub fn helper_variables_mut(&mut self) -> &mut HelperVariableContainer {
        &mut self.helper_variables
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Replace the [`Resolver`], such as with a scoped copy that may be
    /// modified without affecting other renders.
    pub fn set_resolver(&mut self, resolver: Arc<Resolver>) {
        self.resolver = resolver;
    }

    pub fn cache(&self) -> &dyn Cache {
        self.cache.as_ref()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}

impl Default for RenderingContext {
    fn default() -> Self {
        Self::new(
            Arc::new(Resolver::default()),
            Arc::new(NullCache),
            Arc::new(Settings::default()),
        )
    }
}

impl Debug for RenderingContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderingContext")
            .field("provider", &self.provider)
            .field("helper_variables", &self.helper_variables)
            .field("resolver", &self.resolver)
            .field("settings", &self.settings)
            .finish()
    }
}
