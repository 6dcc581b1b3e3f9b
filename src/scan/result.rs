use crate::{
    compile::Template,
    report::{Deprecation, Error},
};

/// Outcome of scanning one template file.
#[derive(Debug)]
pub struct ScanResult {
    /// Cache identifier of the template.
    pub identifier: String,
    /// Path the template was read from.
    pub path: String,
    /// Errors raised while reading or parsing.
    pub errors: Vec<Error>,
    /// Deprecations raised while parsing.
    pub deprecations: Vec<Deprecation>,
    /// The parsed template, if parsing succeeded.
    pub template: Option<Template>,
}

impl ScanResult {
    /// Return true if the template parsed without errors and can be cached as
    /// a closed executable.
    pub fn can_be_compiled(&self) -> bool {
        self.errors.is_empty()
            && self
                .template
                .as_ref()
                .is_some_and(|template| template.is_compilable())
    }
}
