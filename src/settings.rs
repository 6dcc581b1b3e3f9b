use crate::report::{Error, ErrorKind};
use serde::{Deserialize, Serialize};

/// Options controlling how templates are parsed and rendered.
///
/// Every option defaults to `true`. Missing keys take their default when
/// loaded with [`Settings::from_json`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Treat tags in unregistered namespaces as literal text.
    ///
    /// When false, such tags fail with [`ErrorKind::UnresolvedHelper`].
    pub passthrough_unknown_namespaces: bool,
    /// HTML-escape interpolated output.
    pub escape_output: bool,
    /// Compile templates to cached executables before rendering.
    ///
    /// When false, templates are always interpreted.
    pub compile: bool,
}

impl Settings {
    /// Load [`Settings`] from JSON.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] of kind [`ErrorKind::Configuration`] when the text
    /// is not valid JSON or holds an option of the wrong type.
    ///
    /// # Examples
    ///
    /// ```
    /// use vellum::Settings;
    ///
    /// let settings = Settings::from_json(r#"{"escape_output": false}"#).unwrap();
    ///
    /// assert!(!settings.escape_output);
    /// assert!(settings.compile);
    /// ```
    pub fn from_json(text: &str) -> Result<Self, Error> {
        serde_json::from_str(text).map_err(|error| {
            Error::of(ErrorKind::Configuration, "invalid settings").with_help(error.to_string())
        })
    }

    /// Set whether tags in unregistered namespaces pass through as text.
    #[inline]
    pub fn with_passthrough_unknown_namespaces(mut self, passthrough: bool) -> Self {
        self.passthrough_unknown_namespaces = passthrough;
        self
    }

    /// Set whether interpolated output is HTML-escaped.
    #[inline]
    pub fn with_escape_output(mut self, escape: bool) -> Self {
        self.escape_output = escape;
        self
    }

    /// Set whether templates are compiled before rendering.
    #[inline]
    pub fn with_compile(mut self, compile: bool) -> Self {
        self.compile = compile;
        self
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            passthrough_unknown_namespaces: true,
            escape_output: true,
            compile: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Settings;
    use crate::report::ErrorKind;

    #[test]
    fn test_from_json_partial() {
        let settings = Settings::from_json(r#"{"passthrough_unknown_namespaces": false}"#).unwrap();

        assert_eq!(
            settings,
            Settings::default().with_passthrough_unknown_namespaces(false)
        );
    }

    #[test]
    fn test_from_json_invalid() {
        let error = Settings::from_json(r#"{"compile": "yes"}"#).unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Configuration);
    }
}
