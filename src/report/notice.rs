use std::cell::RefCell;

/// A deprecation raised while parsing a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deprecation {
    /// Path or name of the template that triggered the notice.
    pub file: String,
    /// One-indexed line within the template.
    pub line: usize,
    /// Describes what is deprecated.
    pub message: String,
}

impl Deprecation {
    /// Create a new [`Deprecation`].
    pub fn new<F, M>(file: F, line: usize, message: M) -> Self
    where
        F: Into<String>,
        M: Into<String>,
    {
        Self {
            file: file.into(),
            line,
            message: message.into(),
        }
    }
}

thread_local! {
    /// Notices collected by the innermost active `capture` call on this thread.
    static HOOK: RefCell<Option<Vec<Deprecation>>> = const { RefCell::new(None) };
}

/// Restores the hook that was active before a `capture` call, even on unwind.
struct Restore(Option<Vec<Deprecation>>);

impl Drop for Restore {
    fn drop(&mut self) {
        let previous = self.0.take();
        HOOK.with(|hook| *hook.borrow_mut() = previous);
    }
}

/// Run the given closure with a deprecation hook installed, and return its
/// result together with every [`Deprecation`] raised on this thread while it ran.
///
/// The hook is removed when the closure returns and any outer hook is restored.
///
/// # Examples
///
/// ```
/// use vellum::report::capture;
///
/// let (value, notices) = capture(|| 42);
///
/// assert_eq!(value, 42);
/// assert!(notices.is_empty());
/// ```
pub fn capture<T, F>(run: F) -> (T, Vec<Deprecation>)
where
    F: FnOnce() -> T,
{
    let previous = HOOK.with(|hook| hook.borrow_mut().replace(vec![]));
    let restore = Restore(previous);
    let value = run();
    let notices = HOOK
        .with(|hook| hook.borrow_mut().take())
        .unwrap_or_default();
    drop(restore);

    (value, notices)
}

/// Raise a [`Deprecation`].
///
/// Delivered to the active hook if one is installed, otherwise logged.
pub(crate) fn deprecated(notice: Deprecation) {
    let unhandled = HOOK.with(|hook| match hook.borrow_mut().as_mut() {
        Some(notices) => {
            notices.push(notice);
            None
        }
        None => Some(notice),
    });

    if let Some(notice) = unhandled {
        log::warn!(
            "deprecated: {} ({}:{})",
            notice.message,
            notice.file,
            notice.line
        );
    }
}
