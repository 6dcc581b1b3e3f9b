use morel::{Finder, Syntax};

/// Markers that may open a helper tag or an interpolation within text.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Marker {
    /// `{`, the beginning of an interpolation when followed by an expression.
    BeginInterpolation = 0,
    /// `<`, the beginning of a helper tag or closing tag when followed by a
    /// namespaced name.
    BeginTag = 1,
}

impl From<usize> for Marker {
    fn from(value: usize) -> Self {
        match value {
            0 => Self::BeginInterpolation,
            _ => Self::BeginTag,
        }
    }
}

impl From<Marker> for usize {
    fn from(marker: Marker) -> Self {
        marker as usize
    }
}

/// Return a [`Finder`] that searches text for every [`Marker`].
pub fn finder() -> Finder {
    Finder::new(Syntax::new(vec![
        (Marker::BeginInterpolation.into(), "{".to_string()),
        (Marker::BeginTag.into(), "<".to_string()),
    ]))
}

#[cfg(test)]
mod tests {
    use super::{finder, Marker};

    #[test]
    fn test_finder_locates_markers() {
        let finder = finder();
        let source = "a {b} <f:c/>";

        let (id, begin, end) = finder.next(source, 0).unwrap();
        assert_eq!(Marker::from(id), Marker::BeginInterpolation);
        assert_eq!((begin, end), (2, 3));

        let (id, begin, _) = finder.next(source, end).unwrap();
        assert_eq!(Marker::from(id), Marker::BeginTag);
        assert_eq!(begin, 6);
    }
}
