//! Rendering configuration flags.

use std::ops::{BitOr, BitOrAssign};

/// Independently togglable options for parsing and rendering.
///
/// The default has no flags set. Options compose by union with `|`.
///
/// Parse-time flags (`smart`, `normalize`, `validate_utf8`) are read by the
/// [`Document`](crate::Document) constructors; the remaining flags are read by
/// the renderers.
///
/// # Example
///
/// ```
/// use mdtree::RenderOptions;
///
/// let options = RenderOptions::new().with_source_pos() | RenderOptions::new().with_smart();
/// assert!(options.source_pos);
/// assert!(options.smart);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[allow(clippy::struct_excessive_bools)]
pub struct RenderOptions {
    /// Embed source positions where the output format supports them.
    pub source_pos: bool,
    /// Render soft line breaks as hard line breaks.
    pub hard_breaks: bool,
    /// Suppress raw HTML and dangerous URLs. This is already the default
    /// behavior; the flag records intent and never overrides `unsafe`.
    pub safe: bool,
    /// Pass raw HTML and dangerous URLs through unchanged.
    pub r#unsafe: bool,
    /// Render soft line breaks as spaces and disable line wrapping.
    pub no_breaks: bool,
    /// Merge adjacent text nodes after parsing.
    pub normalize: bool,
    /// Replace invalid UTF-8 input with U+FFFD instead of failing.
    pub validate_utf8: bool,
    /// Convert straight quotes, dashes and ellipses to typographic equivalents.
    pub smart: bool,
}

impl RenderOptions {
    /// Options with no flags set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            source_pos: false,
            hard_breaks: false,
            safe: false,
            r#unsafe: false,
            no_breaks: false,
            normalize: false,
            validate_utf8: false,
            smart: false,
        }
    }

    #[must_use]
    pub const fn with_source_pos(mut self) -> Self {
        self.source_pos = true;
        self
    }

    #[must_use]
    pub const fn with_hard_breaks(mut self) -> Self {
        self.hard_breaks = true;
        self
    }

    #[must_use]
    pub const fn with_safe(mut self) -> Self {
        self.safe = true;
        self
    }

    #[must_use]
    pub const fn with_unsafe(mut self) -> Self {
        self.r#unsafe = true;
        self
    }

    #[must_use]
    pub const fn with_no_breaks(mut self) -> Self {
        self.no_breaks = true;
        self
    }

    #[must_use]
    pub const fn with_normalize(mut self) -> Self {
        self.normalize = true;
        self
    }

    #[must_use]
    pub const fn with_validate_utf8(mut self) -> Self {
        self.validate_utf8 = true;
        self
    }

    #[must_use]
    pub const fn with_smart(mut self) -> Self {
        self.smart = true;
        self
    }

    /// Whether raw HTML and dangerous URLs are emitted verbatim.
    ///
    /// `unsafe` wins whenever it is set, regardless of `safe`.
    #[must_use]
    pub const fn allows_unsafe(&self) -> bool {
        self.r#unsafe
    }

    /// Union of two option sets.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self {
            source_pos: self.source_pos || other.source_pos,
            hard_breaks: self.hard_breaks || other.hard_breaks,
            safe: self.safe || other.safe,
            r#unsafe: self.r#unsafe || other.r#unsafe,
            no_breaks: self.no_breaks || other.no_breaks,
            normalize: self.normalize || other.normalize,
            validate_utf8: self.validate_utf8 || other.validate_utf8,
            smart: self.smart || other.smart,
        }
    }
}

impl BitOr for RenderOptions {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl BitOrAssign for RenderOptions {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_has_no_flags() {
        assert_eq!(RenderOptions::default(), RenderOptions::new());
        assert!(!RenderOptions::default().allows_unsafe());
    }

    #[test]
    fn test_union_combines_flags() {
        let mut options = RenderOptions::new().with_hard_breaks();
        options |= RenderOptions::new().with_smart();
        assert!(options.hard_breaks);
        assert!(options.smart);
        assert!(!options.source_pos);
    }

    #[test]
    fn test_unsafe_wins_over_safe() {
        let a = RenderOptions::new().with_safe() | RenderOptions::new().with_unsafe();
        let b = RenderOptions::new().with_unsafe() | RenderOptions::new().with_safe();
        assert!(a.allows_unsafe());
        assert!(b.allows_unsafe());
    }

    #[test]
    fn test_safe_alone_is_safe() {
        assert!(!RenderOptions::new().with_safe().allows_unsafe());
    }
}
