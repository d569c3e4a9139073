//! Style interning: value-equal cell styles share one handle.

use std::collections::HashMap;

use crate::spec::SpecCellStyle;

/// Opaque reference to a registered [`SpecCellStyle`].
///
/// Handles are only meaningful for the registry that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StyleHandle(u32);

impl StyleHandle {
    /// Handle of the default style; every registry registers it first.
    pub const DEFAULT: StyleHandle = StyleHandle(0);

    /// Raw index into the owning registry.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Deduplicating store of cell styles.
#[derive(Debug, Clone)]
pub struct StyleRegistry {
    l_styles: Vec<SpecCellStyle>,
    dict_handles: HashMap<SpecCellStyle, StyleHandle>,
}

impl Default for StyleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl StyleRegistry {
    /// Create a registry holding only the default style.
    pub fn new() -> Self {
        let mut registry = Self {
            l_styles: Vec::new(),
            dict_handles: HashMap::new(),
        };
        registry.intern(&SpecCellStyle::default());
        registry
    }

    /// Register `style`, returning the existing handle when an equal style is already known.
    pub fn intern(&mut self, style: &SpecCellStyle) -> StyleHandle {
        if let Some(handle) = self.dict_handles.get(style) {
            return *handle;
        }
        let handle = StyleHandle(self.l_styles.len() as u32);
        self.l_styles.push(style.clone());
        self.dict_handles.insert(style.clone(), handle);
        handle
    }

    /// Resolve a handle issued by this registry. Unknown handles resolve to `None`.
    pub fn resolve(&self, handle: StyleHandle) -> Option<&SpecCellStyle> {
        self.l_styles.get(handle.index())
    }

    /// Resolve a handle, falling back to the default style.
    pub fn resolve_or_default(&self, handle: StyleHandle) -> &SpecCellStyle {
        self.resolve(handle).unwrap_or(&self.l_styles[0])
    }

    /// Number of distinct styles.
    pub fn len(&self) -> usize {
        self.l_styles.len()
    }

    /// Whether only the default style is registered.
    pub fn is_empty(&self) -> bool {
        self.l_styles.len() <= 1
    }
}

#[cfg(test)]
mod tests {
    use super::{StyleHandle, StyleRegistry};
    use crate::spec::{EnumColor, SpecCellStyle};

    #[test]
    fn test_intern_deduplicates_equal_styles() {
        let mut registry = StyleRegistry::new();
        let mut style = SpecCellStyle::default();
        style.font.bold = true;
        style.font.color = Some(EnumColor::Rgb(0xFF0000));

        let h1 = registry.intern(&style);
        let h2 = registry.intern(&style.clone());
        assert_eq!(h1, h2);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.resolve(h1), Some(&style));
    }

    #[test]
    fn test_default_style_is_preregistered() {
        let mut registry = StyleRegistry::new();
        assert_eq!(registry.intern(&SpecCellStyle::default()), StyleHandle::DEFAULT);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_hyperlink_makes_style_distinct() {
        let mut registry = StyleRegistry::new();
        let base = SpecCellStyle::default();
        let linked = base.with_hyperlink(Some("https://example.com".to_string()));
        assert_ne!(registry.intern(&base), registry.intern(&linked));
    }
}
