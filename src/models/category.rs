//! Category catalog
//!
//! Expense categories are free text. The catalog only decides how a category
//! is displayed; it is loaded from configuration once and never changes at
//! runtime.

use serde::{Deserialize, Serialize};

const FALLBACK_ICON: &str = "📦";
const FALLBACK_COLOR: &str = "#94a3b8";

/// One entry of the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDef {
    /// Value stored on expenses (e.g. `food`)
    pub id: String,
    /// Display name
    pub name: String,
    /// Icon glyph
    pub icon: String,
    /// CSS colour
    pub color: String,
}

impl CategoryDef {
    pub fn new(id: &str, name: &str, icon: &str, color: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            icon: icon.to_string(),
            color: color.to_string(),
        }
    }
}

/// Display attributes resolved for a category value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryStyle {
    pub icon: String,
    pub color: String,
}

/// Immutable lookup table of known categories
#[derive(Debug, Clone, Default)]
pub struct CategoryCatalog {
    entries: Vec<CategoryDef>,
}

impl CategoryCatalog {
    pub fn new(entries: Vec<CategoryDef>) -> Self {
        Self { entries }
    }

    /// Entries in configuration order (used to fill the form's choices)
    pub fn entries(&self) -> &[CategoryDef] {
        &self.entries
    }

    /// Find the entry whose id or name matches, ignoring case.
    pub fn find(&self, category: &str) -> Option<&CategoryDef> {
        let wanted = category.trim();
        self.entries
            .iter()
            .find(|c| c.id.eq_ignore_ascii_case(wanted) || c.name.eq_ignore_ascii_case(wanted))
    }

    /// Style for a category value.
    ///
    /// Unknown values get the `other` entry's style, or a built-in neutral
    /// style when the catalog has no `other` entry.
    pub fn style_for(&self, category: &str) -> CategoryStyle {
        let def = self.find(category).or_else(|| self.find("other"));
        match def {
            Some(def) => CategoryStyle {
                icon: def.icon.clone(),
                color: def.color.clone(),
            },
            None => CategoryStyle {
                icon: FALLBACK_ICON.to_string(),
                color: FALLBACK_COLOR.to_string(),
            },
        }
    }
}
