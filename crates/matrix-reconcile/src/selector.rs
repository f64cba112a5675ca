//! Mode selection for a generation request
//!
//! Provides [`ModeSelector`], which decides whether a tab gets a partial fill
//! or a full regeneration.

use crate::strategy::ReconcileMode;
use matrix_model::Tab;

/// Picks the merge mode for a tab
#[derive(Debug, Clone, Copy, Default)]
pub struct ModeSelector;

impl ModeSelector {
    /// Create new selector
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Select the mode for `tab`
    ///
    /// # Selection Logic
    /// - no records → `Regenerate`
    /// - some record has an empty schema cell → `FillEmpty`
    /// - every cell populated → `Regenerate`
    #[must_use]
    pub fn select(&self, tab: &Tab) -> ReconcileMode {
        if !tab.is_empty() && tab.has_empty_cells() {
            ReconcileMode::FillEmpty
        } else {
            ReconcileMode::Regenerate
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use matrix_model::{AttributeSchema, CompetitorRecord, EMPTY_SENTINEL};

    fn tab(value: &str) -> Tab {
        Tab::new("t", "T")
            .with_schema(AttributeSchema::from_names(["Focus"]))
            .with_competitors(vec![CompetitorRecord::new("1", "Acme", "t").with_attribute("Focus", value)])
    }

    #[test]
    fn empty_tab_regenerates() {
        let empty = Tab::new("t", "T").with_schema(AttributeSchema::from_names(["Focus"]));
        assert_eq!(ModeSelector::new().select(&empty), ReconcileMode::Regenerate);
    }

    #[test]
    fn empty_cells_select_fill() {
        assert_eq!(ModeSelector::new().select(&tab("")), ReconcileMode::FillEmpty);
        assert_eq!(ModeSelector::new().select(&tab(EMPTY_SENTINEL)), ReconcileMode::FillEmpty);
    }

    #[test]
    fn complete_tab_regenerates() {
        assert_eq!(ModeSelector::new().select(&tab("B2B")), ReconcileMode::Regenerate);
    }
}
