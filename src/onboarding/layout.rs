//! Admin-side layout editing: moving components between pages.
//!
//! A `PageLayout` is an in-memory working copy of the page set. Moves produce
//! a new layout and never touch the store; saving goes through
//! `PUT /onboarding-form` with [`PageLayout::into_pages`].

use serde::Serialize;

use super::model::{OnboardingPage, component_count, sort_pages};
use crate::error::FormError;
use crate::forms::Component;

/// Shown when a save is blocked by an empty page.
pub const EMPTY_PAGE_WARNING: &str = "Please make sure each page has at least one component.";

/// A page the admin can assign a component to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageOption {
    pub index: u32,
    /// 1-based label as shown to the admin.
    pub label: String,
}

/// Working copy of the page set being edited.
#[derive(Debug, Clone, PartialEq)]
pub struct PageLayout {
    pages: Vec<OnboardingPage>,
}

impl PageLayout {
    pub fn new(mut pages: Vec<OnboardingPage>) -> Self {
        sort_pages(&mut pages);
        Self { pages }
    }

    pub fn pages(&self) -> &[OnboardingPage] {
        &self.pages
    }

    pub fn into_pages(self) -> Vec<OnboardingPage> {
        self.pages
    }

    fn page(&self, index: u32) -> Option<&OnboardingPage> {
        self.pages.iter().find(|p| p.index == index)
    }

    fn page_mut(&mut self, index: u32) -> Result<&mut OnboardingPage, FormError> {
        self.pages
            .iter_mut()
            .find(|p| p.index == index)
            .ok_or(FormError::PageNotFound { index })
    }

    /// Move the component `key` from page `old_index` to the end of page `new_index`.
    ///
    /// Returns the new layout; `self` is left untouched. Keys are matched
    /// first-wins, so with duplicate keys on one page only the first moves.
    pub fn move_component(
        &self,
        old_index: u32,
        new_index: u32,
        key: &str,
    ) -> Result<PageLayout, FormError> {
        if self.page(new_index).is_none() {
            return Err(FormError::PageNotFound { index: new_index });
        }

        let mut next = self.clone();
        let source = next.page_mut(old_index)?;
        let position = source
            .components
            .iter()
            .position(|c| c.key == key)
            .ok_or_else(|| FormError::ComponentNotFound {
                key: key.to_string(),
                index: old_index,
            })?;
        let component: Component = source.components.remove(position);

        next.page_mut(new_index)?.components.push(component);
        Ok(next)
    }

    /// Indexes of pages with no components.
    pub fn empty_pages(&self) -> Vec<u32> {
        self.pages
            .iter()
            .filter(|p| p.is_empty())
            .map(|p| p.index)
            .collect()
    }

    /// Whether the layout may be submitted.
    pub fn can_save(&self) -> bool {
        self.pages.iter().all(|p| !p.is_empty())
    }

    /// Inline warning to display while saving is blocked.
    pub fn save_warning(&self) -> Option<&'static str> {
        (!self.can_save()).then_some(EMPTY_PAGE_WARNING)
    }

    /// Pages a component can be assigned to.
    pub fn target_options(&self) -> Vec<PageOption> {
        self.pages
            .iter()
            .map(|p| PageOption {
                index: p.index,
                label: (u64::from(p.index) + 1).to_string(),
            })
            .collect()
    }

    /// Top-level components across all pages.
    pub fn component_count(&self) -> usize {
        component_count(&self.pages)
    }
}
