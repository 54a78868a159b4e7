//! Onboarding page model and the page-set rules checked before persistence.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::forms::{Component, FieldKind};

/// One step of the signup flow.
///
/// `index` orders the steps; values need not be contiguous.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnboardingPage {
    pub index: u32,
    pub components: Vec<Component>,
}

impl OnboardingPage {
    pub fn new(index: u32, components: Vec<Component>) -> Self {
        Self { index, components }
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

/// Check a full replacement page set.
///
/// Components are grouped by target `index`; every group must end up with at
/// least one component, and each index may appear only once.
pub fn validate_pages(pages: &[OnboardingPage]) -> Result<(), ValidationError> {
    let mut by_index: BTreeMap<u32, usize> = BTreeMap::new();
    for page in pages {
        if by_index.insert(page.index, page.components.len()).is_some() {
            return Err(ValidationError::DuplicatePageIndex { index: page.index });
        }
    }

    match by_index.into_iter().find(|(_, count)| *count == 0) {
        Some((index, _)) => Err(ValidationError::EmptyPage { index }),
        None => Ok(()),
    }
}

/// Sort pages ascending by `index`.
pub fn sort_pages(pages: &mut [OnboardingPage]) {
    pages.sort_by_key(|p| p.index);
}

/// Total component count across all pages (top-level only).
pub fn component_count(pages: &[OnboardingPage]) -> usize {
    pages.iter().map(|p| p.components.len()).sum()
}

/// Total leaf inputs across all pages.
pub fn field_count(pages: &[OnboardingPage]) -> usize {
    pages
        .iter()
        .flat_map(|p| &p.components)
        .map(Component::leaf_count)
        .sum()
}

/// The layout installed into an empty store.
pub fn default_pages() -> Vec<OnboardingPage> {
    vec![
        OnboardingPage::new(
            0,
            vec![
                Component::field("About Me", "aboutMe", FieldKind::Textarea),
                Component::group(
                    "Address",
                    "address",
                    vec![
                        Component::field("Street", "street", FieldKind::Text),
                        Component::field("City", "city", FieldKind::Text),
                        Component::field("State", "state", FieldKind::Text),
                        Component::field("Zip Code", "zipCode", FieldKind::Text),
                        Component::field("Country", "country", FieldKind::Text),
                    ],
                ),
            ],
        ),
        OnboardingPage::new(
            1,
            vec![Component::field("Birthday", "birthday", FieldKind::Date)],
        ),
    ]
}
