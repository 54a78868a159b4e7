//! Onboarding forms: the persisted page layout, admin-side reassignment of
//! components between pages, and the end-user signup flow that walks those
//! pages in order.

pub mod flow;
pub mod layout;
pub mod manager;
pub mod model;
pub mod routes;

pub use flow::{
    Credentials, Notice, NoticeLevel, SignupFlow, SignupStep, SignupSubmission, SignupSubmitter,
};
pub use layout::{EMPTY_PAGE_WARNING, PageLayout, PageOption};
pub use manager::OnboardingManager;
pub use model::{OnboardingPage, default_pages};
pub use routes::{OnboardingRouteState, onboarding_routes};
