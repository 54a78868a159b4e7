//! Users: signup validation, password hashing, creation and listing.

pub mod model;
pub mod password;
pub mod registry;
pub mod routes;

pub use model::{Address, CreateUserRequest, DynamicAnswers, StoredUser, UserDataRow};
pub use registry::UserRegistry;
pub use routes::{UserRouteState, user_routes};
