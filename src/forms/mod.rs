//! Form schema, answer building, and rendering.

pub mod answers;
pub mod component;
pub mod renderer;

pub use answers::{AnswerObject, FieldPath};
pub use component::{Component, ComponentType, FieldKind};
pub use renderer::{
    FieldBinding, FieldValue, FormControl, find_binding, is_page_complete, page_bindings,
    render_page,
};
