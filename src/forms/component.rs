//! Recursive form schema: one `Component` per form field.
//!
//! On the wire a component is `{ name, key, type }` where `type` is either one
//! of the leaf kinds (`"text"`, `"textarea"`, `"password"`, `"number"`,
//! `"date"`), a single nested component object, or an array of components.
//! In memory the three shapes are an explicit [`ComponentType`] variant.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// The input control a leaf component renders as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Textarea,
    Password,
    Number,
    Date,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Textarea => "textarea",
            Self::Password => "password",
            Self::Number => "number",
            Self::Date => "date",
        }
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a component holds: a leaf input, one nested component, or a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ComponentType {
    Field(FieldKind),
    Nested(Box<Component>),
    Group(Vec<Component>),
}

/// A single form-field definition, possibly nesting further components.
///
/// `key` only has to be unique among siblings; it is the path segment used
/// when answers are written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    /// Display label.
    pub name: String,
    pub key: String,
    #[serde(rename = "type")]
    pub kind: ComponentType,
}

impl Component {
    /// A leaf input component.
    pub fn field(name: impl Into<String>, key: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            key: key.into(),
            kind: ComponentType::Field(kind),
        }
    }

    /// A component wrapping exactly one child component.
    pub fn nested(name: impl Into<String>, key: impl Into<String>, child: Component) -> Self {
        Self {
            name: name.into(),
            key: key.into(),
            kind: ComponentType::Nested(Box::new(child)),
        }
    }

    /// A component grouping an ordered list of children.
    pub fn group(
        name: impl Into<String>,
        key: impl Into<String>,
        children: Vec<Component>,
    ) -> Self {
        Self {
            name: name.into(),
            key: key.into(),
            kind: ComponentType::Group(children),
        }
    }

    /// Validate an arbitrary JSON value against the recursive component shape.
    pub fn from_value(value: serde_json::Value) -> Result<Self, ValidationError> {
        serde_json::from_value(value).map_err(|e| ValidationError::MalformedBody(e.to_string()))
    }

    /// Number of leaf inputs in this subtree.
    pub fn leaf_count(&self) -> usize {
        match &self.kind {
            ComponentType::Field(_) => 1,
            ComponentType::Nested(child) => child.leaf_count(),
            ComponentType::Group(children) => children.iter().map(Component::leaf_count).sum(),
        }
    }

}
