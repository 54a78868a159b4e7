//! Dynamic form renderer: turns a component tree into bound form controls.
//!
//! Every leaf is bound to a [`FieldPath`] made of its ancestors' keys plus its
//! own. Children of a nested component or group all share the parent's path
//! as their prefix.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use super::answers::{AnswerObject, FieldPath};
use super::component::{Component, ComponentType, FieldKind};
use crate::error::FormError;

/// A typed value entered into a form control.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Date(DateTime<Utc>),
}

impl FieldValue {
    /// Serialize for storage in the answer object.
    ///
    /// Numbers become their decimal string form; dates become an ISO 8601
    /// UTC timestamp with millisecond precision.
    pub fn to_answer_string(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Number(n) => n.to_string(),
            Self::Date(d) => d.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    fn accepted_by(&self, kind: FieldKind) -> bool {
        matches!(
            (self, kind),
            (Self::Text(_), FieldKind::Text | FieldKind::Textarea | FieldKind::Password)
                | (Self::Number(_), FieldKind::Number)
                | (Self::Date(_), FieldKind::Date)
        )
    }
}

/// One editable input bound to a location in the answer object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldBinding {
    pub path: String,
    pub label: String,
    pub kind: FieldKind,
    #[serde(skip)]
    field_path: FieldPath,
}

impl FieldBinding {
    fn new(field_path: FieldPath, label: &str, kind: FieldKind) -> Self {
        Self {
            path: field_path.to_string(),
            label: label.to_string(),
            kind,
            field_path,
        }
    }

    /// Write a value through this binding.
    pub fn write(&self, answers: &mut AnswerObject, value: FieldValue) -> Result<(), FormError> {
        if !value.accepted_by(self.kind) {
            return Err(FormError::KindMismatch {
                path: self.path.clone(),
                expected: self.kind.to_string(),
            });
        }
        answers.set(&self.field_path, value.to_answer_string());
        Ok(())
    }

    /// Read the current value for display, parsed back into its typed form.
    ///
    /// Returns `None` when nothing was written or the stored string does not
    /// parse as this binding's kind.
    pub fn read(&self, answers: &AnswerObject) -> Option<FieldValue> {
        let raw = answers.get_str(&self.field_path)?;
        match self.kind {
            FieldKind::Text | FieldKind::Textarea | FieldKind::Password => {
                Some(FieldValue::Text(raw.to_string()))
            }
            FieldKind::Number => raw.parse().ok().map(FieldValue::Number),
            FieldKind::Date => DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|d| FieldValue::Date(d.with_timezone(&Utc))),
        }
    }
}

/// A rendered form control: either a bound input or a labelled group.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "control", rename_all = "snake_case")]
pub enum FormControl {
    Input(FieldBinding),
    Group {
        label: String,
        path: String,
        children: Vec<FormControl>,
    },
}

impl FormControl {
    /// Flatten into the leaf bindings, in render order.
    pub fn collect_bindings<'a>(&'a self, out: &mut Vec<&'a FieldBinding>) {
        match self {
            Self::Input(binding) => out.push(binding),
            Self::Group { children, .. } => {
                for child in children {
                    child.collect_bindings(out);
                }
            }
        }
    }
}

/// Render one component under the given path prefix.
pub fn render_component(component: &Component, prefix: &FieldPath) -> FormControl {
    let path = prefix.child(&component.key);
    match &component.kind {
        ComponentType::Field(kind) => {
            FormControl::Input(FieldBinding::new(path, &component.name, *kind))
        }
        ComponentType::Nested(child) => FormControl::Group {
            label: component.name.clone(),
            path: path.to_string(),
            children: vec![render_component(child, &path)],
        },
        ComponentType::Group(children) => FormControl::Group {
            label: component.name.clone(),
            path: path.to_string(),
            children: children.iter().map(|c| render_component(c, &path)).collect(),
        },
    }
}

/// Render a page's worth of components from the answer root.
pub fn render_page(components: &[Component]) -> Vec<FormControl> {
    let root = FieldPath::root();
    components.iter().map(|c| render_component(c, &root)).collect()
}

/// All leaf bindings for a page, in render order.
pub fn page_bindings(components: &[Component]) -> Vec<FieldBinding> {
    let controls = render_page(components);
    let mut refs = Vec::new();
    for control in &controls {
        control.collect_bindings(&mut refs);
    }
    refs.into_iter().cloned().collect()
}

/// Find the binding for a dotted path on a page.
pub fn find_binding(components: &[Component], dotted: &str) -> Option<FieldBinding> {
    page_bindings(components).into_iter().find(|b| b.path == dotted)
}

/// A page is complete when every top-level component key has an answer.
///
/// Fields inside nested groups are not inspected.
pub fn is_page_complete(components: &[Component], answers: &AnswerObject) -> bool {
    components.iter().all(|c| answers.is_defined(&c.key))
}
