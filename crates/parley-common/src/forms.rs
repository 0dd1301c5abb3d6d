//! Form state, validation and schema-driven widgets.
//!
//! A [`FormSchema`] is plain data (it deserializes from the tagged JSON the
//! admin settings pages are described with). [`FormState`] holds per-field
//! values and error marks, fed by local validators and by server field
//! errors alike.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::envelope::FieldErrors;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormField {
    pub value: String,
    pub is_invalid: bool,
    pub error_msg: String,
}

impl FormField {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            ..Self::default()
        }
    }

    pub fn mark_invalid(&mut self, msg: impl Into<String>) {
        self.is_invalid = true;
        self.error_msg = msg.into();
    }

    pub fn clear_error(&mut self) {
        self.is_invalid = false;
        self.error_msg.clear();
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum Validator {
    Required { msg: String },
    MaxLength { max: usize, msg: String },
    MinLength { min: usize, msg: String },
}

impl Validator {
    /// The error message if `value` fails this rule.
    pub fn check(&self, value: &str) -> Option<&str> {
        let failed = match self {
            Self::Required { .. } => value.trim().is_empty(),
            Self::MaxLength { max, .. } => value.chars().count() > *max,
            Self::MinLength { min, .. } => value.trim().chars().count() < *min,
        };
        failed.then_some(self.msg())
    }

    pub fn msg(&self) -> &str {
        match self {
            Self::Required { msg } | Self::MaxLength { msg, .. } | Self::MinLength { msg, .. } => {
                msg
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

/// The closed set of widgets a schema field can render as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "widget", rename_all = "snake_case")]
pub enum Widget {
    Input {
        #[serde(default)]
        placeholder: String,
    },
    Textarea {
        #[serde(default = "default_rows")]
        rows: u16,
    },
    Select { options: Vec<SelectOption> },
    /// Multiple choice; the value is the chosen option values joined by `,`.
    Checkbox { options: Vec<SelectOption> },
    Radio { options: Vec<SelectOption> },
    Switch,
    Timezone,
    Upload {
        #[serde(default)]
        accept: String,
    },
    /// Read-only heading between groups of fields.
    Legend,
}

fn default_rows() -> u16 {
    3
}

impl Widget {
    pub fn default_value(&self) -> String {
        match self {
            Self::Select { options } | Self::Radio { options } => options
                .first()
                .map(|option| option.value.clone())
                .unwrap_or_default(),
            Self::Switch => "false".to_string(),
            Self::Timezone => "UTC".to_string(),
            Self::Input { .. }
            | Self::Textarea { .. }
            | Self::Checkbox { .. }
            | Self::Upload { .. }
            | Self::Legend => String::new(),
        }
    }

    pub fn accepts_input(&self) -> bool {
        match self {
            Self::Legend => false,
            Self::Input { .. }
            | Self::Textarea { .. }
            | Self::Select { .. }
            | Self::Checkbox { .. }
            | Self::Radio { .. }
            | Self::Switch
            | Self::Timezone
            | Self::Upload { .. } => true,
        }
    }

    /// Whether `value` is something this widget could have produced.
    pub fn allows(&self, value: &str) -> bool {
        match self {
            Self::Select { options } | Self::Radio { options } => {
                value.is_empty() || options.iter().any(|o| o.value == value)
            }
            Self::Checkbox { options } => value
                .split(',')
                .filter(|v| !v.is_empty())
                .all(|v| options.iter().any(|o| o.value == v)),
            Self::Switch => matches!(value, "true" | "false"),
            Self::Legend => value.is_empty(),
            Self::Input { .. } | Self::Textarea { .. } | Self::Timezone | Self::Upload { .. } => {
                true
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(flatten)]
    pub widget: Widget,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validators: Vec<Validator>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormSchema {
    pub fields: Vec<FieldSpec>,
}

impl FormSchema {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|spec| spec.name == name)
    }

    /// Fresh state with every input field at its widget's default.
    pub fn initial_state(&self) -> FormState {
        let fields = self
            .fields
            .iter()
            .filter(|spec| spec.widget.accepts_input())
            .map(|spec| (spec.name.clone(), FormField::new(spec.widget.default_value())))
            .collect();
        FormState { fields }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormState {
    pub fields: BTreeMap<String, FormField>,
}

impl FormState {
    pub fn get(&self, name: &str) -> Option<&FormField> {
        self.fields.get(name)
    }

    pub fn value(&self, name: &str) -> &str {
        self.fields
            .get(name)
            .map(|field| field.value.as_str())
            .unwrap_or_default()
    }

    /// Set a value, clearing any error previously attached to the field.
    pub fn set_value(&mut self, name: &str, value: impl Into<String>) {
        let field = self.fields.entry(name.to_string()).or_default();
        field.value = value.into();
        field.clear_error();
    }

    /// Run every validator in `schema`, marking failing fields with the
    /// first failing rule. Returns whether the form is valid.
    pub fn validate(&mut self, schema: &FormSchema) -> bool {
        let mut valid = true;
        for spec in schema.fields.iter().filter(|s| s.widget.accepts_input()) {
            let field = self.fields.entry(spec.name.clone()).or_default();
            field.clear_error();
            let failure = if spec.widget.allows(&field.value) {
                spec.validators.iter().find_map(|v| v.check(&field.value))
            } else {
                Some("invalid value")
            };
            if let Some(msg) = failure {
                field.mark_invalid(msg);
                valid = false;
            }
        }
        valid
    }

    /// Attach server-side field errors to the named fields.
    pub fn bind_field_errors(&mut self, errors: &FieldErrors) {
        for (name, msg) in errors.entries() {
            self.fields.entry(name.to_string()).or_default().mark_invalid(msg);
        }
    }

    pub fn is_valid(&self) -> bool {
        self.fields.values().all(|field| !field.is_invalid)
    }

    pub fn values(&self) -> BTreeMap<&str, &str> {
        self.fields
            .iter()
            .map(|(name, field)| (name.as_str(), field.value.as_str()))
            .collect()
    }
}

/// Comment box under a question or answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentForm {
    pub state: FormState,
    schema: FormSchema,
}

impl CommentForm {
    pub const REQUIRED_MSG: &'static str = "Comment cannot be empty";
    pub const MAX_LEN: usize = 600;

    pub fn new() -> Self {
        let schema = FormSchema {
            fields: vec![FieldSpec {
                name: "content".into(),
                label: "Comment".into(),
                widget: Widget::Textarea { rows: 2 },
                validators: vec![
                    Validator::Required {
                        msg: Self::REQUIRED_MSG.into(),
                    },
                    Validator::MaxLength {
                        max: Self::MAX_LEN,
                        msg: format!("Comment must be at most {} characters", Self::MAX_LEN),
                    },
                ],
            }],
        };
        Self {
            state: schema.initial_state(),
            schema,
        }
    }

    pub fn content(&self) -> &str {
        self.state.value("content")
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.state.set_value("content", content);
    }

    pub fn validate(&mut self) -> bool {
        self.state.validate(&self.schema)
    }

    pub fn reset(&mut self) {
        self.state = self.schema.initial_state();
    }
}

impl Default for CommentForm {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::ErrorPayload;
    use serde_json::json;

    fn question_schema() -> FormSchema {
        serde_json::from_value(json!({
            "fields": [
                { "name": "title", "widget": "input", "validators": [
                    { "rule": "required", "msg": "title required" },
                    { "rule": "min_length", "min": 6, "msg": "title too short" },
                    { "rule": "max_length", "max": 150, "msg": "title too long" }
                ]},
                { "name": "basics", "widget": "legend" },
                { "name": "visibility", "widget": "select", "options": [
                    { "value": "public", "label": "Public" },
                    { "value": "private", "label": "Private" }
                ]},
                { "name": "notify", "widget": "switch" }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_schema_initial_state() {
        let state = question_schema().initial_state();
        assert_eq!(state.fields.len(), 3);
        assert_eq!(state.value("visibility"), "public");
        assert_eq!(state.value("notify"), "false");
        assert!(state.get("basics").is_none());
    }

    #[test]
    fn test_validate_marks_first_failure() {
        let schema = question_schema();
        let mut state = schema.initial_state();
        assert!(!state.validate(&schema));
        assert_eq!(state.get("title").unwrap().error_msg, "title required");

        state.set_value("title", "short");
        assert!(!state.validate(&schema));
        assert_eq!(state.get("title").unwrap().error_msg, "title too short");

        state.set_value("title", "How do I borrow twice?");
        assert!(state.validate(&schema));
        assert!(state.is_valid());
    }

    #[test]
    fn test_widget_rejects_unknown_option() {
        let schema = question_schema();
        let mut state = schema.initial_state();
        state.set_value("title", "A perfectly fine title");
        state.set_value("visibility", "secret");
        assert!(!state.validate(&schema));
        assert!(state.get("visibility").unwrap().is_invalid);
    }

    #[test]
    fn test_bind_server_errors() {
        let mut state = question_schema().initial_state();
        let payload = ErrorPayload::from_data(&json!({ "key": "title", "value": "title required" }));
        state.bind_field_errors(&FieldErrors::from_payload(payload, ""));
        let title = state.get("title").unwrap();
        assert!(title.is_invalid);
        assert_eq!(title.error_msg, "title required");

        state.set_value("title", "edited");
        assert!(!state.get("title").unwrap().is_invalid);
    }

    #[test]
    fn test_empty_comment_is_invalid() {
        let mut form = CommentForm::new();
        form.set_content("   ");
        assert!(!form.validate());
        let content = form.state.get("content").unwrap();
        assert!(content.is_invalid);
        assert_eq!(content.error_msg, CommentForm::REQUIRED_MSG);

        form.set_content("x".repeat(CommentForm::MAX_LEN + 1));
        assert!(!form.validate());
        form.set_content("Thanks, that fixed it.");
        assert!(form.validate());
    }
}
