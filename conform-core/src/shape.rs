//! Shape definitions and the validator that produces them.
//!
//! A shape is a restricted JSON-Schema-like contract: an `"object"` with a
//! closed set of named properties, each tagged with one of five type names.
//! Input shapes additionally carry a non-empty `required` list.
//!
//! [`ShapeDefinition`] values can only be obtained from
//! [`validate_shape_definition`], so every definition in circulation has
//! already passed validation.

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Which of the two shape forms a definition describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    /// Contract for completion requests; requires a `required` list
    Input,
    /// Contract for model replies; has no `required` list
    Output,
}

impl ShapeKind {
    /// Label used in "unexpected field" messages
    fn data_label(&self) -> &'static str {
        match self {
            ShapeKind::Input => "input",
            ShapeKind::Output => "output",
        }
    }

    fn allowed_keys(&self) -> &'static [&'static str] {
        match self {
            ShapeKind::Input => &["type", "properties", "required"],
            ShapeKind::Output => &["type", "properties"],
        }
    }
}

/// Type tag carried by every property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeTag {
    String,
    Number,
    Boolean,
    Array,
    Object,
}

impl TypeTag {
    /// All tags, sorted by name
    pub const ALL: [TypeTag; 5] = [
        TypeTag::Array,
        TypeTag::Boolean,
        TypeTag::Number,
        TypeTag::Object,
        TypeTag::String,
    ];

    /// Parse a wire tag
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "string" => Some(TypeTag::String),
            "number" => Some(TypeTag::Number),
            "boolean" => Some(TypeTag::Boolean),
            "array" => Some(TypeTag::Array),
            "object" => Some(TypeTag::Object),
            _ => None,
        }
    }

    /// Wire name of the tag
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeTag::String => "string",
            TypeTag::Number => "number",
            TypeTag::Boolean => "boolean",
            TypeTag::Array => "array",
            TypeTag::Object => "object",
        }
    }

    /// Check whether a runtime JSON value has this type.
    ///
    /// `number` accepts integers and floats; booleans are never numbers.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            TypeTag::String => value.is_string(),
            TypeTag::Number => value.is_number(),
            TypeTag::Boolean => value.is_boolean(),
            TypeTag::Array => value.is_array(),
            TypeTag::Object => value.is_object(),
        }
    }

    fn valid_names() -> String {
        let names: Vec<&str> = Self::ALL.iter().map(TypeTag::as_str).collect();
        format!("[{}]", names.join(", "))
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declared type of a single property.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertySpec {
    type_tag: TypeTag,
    description: Option<String>,
    properties: Option<BTreeMap<String, PropertySpec>>,
}

impl PropertySpec {
    /// Declared type tag
    pub fn type_tag(&self) -> TypeTag {
        self.type_tag
    }

    /// Optional free-text description, shown to the model
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Nested properties of an object-typed field
    pub fn properties(&self) -> Option<&BTreeMap<String, PropertySpec>> {
        self.properties.as_ref()
    }

    fn to_json(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("type".to_string(), Value::from(self.type_tag.as_str()));
        if let Some(description) = &self.description {
            obj.insert("description".to_string(), Value::from(description.as_str()));
        }
        if let Some(nested) = &self.properties {
            obj.insert("properties".to_string(), properties_to_json(nested));
        }
        Value::Object(obj)
    }
}

/// A validated, immutable shape definition.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeDefinition {
    kind: ShapeKind,
    properties: BTreeMap<String, PropertySpec>,
    required: Vec<String>,
}

impl ShapeDefinition {
    /// Validate a raw input shape
    pub fn input(raw: &Value) -> Result<Self, Vec<String>> {
        validate_shape_definition(raw, ShapeKind::Input)
    }

    /// Validate a raw output shape
    pub fn output(raw: &Value) -> Result<Self, Vec<String>> {
        validate_shape_definition(raw, ShapeKind::Output)
    }

    pub fn kind(&self) -> ShapeKind {
        self.kind
    }

    pub fn properties(&self) -> &BTreeMap<String, PropertySpec> {
        &self.properties
    }

    /// Required field names; always empty for output shapes
    pub fn required(&self) -> &[String] {
        &self.required
    }

    /// Serialize back to the wire form
    pub fn to_json(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("type".to_string(), Value::from("object"));
        obj.insert("properties".to_string(), properties_to_json(&self.properties));
        if self.kind == ShapeKind::Input {
            obj.insert(
                "required".to_string(),
                Value::Array(self.required.iter().cloned().map(Value::from).collect()),
            );
        }
        Value::Object(obj)
    }

    /// Wire form of the `properties` mapping alone, as embedded in prompts
    pub fn properties_json(&self) -> Value {
        properties_to_json(&self.properties)
    }

    /// Validate a data value against this shape.
    ///
    /// See [`validate_value_against_shape`].
    pub fn check(&self, value: &Map<String, Value>) -> Option<Vec<String>> {
        validate_value_against_shape(value, self)
    }
}

impl Serialize for ShapeDefinition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

fn properties_to_json(properties: &BTreeMap<String, PropertySpec>) -> Value {
    Value::Object(
        properties
            .iter()
            .map(|(name, spec)| (name.clone(), spec.to_json()))
            .collect(),
    )
}

/// Validate a raw shape definition.
///
/// Every problem found is reported, in the order: `type`, `properties`,
/// `required` (input only), then keys the definition does not allow.
/// Returns the normalized definition only when the list is empty.
pub fn validate_shape_definition(
    raw: &Value,
    kind: ShapeKind,
) -> Result<ShapeDefinition, Vec<String>> {
    let Some(obj) = raw.as_object() else {
        return Err(vec!["Schema definition must be a JSON object.".to_string()]);
    };

    let mut errors = Vec::new();

    match obj.get("type") {
        Some(Value::String(t)) if t == "object" => {}
        Some(Value::String(t)) => {
            errors.push(format!("The schema 'type' must be 'object'. Found: {}", t))
        }
        Some(other) => errors.push(format!(
            "The schema 'type' must be 'object'. Found: {}",
            other
        )),
        None => errors.push("The schema 'type' must be 'object'. Found: none".to_string()),
    }

    let raw_properties = obj
        .get("properties")
        .and_then(Value::as_object)
        .filter(|props| !props.is_empty());

    let properties = match raw_properties {
        Some(props) => parse_properties(props, None, &mut errors),
        None => {
            errors.push(match kind {
                ShapeKind::Input => "Properties must be defined.".to_string(),
                ShapeKind::Output => "Properties must not be empty.".to_string(),
            });
            BTreeMap::new()
        }
    };

    let required = match kind {
        ShapeKind::Input => parse_required(obj.get("required"), raw_properties, &mut errors),
        ShapeKind::Output => Vec::new(),
    };

    for key in obj.keys() {
        if !kind.allowed_keys().contains(&key.as_str()) {
            errors.push(format!("Unexpected key '{}' in schema definition.", key));
        }
    }

    if errors.is_empty() {
        Ok(ShapeDefinition {
            kind,
            properties,
            required,
        })
    } else {
        Err(errors)
    }
}

fn parse_properties(
    raw: &Map<String, Value>,
    parent: Option<&str>,
    errors: &mut Vec<String>,
) -> BTreeMap<String, PropertySpec> {
    let mut properties = BTreeMap::new();

    for (name, spec) in raw {
        let path = match parent {
            Some(parent) => format!("{}.{}", parent, name),
            None => name.clone(),
        };

        let type_tag = match spec.get("type") {
            Some(Value::String(tag)) => match TypeTag::parse(tag) {
                Some(tag) => Some(tag),
                None => {
                    errors.push(format!(
                        "Type '{}' in properties must be one of {}. Found: {} (in '{}')",
                        tag,
                        TypeTag::valid_names(),
                        tag,
                        path
                    ));
                    None
                }
            },
            _ => {
                errors.push(format!(
                    "Each 'type' in properties must be a string. Found in '{}'.",
                    path
                ));
                None
            }
        };

        let nested = match spec.get("properties") {
            None => None,
            Some(Value::Object(nested)) => Some(parse_properties(nested, Some(&path), errors)),
            Some(_) => {
                errors.push(format!(
                    "Nested 'properties' of '{}' must be an object.",
                    path
                ));
                None
            }
        };

        let description = spec
            .get("description")
            .and_then(Value::as_str)
            .map(str::to_string);

        if let Some(type_tag) = type_tag {
            properties.insert(
                name.clone(),
                PropertySpec {
                    type_tag,
                    description,
                    properties: nested,
                },
            );
        }
    }

    properties
}

fn parse_required(
    raw: Option<&Value>,
    properties: Option<&Map<String, Value>>,
    errors: &mut Vec<String>,
) -> Vec<String> {
    let Some(properties) = properties else {
        errors.push("Properties must be defined before specifying required fields.".to_string());
        return Vec::new();
    };

    let entries = match raw {
        Some(Value::Array(entries)) if !entries.is_empty() => entries,
        Some(Value::Array(_)) | Some(Value::Null) | None => {
            errors.push("Required must be defined.".to_string());
            return Vec::new();
        }
        Some(_) => {
            errors.push("Required must be a list of property names.".to_string());
            return Vec::new();
        }
    };

    let mut required = Vec::with_capacity(entries.len());
    for entry in entries {
        match entry.as_str() {
            Some(field) if properties.contains_key(field) => required.push(field.to_string()),
            Some(field) => errors.push(format!(
                "Required field '{}' is not defined in properties.",
                field
            )),
            None => errors.push("Required entries must be strings.".to_string()),
        }
    }
    required
}

/// Validate a data object against a shape.
///
/// Produces, in order: one issue per missing required field (input shapes
/// only), one per present field whose type does not match its tag, and one
/// per key the shape does not declare. Returns `None` when there are no
/// issues. Only top-level fields are inspected.
pub fn validate_value_against_shape(
    value: &Map<String, Value>,
    shape: &ShapeDefinition,
) -> Option<Vec<String>> {
    let mut issues = Vec::new();

    for field in &shape.required {
        if !value.contains_key(field) {
            issues.push(format!("Missing required field: '{}'", field));
        }
    }

    for (name, spec) in &shape.properties {
        if let Some(field_value) = value.get(name) {
            if !spec.type_tag.matches(field_value) {
                issues.push(format!(
                    "Field '{}' should be of type '{}'.",
                    name, spec.type_tag
                ));
            }
        }
    }

    for key in value.keys() {
        if !shape.properties.contains_key(key) {
            issues.push(format!(
                "Unexpected field '{}' in {} data.",
                key,
                shape.kind.data_label()
            ));
        }
    }

    if issues.is_empty() {
        None
    } else {
        Some(issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn review_input() -> ShapeDefinition {
        ShapeDefinition::input(&json!({
            "type": "object",
            "properties": {"review_text": {"type": "string"}},
            "required": ["review_text"]
        }))
        .unwrap()
    }

    fn sentiment_output() -> ShapeDefinition {
        ShapeDefinition::output(&json!({
            "type": "object",
            "properties": {
                "sentiment": {"type": "string"},
                "score": {"type": "number"}
            }
        }))
        .unwrap()
    }

    fn obj(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_valid_input_shape() {
        let shape = ShapeDefinition::input(&json!({
            "type": "object",
            "properties": {
                "review_text": {"type": "string"},
                "rating": {"type": "number"},
                "metadata": {"type": "object"}
            },
            "required": ["review_text", "rating"]
        }))
        .unwrap();

        assert_eq!(shape.kind(), ShapeKind::Input);
        assert_eq!(shape.properties().len(), 3);
        assert_eq!(
            shape.properties()["rating"].type_tag(),
            TypeTag::Number
        );
        assert_eq!(shape.required(), &["review_text", "rating"]);
    }

    #[test]
    fn test_schema_type_must_be_object() {
        let errors = ShapeDefinition::input(&json!({
            "type": "array",
            "properties": {"review_text": {"type": "string"}},
            "required": ["review_text"]
        }))
        .unwrap_err();
        assert_eq!(
            errors,
            vec!["The schema 'type' must be 'object'. Found: array"]
        );

        let errors = ShapeDefinition::output(&json!({
            "properties": {"a": {"type": "string"}}
        }))
        .unwrap_err();
        assert_eq!(errors, vec!["The schema 'type' must be 'object'. Found: none"]);
    }

    #[test]
    fn test_required_not_in_properties() {
        let errors = ShapeDefinition::input(&json!({
            "type": "object",
            "properties": {"review_text": {"type": "string"}},
            "required": ["nonexistent_field"]
        }))
        .unwrap_err();
        assert_eq!(
            errors,
            vec!["Required field 'nonexistent_field' is not defined in properties."]
        );
    }

    #[test]
    fn test_required_without_properties() {
        let errors = ShapeDefinition::input(&json!({
            "type": "object",
            "required": ["review_text"]
        }))
        .unwrap_err();
        assert_eq!(
            errors,
            vec![
                "Properties must be defined.",
                "Properties must be defined before specifying required fields."
            ]
        );
    }

    #[test]
    fn test_empty_required_is_rejected() {
        for required in [json!([]), Value::Null] {
            let errors = ShapeDefinition::input(&json!({
                "type": "object",
                "properties": {"a": {"type": "string"}},
                "required": required
            }))
            .unwrap_err();
            assert_eq!(errors, vec!["Required must be defined."]);
        }

        let errors = ShapeDefinition::input(&json!({
            "type": "object",
            "properties": {"a": {"type": "string"}}
        }))
        .unwrap_err();
        assert_eq!(errors, vec!["Required must be defined."]);
    }

    #[test]
    fn test_property_type_must_be_string() {
        let errors = ShapeDefinition::input(&json!({
            "type": "object",
            "properties": {"review_text": {"type": 123}},
            "required": ["review_text"]
        }))
        .unwrap_err();
        assert_eq!(
            errors,
            vec!["Each 'type' in properties must be a string. Found in 'review_text'."]
        );

        let errors = ShapeDefinition::output(&json!({
            "type": "object",
            "properties": {"summary": {"description": "no type"}}
        }))
        .unwrap_err();
        assert!(errors[0].contains("Found in 'summary'"));
    }

    #[test]
    fn test_unknown_type_tag() {
        let errors = ShapeDefinition::output(&json!({
            "type": "object",
            "properties": {"score": {"type": "integer"}}
        }))
        .unwrap_err();
        assert_eq!(
            errors,
            vec![
                "Type 'integer' in properties must be one of [array, boolean, number, object, string]. Found: integer (in 'score')"
            ]
        );
    }

    #[test]
    fn test_nested_output_properties_are_checked() {
        let shape = ShapeDefinition::output(&json!({
            "type": "object",
            "properties": {
                "author": {
                    "type": "object",
                    "properties": {
                        "name": {"type": "string"},
                        "links": {"type": "array"}
                    }
                }
            }
        }))
        .unwrap();
        let author = &shape.properties()["author"];
        assert_eq!(author.properties().map(|p| p.len()), Some(2));

        let errors = ShapeDefinition::output(&json!({
            "type": "object",
            "properties": {
                "author": {
                    "type": "object",
                    "properties": {"name": {"type": "text"}}
                }
            }
        }))
        .unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("(in 'author.name')"));
    }

    #[test]
    fn test_empty_output_properties() {
        let errors = ShapeDefinition::output(&json!({
            "type": "object",
            "properties": {}
        }))
        .unwrap_err();
        assert_eq!(errors, vec!["Properties must not be empty."]);
    }

    #[test]
    fn test_closed_definition_keys() {
        let errors = ShapeDefinition::output(&json!({
            "type": "object",
            "properties": {"a": {"type": "string"}},
            "required": ["a"]
        }))
        .unwrap_err();
        assert_eq!(errors, vec!["Unexpected key 'required' in schema definition."]);

        let errors = ShapeDefinition::input(&json!({
            "type": "object",
            "properties": {"a": {"type": "string"}},
            "required": ["a"],
            "additionalProperties": false
        }))
        .unwrap_err();
        assert_eq!(
            errors,
            vec!["Unexpected key 'additionalProperties' in schema definition."]
        );
    }

    #[test]
    fn test_all_errors_are_collected() {
        let errors = ShapeDefinition::input(&json!({
            "type": "string",
            "properties": {"a": {"type": "float"}, "b": {"type": "string"}},
            "required": ["c"]
        }))
        .unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors[0].starts_with("The schema 'type'"));
        assert!(errors[1].starts_with("Type 'float'"));
        assert!(errors[2].starts_with("Required field 'c'"));
    }

    #[test]
    fn test_non_object_definition() {
        let errors = validate_shape_definition(&json!("object"), ShapeKind::Output).unwrap_err();
        assert_eq!(errors, vec!["Schema definition must be a JSON object."]);
    }

    #[test]
    fn test_missing_required_field() {
        let issues = review_input().check(&obj(json!({})));
        assert_eq!(
            issues,
            Some(vec!["Missing required field: 'review_text'".to_string()])
        );
    }

    #[test]
    fn test_unexpected_input_field() {
        let issues = review_input().check(&obj(json!({"review_text": "ok", "extra": 1})));
        assert_eq!(
            issues,
            Some(vec!["Unexpected field 'extra' in input data.".to_string()])
        );
    }

    #[test]
    fn test_valid_value_has_no_issues() {
        assert_eq!(review_input().check(&obj(json!({"review_text": "great"}))), None);
        // Output shapes have no required fields
        assert_eq!(sentiment_output().check(&obj(json!({}))), None);
    }

    #[test]
    fn test_unexpected_count_matches_set_difference() {
        let value = obj(json!({"sentiment": "positive", "x": 1, "y": 2, "z": 3}));
        let issues = sentiment_output().check(&value).unwrap();
        assert_eq!(issues.len(), 3);
        assert!(issues
            .iter()
            .all(|i| i.starts_with("Unexpected field") && i.ends_with("in output data.")));
    }

    #[test]
    fn test_type_fidelity_for_every_tag() {
        let samples = [
            (TypeTag::String, json!("text"), json!(1)),
            (TypeTag::Number, json!(4.5), json!("4.5")),
            (TypeTag::Boolean, json!(true), json!(1)),
            (TypeTag::Array, json!([1, 2]), json!({"a": 1})),
            (TypeTag::Object, json!({"a": 1}), json!([1])),
        ];

        for (tag, good, bad) in samples {
            let shape = ShapeDefinition::output(&json!({
                "type": "object",
                "properties": {"field": {"type": tag.as_str()}}
            }))
            .unwrap();

            assert_eq!(shape.check(&obj(json!({"field": good}))), None);
            assert_eq!(
                shape.check(&obj(json!({"field": bad}))),
                Some(vec![format!("Field 'field' should be of type '{}'.", tag)])
            );
        }
    }

    #[test]
    fn test_integers_are_numbers_but_booleans_are_not() {
        assert!(TypeTag::Number.matches(&json!(3)));
        assert!(TypeTag::Number.matches(&json!(-3)));
        assert!(TypeTag::Number.matches(&json!(0.25)));
        assert!(!TypeTag::Number.matches(&json!(false)));
        assert!(!TypeTag::String.matches(&Value::Null));
    }

    #[test]
    fn test_issue_order_is_stable() {
        let shape = ShapeDefinition::input(&json!({
            "type": "object",
            "properties": {
                "review_text": {"type": "string"},
                "rating": {"type": "number"}
            },
            "required": ["review_text"]
        }))
        .unwrap();
        let value = obj(json!({"rating": "five", "extra": true}));

        let first = shape.check(&value);
        let second = shape.check(&value);
        assert_eq!(first, second);
        assert_eq!(
            first.unwrap(),
            vec![
                "Missing required field: 'review_text'",
                "Field 'rating' should be of type 'number'.",
                "Unexpected field 'extra' in input data.",
            ]
        );
    }

    #[test]
    fn test_definition_survives_serialization() {
        let raw = json!({
            "type": "object",
            "properties": {
                "review_text": {"type": "string", "description": "The review body"},
                "author": {
                    "type": "object",
                    "properties": {"name": {"type": "string"}}
                }
            },
            "required": ["review_text"]
        });
        let shape = ShapeDefinition::input(&raw).unwrap();

        let text = serde_json::to_string(&shape).unwrap();
        let reparsed: Value = serde_json::from_str(&text).unwrap();
        let again = ShapeDefinition::input(&reparsed).unwrap();

        assert_eq!(shape, again);
        assert_eq!(reparsed, raw);
        assert_eq!(
            again.properties()["review_text"].description(),
            Some("The review body")
        );
    }
}
