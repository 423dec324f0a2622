//! JSON rule-file codec
//!
//! A question node is an object with exactly one key (the question) whose
//! value holds the two branch keys; a branch is a nested question object, a
//! diagnosis string, or `{}`. The top level maps locations to trees.

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::{DomainError, Location, RuleNode, RuleStore};

/// Alternative spellings accepted for the `yes` branch when reading.
const YES_ALIASES: [&str; 3] = ["sí", "si", "yes"];

/// Rule file content that does not describe a rule store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{pointer}: {message}")]
pub struct CodecError {
    /// JSON-pointer-like position of the offending value.
    pub pointer: String,
    pub message: String,
}

impl CodecError {
    fn new(pointer: &str, message: impl Into<String>) -> Self {
        Self {
            pointer: if pointer.is_empty() { "/".to_string() } else { pointer.to_string() },
            message: message.into(),
        }
    }
}

/// Keys naming the two branches of a question in the rule file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchLabels {
    pub yes: String,
    pub no: String,
}

impl Default for BranchLabels {
    fn default() -> Self {
        Self {
            yes: "sí".to_string(),
            no: "no".to_string(),
        }
    }
}

impl BranchLabels {
    pub fn new(yes: impl Into<String>, no: impl Into<String>) -> Self {
        Self {
            yes: yes.into(),
            no: no.into(),
        }
    }

    fn find_yes<'a>(&self, branches: &'a Map<String, Value>) -> Option<&'a Value> {
        branches.get(&self.yes).or_else(|| {
            YES_ALIASES
                .iter()
                .filter(|alias| **alias != self.no)
                .find_map(|alias| branches.get(*alias))
        })
    }
}

pub fn encode_node(node: &RuleNode, labels: &BranchLabels) -> Value {
    match node {
        RuleNode::Empty => Value::Object(Map::new()),
        RuleNode::Diagnosis(text) => Value::String(text.clone()),
        RuleNode::Question { text, yes, no } => {
            let mut branches = Map::new();
            branches.insert(labels.yes.clone(), encode_node(yes, labels));
            branches.insert(labels.no.clone(), encode_node(no, labels));
            let mut question = Map::new();
            question.insert(text.clone(), Value::Object(branches));
            Value::Object(question)
        }
    }
}

pub fn encode_store(store: &RuleStore, labels: &BranchLabels) -> Value {
    let rules: Map<String, Value> = store
        .iter()
        .map(|(location, root)| (location.to_string(), encode_node(root, labels)))
        .collect();
    Value::Object(rules)
}

/// Pretty JSON with 4-space indent; non-ASCII text is written as-is.
pub fn to_pretty_string(value: &Value) -> Result<String, serde_json::Error> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    buf.push(b'\n');
    // serde_json only emits valid UTF-8
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

pub fn decode_node(value: &Value, labels: &BranchLabels) -> Result<RuleNode, CodecError> {
    decode_at(value, labels, "")
}

fn decode_at(value: &Value, labels: &BranchLabels, pointer: &str) -> Result<RuleNode, CodecError> {
    match value {
        Value::String(text) => Ok(RuleNode::diagnosis(text.as_str())),
        Value::Object(map) if map.is_empty() => Ok(RuleNode::Empty),
        Value::Object(map) if map.len() == 1 => {
            let (text, branches) = map
                .iter()
                .next()
                .ok_or_else(|| CodecError::new(pointer, "empty question object"))?;
            let here = format!("{}/{}", pointer, text);
            if text.trim().is_empty() {
                return Err(CodecError::new(&here, "blank question text"));
            }
            let Value::Object(branches) = branches else {
                return Err(CodecError::new(&here, "question must map to an object of branches"));
            };
            let yes = match labels.find_yes(branches) {
                Some(v) => decode_at(v, labels, &format!("{}/{}", here, labels.yes))?,
                None => RuleNode::Empty,
            };
            let no = match branches.get(&labels.no) {
                Some(v) => decode_at(v, labels, &format!("{}/{}", here, labels.no))?,
                None => RuleNode::Empty,
            };
            Ok(RuleNode::Question {
                text: text.clone(),
                yes: Box::new(yes),
                no: Box::new(no),
            })
        }
        Value::Object(map) => Err(CodecError::new(
            pointer,
            format!("expected a single question, found {} keys", map.len()),
        )),
        other => Err(CodecError::new(
            pointer,
            format!("expected question object or diagnosis string, found {}", kind(other)),
        )),
    }
}

pub fn decode_store(value: &Value, labels: &BranchLabels) -> Result<RuleStore, CodecError> {
    let Value::Object(rules) = value else {
        return Err(CodecError::new("", format!("expected an object of locations, found {}", kind(value))));
    };
    let mut store = RuleStore::new();
    for (raw, tree) in rules {
        let pointer = format!("/{}", raw);
        let location = Location::parse(raw).map_err(|e: DomainError| CodecError::new(&pointer, e.to_string()))?;
        if store.contains(&location) {
            return Err(CodecError::new(
                &pointer,
                format!("location '{}' appears more than once", location),
            ));
        }
        let root = decode_at(tree, labels, &pointer)?;
        if matches!(root, RuleNode::Diagnosis(_)) {
            return Err(CodecError::new(&pointer, "a location must start with a question"));
        }
        store.insert(location, root);
    }
    Ok(store)
}

pub fn parse_store(content: &str, labels: &BranchLabels) -> Result<RuleStore, CodecError> {
    let value: Value = serde_json::from_str(content).map_err(|e| CodecError::new("", e.to_string()))?;
    decode_store(&value, labels)
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn given_spanish_keyed_file_when_decoding_then_typed_tree() {
        let value = json!({"fiebre?": {"sí": "gripe", "no": {}}});
        let node = decode_node(&value, &BranchLabels::default()).unwrap();
        assert_eq!(node, RuleNode::question_with_diagnosis("fiebre?", "gripe"));
    }

    #[test]
    fn given_english_yes_key_when_decoding_then_accepted() {
        let value = json!({"fever?": {"yes": "flu", "no": {}}});
        let node = decode_node(&value, &BranchLabels::default()).unwrap();
        assert_eq!(node, RuleNode::question_with_diagnosis("fever?", "flu"));
    }

    #[test]
    fn given_missing_branch_when_decoding_then_empty() {
        let value = json!({"fiebre?": {"sí": "gripe"}});
        let node = decode_node(&value, &BranchLabels::default()).unwrap();
        assert_eq!(node.branch(false), Some(&RuleNode::Empty));
    }

    #[test]
    fn given_two_questions_in_one_node_when_decoding_then_error_names_position() {
        let value = json!({"cabeza": {"fiebre?": {"sí": {"a?": {}, "b?": {}}, "no": {}}}});
        let err = decode_store(&value, &BranchLabels::default()).unwrap_err();
        assert_eq!(err.pointer, "/cabeza/fiebre?/sí");
    }

    #[test]
    fn given_keys_differing_only_in_case_when_decoding_then_duplicate_error() {
        let value = json!({
            "Cabeza": {"fiebre?": {"sí": "gripe", "no": {}}},
            "cabeza": {"tos?": {"sí": "resfriado", "no": {}}}
        });
        let err = decode_store(&value, &BranchLabels::default()).unwrap_err();
        assert!(err.message.contains("more than once"), "{err}");
    }

    #[test]
    fn given_number_leaf_when_decoding_then_error() {
        let value = json!({"fiebre?": {"sí": 3, "no": {}}});
        assert!(decode_node(&value, &BranchLabels::default()).is_err());
    }

    #[test]
    fn given_tree_when_encoding_then_uses_configured_labels() {
        let node = RuleNode::question_with_diagnosis("fever?", "flu");
        let value = encode_node(&node, &BranchLabels::new("yes", "no"));
        assert_eq!(value, json!({"fever?": {"yes": "flu", "no": {}}}));
    }

    #[test]
    fn given_non_ascii_text_when_pretty_printing_then_not_escaped() {
        let value = json!({"cabeza": {"¿fiebre?": {"sí": "migraña", "no": {}}}});
        let text = to_pretty_string(&value).unwrap();
        assert!(text.contains("migraña"));
        assert!(text.contains("\n    \"cabeza\""));
    }
}
