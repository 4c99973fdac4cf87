//! Value - Concrete attribute values recorded for existing resources

use std::collections::BTreeMap;

use crate::schema::Type;

/// Attribute value as recorded in state
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    pub fn from_json(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => Value::Number(n.clone()),
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(items) => {
                Value::List(items.iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(map) => Value::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Look up an attribute of an object value
    pub fn get(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Map(map) => map.get(name),
            _ => None,
        }
    }

    /// Whether this value can be written for an attribute of the given type
    pub fn conforms_to(&self, ty: &Type) -> bool {
        match (self, ty) {
            (Value::Null, _) | (_, Type::Dynamic) => true,
            (Value::Bool(_), Type::Bool) => true,
            (Value::Number(_), Type::Number) => true,
            (Value::String(_), Type::String) => true,
            (Value::List(items), Type::List(elem) | Type::Set(elem)) => {
                items.iter().all(|item| item.conforms_to(elem))
            }
            (Value::List(items), Type::Tuple(types)) => {
                items.len() == types.len()
                    && items.iter().zip(types).all(|(item, t)| item.conforms_to(t))
            }
            (Value::Map(map), Type::Map(elem)) => map.values().all(|v| v.conforms_to(elem)),
            (Value::Map(map), Type::Object(fields)) => map
                .iter()
                .all(|(k, v)| fields.get(k).is_some_and(|t| v.conforms_to(t))),
            _ => false,
        }
    }

    /// Render as a configuration literal; `indent` is the column of the line holding the value
    pub fn to_literal(&self, indent: usize) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            Value::String(s) => quote(s),
            Value::List(items) => {
                let items: Vec<String> = items.iter().map(|v| v.to_literal(indent)).collect();
                format!("[{}]", items.join(", "))
            }
            Value::Map(map) if map.is_empty() => "{}".to_string(),
            Value::Map(map) => {
                let pad = " ".repeat(indent + 2);
                let mut out = String::from("{\n");
                for (key, value) in map {
                    let key = if is_identifier(key) {
                        key.clone()
                    } else {
                        quote(key)
                    };
                    out.push_str(&format!(
                        "{}{} = {}\n",
                        pad,
                        key,
                        value.to_literal(indent + 2)
                    ));
                }
                out.push_str(&" ".repeat(indent));
                out.push('}');
                out
            }
        }
    }
}

/// Quote and escape a string, including template sequences
fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '$' | '%' if chars.peek() == Some(&'{') => {
                out.push(c);
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

pub(crate) fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalar_literals() {
        assert_eq!(Value::Null.to_literal(2), "null");
        assert_eq!(Value::from_json(&json!(true)).to_literal(2), "true");
        assert_eq!(Value::from_json(&json!(42)).to_literal(2), "42");
        assert_eq!(Value::from_json(&json!(1.5)).to_literal(2), "1.5");
        assert_eq!(
            Value::from_json(&json!("say \"hi\"\n")).to_literal(2),
            r#""say \"hi\"\n""#
        );
    }

    #[test]
    fn template_sequences_are_escaped() {
        let v = Value::String("${var.x} and %{if}".to_string());
        assert_eq!(v.to_literal(0), r#""$${var.x} and %%{if}""#);
        let v = Value::String("cost: $5".to_string());
        assert_eq!(v.to_literal(0), r#""cost: $5""#);
    }

    #[test]
    fn collection_literals() {
        let v = Value::from_json(&json!(["a", "b"]));
        assert_eq!(v.to_literal(2), r#"["a", "b"]"#);

        let v = Value::from_json(&json!({"name": "web", "with space": 1}));
        assert_eq!(
            v.to_literal(2),
            "{\n    name = \"web\"\n    \"with space\" = 1\n  }"
        );
        assert_eq!(Value::from_json(&json!({})).to_literal(2), "{}");
    }

    #[test]
    fn conformance() {
        assert!(Value::Null.conforms_to(&Type::String));
        assert!(Value::from_json(&json!("x")).conforms_to(&Type::String));
        assert!(!Value::from_json(&json!(1)).conforms_to(&Type::String));
        assert!(Value::from_json(&json!(["a"])).conforms_to(&Type::list(Type::String)));
        assert!(!Value::from_json(&json!([1])).conforms_to(&Type::set(Type::String)));
        assert!(Value::from_json(&json!({"a": 1})).conforms_to(&Type::map(Type::Number)));
        assert!(Value::from_json(&json!({"a": 1})).conforms_to(&Type::Dynamic));

        let object = Type::Object(BTreeMap::from([("size".to_string(), Type::Number)]));
        assert!(Value::from_json(&json!({"size": 10})).conforms_to(&object));
        assert!(!Value::from_json(&json!({"other": 10})).conforms_to(&object));

        let tuple = Type::Tuple(vec![Type::String, Type::Bool]);
        assert!(Value::from_json(&json!(["a", true])).conforms_to(&tuple));
        assert!(!Value::from_json(&json!(["a"])).conforms_to(&tuple));
    }
}
