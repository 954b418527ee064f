//! Structural contracts for response bodies.
//!
//! A [`Contract`] is a small schema: scalar kinds, string enums, arrays,
//! nullable values and objects with required/optional fields. Checking walks
//! the body recursively and reports every mismatch with its JSON path.
//!
//! ```ignore
//! let product = object()
//!     .required("_id", string())
//!     .required("price", number())
//!     .optional("notes", string())
//!     .closed();
//! ```

use serde_json::Value;

use super::CheckFailure;

#[derive(Debug, Clone, PartialEq)]
pub enum Contract {
    Any,
    String,
    Number,
    Integer,
    Bool,
    OneOfStr(Vec<String>),
    Nullable(Box<Contract>),
    Array(Box<Contract>),
    Object(ObjectContract),
}

#[derive(Debug, Clone, PartialEq)]
struct Field {
    name: String,
    contract: Contract,
    required: bool,
}

/// An object shape. Fields are checked in declaration order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectContract {
    fields: Vec<Field>,
    closed: bool,
}

impl ObjectContract {
    pub fn required(mut self, name: &str, contract: impl Into<Contract>) -> Self {
        self.fields.push(Field {
            name: name.to_string(),
            contract: contract.into(),
            required: true,
        });
        self
    }

    pub fn optional(mut self, name: &str, contract: impl Into<Contract>) -> Self {
        self.fields.push(Field {
            name: name.to_string(),
            contract: contract.into(),
            required: false,
        });
        self
    }

    /// Undeclared fields become failures.
    pub fn closed(mut self) -> Self {
        self.closed = true;
        self
    }
}

impl From<ObjectContract> for Contract {
    fn from(object: ObjectContract) -> Self {
        Contract::Object(object)
    }
}

pub fn object() -> ObjectContract {
    ObjectContract::default()
}

pub fn array(items: impl Into<Contract>) -> Contract {
    Contract::Array(Box::new(items.into()))
}

pub fn nullable(inner: impl Into<Contract>) -> Contract {
    Contract::Nullable(Box::new(inner.into()))
}

pub fn one_of_str(values: &[&str]) -> Contract {
    Contract::OneOfStr(values.iter().map(|v| v.to_string()).collect())
}

pub fn string() -> Contract {
    Contract::String
}

pub fn number() -> Contract {
    Contract::Number
}

pub fn integer() -> Contract {
    Contract::Integer
}

pub fn boolean() -> Contract {
    Contract::Bool
}

pub fn any() -> Contract {
    Contract::Any
}

/// Short description of a JSON value's kind, used as the `actual` side.
pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl Contract {
    fn describe(&self) -> String {
        match self {
            Contract::Any => "any".to_string(),
            Contract::String => "string".to_string(),
            Contract::Number => "number".to_string(),
            Contract::Integer => "integer".to_string(),
            Contract::Bool => "boolean".to_string(),
            Contract::OneOfStr(values) => format!("one of {values:?}"),
            Contract::Nullable(inner) => format!("{} or null", inner.describe()),
            Contract::Array(_) => "array".to_string(),
            Contract::Object(_) => "object".to_string(),
        }
    }

    /// Checks `value` against this contract, rooted at `$`.
    pub fn check(&self, value: &Value) -> Vec<CheckFailure> {
        let mut failures = Vec::new();
        self.walk(value, "$", &mut failures);
        failures
    }

    fn walk(&self, value: &Value, path: &str, failures: &mut Vec<CheckFailure>) {
        let mismatch = |failures: &mut Vec<CheckFailure>| {
            failures.push(CheckFailure::new(path, self.describe(), kind_of(value)));
        };

        match self {
            Contract::Any => {}
            Contract::String if !value.is_string() => mismatch(failures),
            Contract::Number if !value.is_number() => mismatch(failures),
            Contract::Integer if !(value.is_i64() || value.is_u64()) => mismatch(failures),
            Contract::Bool if !value.is_boolean() => mismatch(failures),
            Contract::String | Contract::Number | Contract::Integer | Contract::Bool => {}
            Contract::OneOfStr(allowed) => match value.as_str() {
                Some(s) if allowed.iter().any(|a| a == s) => {}
                Some(s) => failures.push(CheckFailure::new(path, self.describe(), format!("{s:?}"))),
                None => mismatch(failures),
            },
            Contract::Nullable(inner) => {
                if !value.is_null() {
                    inner.walk(value, path, failures);
                }
            }
            Contract::Array(items) => match value.as_array() {
                Some(elements) => {
                    for (i, element) in elements.iter().enumerate() {
                        items.walk(element, &format!("{path}[{i}]"), failures);
                    }
                }
                None => mismatch(failures),
            },
            Contract::Object(shape) => match value.as_object() {
                Some(map) => {
                    for field in &shape.fields {
                        let field_path = format!("{path}.{}", field.name);
                        match map.get(&field.name) {
                            Some(v) => field.contract.walk(v, &field_path, failures),
                            None if field.required => failures.push(CheckFailure::new(
                                field_path,
                                "required field",
                                "missing",
                            )),
                            None => {}
                        }
                    }
                    if shape.closed {
                        for key in map.keys() {
                            if !shape.fields.iter().any(|f| &f.name == key) {
                                failures.push(CheckFailure::new(
                                    format!("{path}.{key}"),
                                    "no such field",
                                    "unexpected field",
                                ));
                            }
                        }
                    }
                }
                None => mismatch(failures),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn product() -> Contract {
        object()
            .required("_id", string())
            .required("price", number())
            .required("amount", integer())
            .optional("notes", string())
            .closed()
            .into()
    }

    #[test]
    fn reports_each_missing_field_with_its_path() {
        let contract: Contract = object().required("Product", product()).into();
        let failures = contract.check(&json!({"Product": {"amount": 3}}));

        let paths: Vec<_> = failures.iter().map(|f| f.check.as_str()).collect();
        assert_eq!(paths, vec!["$.Product._id", "$.Product.price"]);
        assert!(failures.iter().all(|f| f.actual == "missing"));
    }

    #[test]
    fn array_elements_are_indexed() {
        let contract = array(product());
        let failures = contract.check(&json!([
            {"_id": "a", "price": 1.5, "amount": 1},
            {"_id": 7, "price": 1.5, "amount": 1}
        ]));

        assert_eq!(failures, vec![CheckFailure::new("$[1]._id", "string", "integer")]);
    }

    #[test]
    fn closed_objects_reject_unknown_fields() {
        let failures = product().check(&json!({"_id": "a", "price": 2, "amount": 1, "extra": true}));
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].check, "$.extra");
    }

    #[test]
    fn nullable_and_enum_values() {
        let contract: Contract = object()
            .required("delivery", nullable(object().required("city", string())))
            .required("status", one_of_str(&["Draft", "Confirmed"]))
            .into();

        assert!(contract.check(&json!({"delivery": null, "status": "Draft"})).is_empty());

        let failures = contract.check(&json!({"delivery": {}, "status": "Lost"}));
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].check, "$.delivery.city");
        assert_eq!(failures[1].actual, "\"Lost\"");
    }
}
