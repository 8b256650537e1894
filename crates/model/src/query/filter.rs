//! Filter inputs in the shape the Refine data-provider contract sends them.

use crate::{core::value::Value, query::error::FilterError};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Leaf comparison operators. `and`/`or` live in [`Combinator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    Ne,
    Lt,
    Gt,
    Lte,
    Gte,
    In,
    Ina,
    Nin,
    Nina,
    Contains,
    NContains,
    ContainsS,
    NContainsS,
    StartsWith,
    NStartsWith,
    StartsWithS,
    NStartsWithS,
    EndsWith,
    NEndsWith,
    EndsWithS,
    NEndsWithS,
    Null,
    NNull,
    Between,
    NBetween,
}

/// Where the wildcards go around a text-match value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextMatch {
    Contains,
    StartsWith,
    EndsWith,
}

impl Operator {
    pub const ALL: [Operator; 26] = [
        Operator::Eq,
        Operator::Ne,
        Operator::Lt,
        Operator::Gt,
        Operator::Lte,
        Operator::Gte,
        Operator::In,
        Operator::Ina,
        Operator::Nin,
        Operator::Nina,
        Operator::Contains,
        Operator::NContains,
        Operator::ContainsS,
        Operator::NContainsS,
        Operator::StartsWith,
        Operator::NStartsWith,
        Operator::StartsWithS,
        Operator::NStartsWithS,
        Operator::EndsWith,
        Operator::NEndsWith,
        Operator::EndsWithS,
        Operator::NEndsWithS,
        Operator::Null,
        Operator::NNull,
        Operator::Between,
        Operator::NBetween,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::Ne => "ne",
            Operator::Lt => "lt",
            Operator::Gt => "gt",
            Operator::Lte => "lte",
            Operator::Gte => "gte",
            Operator::In => "in",
            Operator::Ina => "ina",
            Operator::Nin => "nin",
            Operator::Nina => "nina",
            Operator::Contains => "contains",
            Operator::NContains => "ncontains",
            Operator::ContainsS => "containss",
            Operator::NContainsS => "ncontainss",
            Operator::StartsWith => "startswith",
            Operator::NStartsWith => "nstartswith",
            Operator::StartsWithS => "startswiths",
            Operator::NStartsWithS => "nstartswiths",
            Operator::EndsWith => "endswith",
            Operator::NEndsWith => "nendswith",
            Operator::EndsWithS => "endswiths",
            Operator::NEndsWithS => "nendswiths",
            Operator::Null => "null",
            Operator::NNull => "nnull",
            Operator::Between => "between",
            Operator::NBetween => "nbetween",
        }
    }

    /// Returns `(kind, negated, case_sensitive)` for the LIKE family.
    pub fn text_match(&self) -> Option<(TextMatch, bool, bool)> {
        use Operator::*;
        let parts = match self {
            Contains => (TextMatch::Contains, false, false),
            NContains => (TextMatch::Contains, true, false),
            ContainsS => (TextMatch::Contains, false, true),
            NContainsS => (TextMatch::Contains, true, true),
            StartsWith => (TextMatch::StartsWith, false, false),
            NStartsWith => (TextMatch::StartsWith, true, false),
            StartsWithS => (TextMatch::StartsWith, false, true),
            NStartsWithS => (TextMatch::StartsWith, true, true),
            EndsWith => (TextMatch::EndsWith, false, false),
            NEndsWith => (TextMatch::EndsWith, true, false),
            EndsWithS => (TextMatch::EndsWith, false, true),
            NEndsWithS => (TextMatch::EndsWith, true, true),
            _ => return None,
        };
        Some(parts)
    }
}

impl FromStr for Operator {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operator::ALL
            .iter()
            .find(|op| op.as_str() == s)
            .copied()
            .ok_or_else(|| FilterError::UnknownOperator(s.to_string()))
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Combinator {
    And,
    Or,
}

impl Combinator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Combinator::And => "and",
            Combinator::Or => "or",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogicalFilter {
    pub field: String,
    pub operator: Operator,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalFilter {
    /// Optional client-side label; carried through but never compiled.
    pub key: Option<String>,
    pub operator: Combinator,
    pub value: Vec<Filter>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "serde_json::Value", into = "serde_json::Value")]
pub enum Filter {
    Logical(LogicalFilter),
    Conditional(ConditionalFilter),
}

impl Filter {
    pub fn leaf(field: &str, operator: Operator, value: impl Into<Value>) -> Self {
        Filter::Logical(LogicalFilter {
            field: field.to_string(),
            operator,
            value: value.into(),
        })
    }

    pub fn eq(field: &str, value: impl Into<Value>) -> Self {
        Self::leaf(field, Operator::Eq, value)
    }

    pub fn ne(field: &str, value: impl Into<Value>) -> Self {
        Self::leaf(field, Operator::Ne, value)
    }

    pub fn lt(field: &str, value: impl Into<Value>) -> Self {
        Self::leaf(field, Operator::Lt, value)
    }

    pub fn gt(field: &str, value: impl Into<Value>) -> Self {
        Self::leaf(field, Operator::Gt, value)
    }

    pub fn lte(field: &str, value: impl Into<Value>) -> Self {
        Self::leaf(field, Operator::Lte, value)
    }

    pub fn gte(field: &str, value: impl Into<Value>) -> Self {
        Self::leaf(field, Operator::Gte, value)
    }

    pub fn in_list(field: &str, values: Vec<Value>) -> Self {
        Self::leaf(field, Operator::In, Value::List(values))
    }

    pub fn contains(field: &str, value: &str) -> Self {
        Self::leaf(field, Operator::Contains, value)
    }

    pub fn is_null(field: &str) -> Self {
        Self::leaf(field, Operator::Null, Value::Null)
    }

    pub fn between(field: &str, low: impl Into<Value>, high: impl Into<Value>) -> Self {
        Self::leaf(
            field,
            Operator::Between,
            Value::List(vec![low.into(), high.into()]),
        )
    }

    pub fn and(filters: Vec<Filter>) -> Self {
        Filter::Conditional(ConditionalFilter {
            key: None,
            operator: Combinator::And,
            value: filters,
        })
    }

    pub fn or(filters: Vec<Filter>) -> Self {
        Filter::Conditional(ConditionalFilter {
            key: None,
            operator: Combinator::Or,
            value: filters,
        })
    }

    /// Parses one filter from its JSON form:
    /// `{"field", "operator", "value"}` or `{"operator": "and"|"or", "value": [...]}`.
    pub fn from_json(json: &serde_json::Value) -> Result<Self, FilterError> {
        let object = json
            .as_object()
            .ok_or_else(|| FilterError::Malformed(format!("expected an object, got {json}")))?;

        let operator = object
            .get("operator")
            .and_then(|op| op.as_str())
            .ok_or_else(|| FilterError::Malformed("filter is missing an operator".into()))?;
        let value = object.get("value").cloned().unwrap_or(serde_json::Value::Null);

        match operator {
            "and" | "or" => {
                let children = value.as_array().ok_or_else(|| FilterError::InvalidValue {
                    operator: operator.to_string(),
                    reason: "a conditional group expects an array of filters".into(),
                })?;
                let combinator = if operator == "and" {
                    Combinator::And
                } else {
                    Combinator::Or
                };
                Ok(Filter::Conditional(ConditionalFilter {
                    key: object
                        .get("key")
                        .and_then(|k| k.as_str())
                        .map(String::from),
                    operator: combinator,
                    value: children
                        .iter()
                        .map(Filter::from_json)
                        .collect::<Result<_, _>>()?,
                }))
            }
            other => {
                let operator = Operator::from_str(other)?;
                let field = object
                    .get("field")
                    .and_then(|f| f.as_str())
                    .ok_or_else(|| {
                        FilterError::Malformed(format!("'{operator}' filter is missing a field"))
                    })?;
                Ok(Filter::Logical(LogicalFilter {
                    field: field.to_string(),
                    operator,
                    value: Value::from(value),
                }))
            }
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Filter::Logical(leaf) => serde_json::json!({
                "field": leaf.field,
                "operator": leaf.operator.as_str(),
                "value": serde_json::Value::from(&leaf.value),
            }),
            Filter::Conditional(group) => {
                let mut json = serde_json::json!({
                    "operator": group.operator.as_str(),
                    "value": group.value.iter().map(Filter::to_json).collect::<Vec<_>>(),
                });
                if let (Some(key), Some(object)) = (&group.key, json.as_object_mut()) {
                    object.insert("key".into(), serde_json::Value::String(key.clone()));
                }
                json
            }
        }
    }
}

impl TryFrom<serde_json::Value> for Filter {
    type Error = FilterError;

    fn try_from(json: serde_json::Value) -> Result<Self, Self::Error> {
        Filter::from_json(&json)
    }
}

impl From<Filter> for serde_json::Value {
    fn from(filter: Filter) -> Self {
        filter.to_json()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_every_operator_parses_from_its_tag() {
        for op in Operator::ALL {
            assert_eq!(op.as_str().parse::<Operator>().unwrap(), op);
        }
    }

    #[test]
    fn test_unknown_operator_is_named() {
        let err = Filter::from_json(&json!({"field": "x", "operator": "bogus", "value": 1}))
            .unwrap_err();
        assert!(matches!(err, FilterError::UnknownOperator(ref op) if op == "bogus"));
    }

    #[test]
    fn test_nested_groups_parse() {
        let filter = Filter::from_json(&json!({
            "operator": "and",
            "value": [
                {"field": "name", "operator": "eq", "value": "John"},
                {"operator": "or", "value": [
                    {"field": "age", "operator": "lt", "value": 30},
                    {"field": "age", "operator": "gt", "value": 60}
                ]}
            ]
        }))
        .unwrap();

        let expected = Filter::and(vec![
            Filter::eq("name", "John"),
            Filter::or(vec![Filter::lt("age", 30), Filter::gt("age", 60)]),
        ]);
        assert_eq!(filter, expected);
    }

    #[test]
    fn test_group_value_must_be_an_array() {
        let err = Filter::from_json(&json!({"operator": "or", "value": 3})).unwrap_err();
        assert!(matches!(err, FilterError::InvalidValue { .. }));
    }

    #[test]
    fn test_serde_uses_refine_shape() {
        let filter: Filter =
            serde_json::from_value(json!({"field": "status", "operator": "in", "value": ["a"]}))
                .unwrap();
        assert_eq!(filter, Filter::in_list("status", vec![Value::from("a")]));

        let json = serde_json::to_value(&filter).unwrap();
        assert_eq!(json["operator"], "in");
    }

    #[test]
    fn test_text_match_decomposition() {
        assert_eq!(
            Operator::NStartsWithS.text_match(),
            Some((TextMatch::StartsWith, true, true))
        );
        assert_eq!(Operator::Eq.text_match(), None);
    }
}
