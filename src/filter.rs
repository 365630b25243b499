// Report Filter Expressions
//
// Boolean predicate trees in the GA4 Data API v1beta JSON shape.
// Expressions are sent to the API as-is and evaluated server side;
// nothing here filters rows locally.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// A node of the filter tree. Serializes as `{"andGroup": {...}}`,
/// `{"notExpression": {...}}`, `{"filter": {...}}` and so on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterExpression {
    AndGroup(FilterExpressionList),
    OrGroup(FilterExpressionList),
    NotExpression(Box<FilterExpression>),
    Filter(Filter),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterExpressionList {
    pub expressions: Vec<FilterExpression>,
}

/// Leaf condition on a single dimension or metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filter {
    pub field_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub string_filter: Option<StringFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_list_filter: Option<InListFilter>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StringFilter {
    pub match_type: MatchType,
    pub value: String,
    #[serde(default)]
    pub case_sensitive: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InListFilter {
    pub values: Vec<String>,
    #[serde(default)]
    pub case_sensitive: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchType {
    Exact,
    BeginsWith,
    EndsWith,
    Contains,
    FullRegexp,
    PartialRegexp,
}

impl FilterExpression {
    fn string_leaf(field: &str, match_type: MatchType, value: &str) -> Self {
        FilterExpression::Filter(Filter {
            field_name: field.to_string(),
            string_filter: Some(StringFilter {
                match_type,
                value: value.to_string(),
                case_sensitive: false,
            }),
            in_list_filter: None,
        })
    }

    pub fn contains(field: &str, value: &str) -> Self {
        Self::string_leaf(field, MatchType::Contains, value)
    }

    pub fn exact(field: &str, value: &str) -> Self {
        Self::string_leaf(field, MatchType::Exact, value)
    }

    pub fn in_list(field: &str, values: &[&str]) -> Self {
        FilterExpression::Filter(Filter {
            field_name: field.to_string(),
            string_filter: None,
            in_list_filter: Some(InListFilter {
                values: values.iter().map(|v| v.to_string()).collect(),
                case_sensitive: false,
            }),
        })
    }

    pub fn not(inner: FilterExpression) -> Self {
        FilterExpression::NotExpression(Box::new(inner))
    }

    pub fn and(expressions: Vec<FilterExpression>) -> Self {
        FilterExpression::AndGroup(FilterExpressionList { expressions })
    }

    pub fn or(expressions: Vec<FilterExpression>) -> Self {
        FilterExpression::OrGroup(FilterExpressionList { expressions })
    }

    /// Conjunction of "field does not contain substring" conditions.
    /// Returns None for an empty list; a single pair is not wrapped in a group.
    pub fn exclude_contains(pairs: &[(String, String)]) -> Option<Self> {
        let mut negated: Vec<FilterExpression> = pairs
            .iter()
            .map(|(field, value)| Self::not(Self::contains(field, value)))
            .collect();

        match negated.len() {
            0 => None,
            1 => negated.pop(),
            _ => Some(Self::and(negated)),
        }
    }

    /// Parse a complete expression given in the API's own JSON form
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// Parse a `field:substring` exclusion. The substring may itself contain ':'.
pub fn parse_exclusion(raw: &str) -> Result<(String, String)> {
    match raw.split_once(':') {
        Some((field, value)) if !field.trim().is_empty() && !value.is_empty() => {
            Ok((field.trim().to_string(), value.to_string()))
        }
        _ => bail!("invalid exclusion '{}', expected field:substring", raw),
    }
}
