//! Filter input types for flexible querying
//!
//! These types enable ORM-style filtering with operators like:
//! - Eq, Ne (equals, not equals)
//! - Lt, Lte, Gt, Gte (comparisons)
//! - Contains, StartsWith, EndsWith (string matching)
//! - In, NotIn (list membership)
//! - IsNull (null checks)
//!
//! Each filter turns into predicates for one column through `to_predicates`.
//! Entity-specific filter structs combine them and implement
//! [`DatabaseFilter`](super::DatabaseFilter).

use serde::{Deserialize, Serialize};

use super::predicate::{Boolean, Operator, Where, contains_pattern};
use super::traits::SqlValue;

/// Filter for string fields
#[derive(Default, Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StringFilter {
    /// Equals
    pub eq: Option<String>,
    /// Not equals
    pub ne: Option<String>,
    /// Contains substring
    pub contains: Option<String>,
    /// Starts with
    pub starts_with: Option<String>,
    /// Ends with
    pub ends_with: Option<String>,
    /// In list
    #[serde(rename = "In")]
    pub in_list: Option<Vec<String>>,
    /// Not in list
    pub not_in: Option<Vec<String>>,
    /// Is null
    pub is_null: Option<bool>,
}

/// Filter for integer fields
#[derive(Default, Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct IntFilter {
    pub eq: Option<i64>,
    pub ne: Option<i64>,
    pub lt: Option<i64>,
    pub lte: Option<i64>,
    pub gt: Option<i64>,
    pub gte: Option<i64>,
    #[serde(rename = "In")]
    pub in_list: Option<Vec<i64>>,
    pub not_in: Option<Vec<i64>>,
    pub is_null: Option<bool>,
}

/// Filter for boolean fields
#[derive(Default, Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BoolFilter {
    pub eq: Option<bool>,
    /// Not equals (opposite of eq)
    pub ne: Option<bool>,
    pub is_null: Option<bool>,
}

fn basic(column: &str, operator: Operator, value: impl Into<SqlValue>) -> Where {
    Where::Basic {
        column: column.to_string(),
        operator,
        value: value.into(),
        boolean: Boolean::And,
    }
}

fn like(column: &str, pattern: String) -> Where {
    Where::Like {
        column: column.to_string(),
        pattern,
        negated: false,
        boolean: Boolean::And,
    }
}

fn in_list(column: &str, values: Vec<SqlValue>, negated: bool) -> Where {
    Where::In {
        column: column.to_string(),
        values,
        negated,
        boolean: Boolean::And,
    }
}

fn null_check(column: &str, is_null: bool) -> Where {
    Where::Null {
        column: column.to_string(),
        negated: !is_null,
        boolean: Boolean::And,
    }
}

/// `%` and `_` escaped, for prefix/suffix patterns built here.
fn escape_like(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

impl StringFilter {
    /// Check if filter has any conditions
    pub fn is_empty(&self) -> bool {
        self.eq.is_none()
            && self.ne.is_none()
            && self.contains.is_none()
            && self.starts_with.is_none()
            && self.ends_with.is_none()
            && self.in_list.as_ref().is_none_or(|v| v.is_empty())
            && self.not_in.as_ref().is_none_or(|v| v.is_empty())
            && self.is_null.is_none()
    }

    /// Predicates for `column`, all joined by AND.
    pub fn to_predicates(&self, column: &str) -> Vec<Where> {
        let mut out = Vec::new();
        if let Some(v) = &self.eq {
            out.push(basic(column, Operator::Eq, v.as_str()));
        }
        if let Some(v) = &self.ne {
            out.push(basic(column, Operator::Ne, v.as_str()));
        }
        if let Some(v) = &self.contains {
            out.push(like(column, contains_pattern(v)));
        }
        if let Some(v) = &self.starts_with {
            out.push(like(column, format!("{}%", escape_like(v))));
        }
        if let Some(v) = &self.ends_with {
            out.push(like(column, format!("%{}", escape_like(v))));
        }
        if let Some(list) = self.in_list.as_ref().filter(|l| !l.is_empty()) {
            out.push(in_list(column, list.iter().map(|s| s.as_str().into()).collect(), false));
        }
        if let Some(list) = self.not_in.as_ref().filter(|l| !l.is_empty()) {
            out.push(in_list(column, list.iter().map(|s| s.as_str().into()).collect(), true));
        }
        if let Some(is_null) = self.is_null {
            out.push(null_check(column, is_null));
        }
        out
    }

    // ========================================================================
    // Helper constructors for programmatic use
    // ========================================================================

    /// Create an equals filter
    pub fn eq(value: impl Into<String>) -> Self {
        Self {
            eq: Some(value.into()),
            ..Default::default()
        }
    }

    /// Create a not-equals filter
    pub fn ne(value: impl Into<String>) -> Self {
        Self {
            ne: Some(value.into()),
            ..Default::default()
        }
    }

    /// Create a contains filter
    pub fn contains(value: impl Into<String>) -> Self {
        Self {
            contains: Some(value.into()),
            ..Default::default()
        }
    }

    /// Create a starts-with filter
    pub fn starts_with(value: impl Into<String>) -> Self {
        Self {
            starts_with: Some(value.into()),
            ..Default::default()
        }
    }

    /// Create an ends-with filter
    pub fn ends_with(value: impl Into<String>) -> Self {
        Self {
            ends_with: Some(value.into()),
            ..Default::default()
        }
    }

    /// Create an in-list filter
    pub fn in_list(values: Vec<String>) -> Self {
        Self {
            in_list: Some(values),
            ..Default::default()
        }
    }

    /// Create an is-null filter
    pub fn is_null() -> Self {
        Self {
            is_null: Some(true),
            ..Default::default()
        }
    }

    /// Create an is-not-null filter
    pub fn is_not_null() -> Self {
        Self {
            is_null: Some(false),
            ..Default::default()
        }
    }
}

impl IntFilter {
    /// Check if filter has any conditions
    pub fn is_empty(&self) -> bool {
        self.eq.is_none()
            && self.ne.is_none()
            && self.lt.is_none()
            && self.lte.is_none()
            && self.gt.is_none()
            && self.gte.is_none()
            && self.in_list.as_ref().is_none_or(|v| v.is_empty())
            && self.not_in.as_ref().is_none_or(|v| v.is_empty())
            && self.is_null.is_none()
    }

    pub fn to_predicates(&self, column: &str) -> Vec<Where> {
        let comparisons = [
            (Operator::Eq, self.eq),
            (Operator::Ne, self.ne),
            (Operator::Lt, self.lt),
            (Operator::Lte, self.lte),
            (Operator::Gt, self.gt),
            (Operator::Gte, self.gte),
        ];
        let mut out: Vec<Where> = comparisons
            .into_iter()
            .filter_map(|(op, value)| value.map(|v| basic(column, op, v)))
            .collect();
        if let Some(list) = self.in_list.as_ref().filter(|l| !l.is_empty()) {
            out.push(in_list(column, list.iter().copied().map(Into::into).collect(), false));
        }
        if let Some(list) = self.not_in.as_ref().filter(|l| !l.is_empty()) {
            out.push(in_list(column, list.iter().copied().map(Into::into).collect(), true));
        }
        if let Some(is_null) = self.is_null {
            out.push(null_check(column, is_null));
        }
        out
    }

    pub fn eq(value: i64) -> Self {
        Self {
            eq: Some(value),
            ..Default::default()
        }
    }

    /// Create a range filter (inclusive)
    pub fn between(min: i64, max: i64) -> Self {
        Self {
            gte: Some(min),
            lte: Some(max),
            ..Default::default()
        }
    }

    /// Create an is-null filter
    pub fn is_null() -> Self {
        Self {
            is_null: Some(true),
            ..Default::default()
        }
    }
}

impl BoolFilter {
    pub fn is_empty(&self) -> bool {
        self.eq.is_none() && self.ne.is_none() && self.is_null.is_none()
    }

    pub fn to_predicates(&self, column: &str) -> Vec<Where> {
        let mut out = Vec::new();
        if let Some(v) = self.eq {
            out.push(basic(column, Operator::Eq, v));
        }
        if let Some(v) = self.ne {
            out.push(basic(column, Operator::Ne, v));
        }
        if let Some(is_null) = self.is_null {
            out.push(null_check(column, is_null));
        }
        out
    }

    pub fn is_true() -> Self {
        Self {
            eq: Some(true),
            ..Default::default()
        }
    }

    pub fn is_false() -> Self {
        Self {
            eq: Some(false),
            ..Default::default()
        }
    }
}
