//! Predicate tree for entity queries
//!
//! A query's WHERE clause is an ordered list of [`Where`] nodes. Every node
//! carries the [`Boolean`] combinator that joins it to the node before it;
//! the combinator of the first node in a list is never rendered. Grouped
//! predicates are stored as a single [`Where::Nested`] node holding their own
//! list, so a query always has exactly one tree.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::traits::SqlValue;
use crate::error::Error;

/// Escape character written into `LIKE ... ESCAPE` clauses.
pub const LIKE_ESCAPE: char = '\\';

/// Boolean combinator joining a predicate to its siblings.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Boolean {
    #[default]
    And,
    Or,
}

impl Boolean {
    pub fn to_sql(&self) -> &'static str {
        match self {
            Boolean::And => "AND",
            Boolean::Or => "OR",
        }
    }
}

impl fmt::Display for Boolean {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_sql())
    }
}

impl FromStr for Boolean {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AND" => Ok(Boolean::And),
            "OR" => Ok(Boolean::Or),
            _ => Err(Error::InvalidBoolean(s.to_string())),
        }
    }
}

/// Comparison operator for basic predicates.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Operator {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl Operator {
    pub fn to_sql(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "<>",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
        }
    }
}

impl FromStr for Operator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "=" | "==" => Ok(Operator::Eq),
            "<>" | "!=" => Ok(Operator::Ne),
            "<" => Ok(Operator::Lt),
            "<=" => Ok(Operator::Lte),
            ">" => Ok(Operator::Gt),
            ">=" => Ok(Operator::Gte),
            other => Err(Error::InvalidOperator(other.to_string())),
        }
    }
}

/// How bind parameters are rendered in compiled SQL.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum PlaceholderStyle {
    /// `?1`, `?2`, ... (SQLite)
    #[default]
    Numbered,
    /// `$1`, `$2`, ... (PostgreSQL)
    Dollar,
    /// `?` for every parameter
    Anonymous,
}

impl PlaceholderStyle {
    /// Render the placeholder for the 1-based parameter `index`.
    pub fn placeholder(&self, index: usize) -> String {
        match self {
            PlaceholderStyle::Numbered => format!("?{}", index),
            PlaceholderStyle::Dollar => format!("${}", index),
            PlaceholderStyle::Anonymous => "?".to_string(),
        }
    }
}

impl FromStr for PlaceholderStyle {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "numbered" | "sqlite" => Ok(PlaceholderStyle::Numbered),
            "dollar" | "postgres" | "postgresql" => Ok(PlaceholderStyle::Dollar),
            "anonymous" | "mysql" => Ok(PlaceholderStyle::Anonymous),
            _ => Err(Error::InvalidPlaceholderStyle(s.to_string())),
        }
    }
}

/// A single node of the predicate tree.
#[derive(Clone, Debug, PartialEq)]
pub enum Where {
    /// `column <op> value`
    Basic {
        column: String,
        operator: Operator,
        value: SqlValue,
        boolean: Boolean,
    },
    /// `column [NOT] IN (values)`
    In {
        column: String,
        values: Vec<SqlValue>,
        negated: bool,
        boolean: Boolean,
    },
    /// `column IS [NOT] NULL`
    Null {
        column: String,
        negated: bool,
        boolean: Boolean,
    },
    /// `column [NOT] LIKE pattern ESCAPE '\'`
    Like {
        column: String,
        pattern: String,
        negated: bool,
        boolean: Boolean,
    },
    /// A parenthesised group of predicates.
    Nested {
        predicates: Vec<Where>,
        boolean: Boolean,
    },
    /// Raw SQL; each bare `?` is bound to the next entry of `values`.
    /// A `?` followed by a digit or inside a quoted literal is kept as is.
    Raw {
        sql: String,
        values: Vec<SqlValue>,
        boolean: Boolean,
    },
}

impl Where {
    /// The combinator joining this node to its previous sibling.
    pub fn boolean(&self) -> Boolean {
        match self {
            Where::Basic { boolean, .. }
            | Where::In { boolean, .. }
            | Where::Null { boolean, .. }
            | Where::Like { boolean, .. }
            | Where::Nested { boolean, .. }
            | Where::Raw { boolean, .. } => *boolean,
        }
    }

    /// Return the same node joined by `boolean` instead. Children of a
    /// nested node keep their own combinators.
    pub fn with_boolean(self, boolean: Boolean) -> Self {
        match self {
            Where::Basic {
                column,
                operator,
                value,
                ..
            } => Where::Basic {
                column,
                operator,
                value,
                boolean,
            },
            Where::In {
                column,
                values,
                negated,
                ..
            } => Where::In {
                column,
                values,
                negated,
                boolean,
            },
            Where::Null {
                column, negated, ..
            } => Where::Null {
                column,
                negated,
                boolean,
            },
            Where::Like {
                column,
                pattern,
                negated,
                ..
            } => Where::Like {
                column,
                pattern,
                negated,
                boolean,
            },
            Where::Nested { predicates, .. } => Where::Nested {
                predicates,
                boolean,
            },
            Where::Raw { sql, values, .. } => Where::Raw {
                sql,
                values,
                boolean,
            },
        }
    }

    /// Render this node, pushing its bind values onto `params`.
    pub fn to_sql(&self, style: PlaceholderStyle, params: &mut Vec<SqlValue>) -> String {
        match self {
            Where::Basic {
                column,
                operator,
                value,
                ..
            } => {
                let ph = bind(style, params, value.clone());
                format!("{} {} {}", column, operator.to_sql(), ph)
            }
            Where::In {
                column,
                values,
                negated,
                ..
            } => {
                if values.is_empty() {
                    // IN () is not valid SQL
                    return (if *negated { "1 = 1" } else { "0 = 1" }).to_string();
                }
                let phs: Vec<String> = values
                    .iter()
                    .map(|v| bind(style, params, v.clone()))
                    .collect();
                let keyword = if *negated { "NOT IN" } else { "IN" };
                format!("{} {} ({})", column, keyword, phs.join(", "))
            }
            Where::Null {
                column, negated, ..
            } => {
                if *negated {
                    format!("{} IS NOT NULL", column)
                } else {
                    format!("{} IS NULL", column)
                }
            }
            Where::Like {
                column,
                pattern,
                negated,
                ..
            } => {
                let ph = bind(style, params, SqlValue::String(pattern.clone()));
                let keyword = if *negated { "NOT LIKE" } else { "LIKE" };
                format!("{} {} {} ESCAPE '{}'", column, keyword, ph, LIKE_ESCAPE)
            }
            Where::Nested { predicates, .. } => {
                format!("({})", compile_wheres(predicates, style, params))
            }
            Where::Raw { sql, values, .. } => {
                let mut out = String::with_capacity(sql.len());
                let mut remaining = values.iter();
                let mut chars = sql.chars().peekable();
                let mut in_literal = false;
                while let Some(ch) = chars.next() {
                    if ch == '\'' {
                        in_literal = !in_literal;
                    }
                    // numbered placeholders and quoted text are left alone
                    let bare = ch == '?'
                        && !in_literal
                        && !chars.peek().is_some_and(|next| next.is_ascii_digit());
                    if bare {
                        if let Some(value) = remaining.next() {
                            out.push_str(&bind(style, params, value.clone()));
                            continue;
                        }
                    }
                    out.push(ch);
                }
                out
            }
        }
    }
}

/// Render a predicate list. The first node's combinator is dropped.
pub fn compile_wheres(
    wheres: &[Where],
    style: PlaceholderStyle,
    params: &mut Vec<SqlValue>,
) -> String {
    let mut sql = String::new();
    for (i, node) in wheres.iter().enumerate() {
        if i > 0 {
            sql.push(' ');
            sql.push_str(node.boolean().to_sql());
            sql.push(' ');
        }
        sql.push_str(&node.to_sql(style, params));
    }
    sql
}

/// Build a "contains" LIKE pattern for `needle`.
///
/// Only `%` is escaped; `_` and the escape character itself pass through.
pub fn contains_pattern(needle: &str) -> String {
    let escaped = needle.replace('%', &format!("{}%", LIKE_ESCAPE));
    format!("%{}%", escaped)
}

fn bind(style: PlaceholderStyle, params: &mut Vec<SqlValue>, value: SqlValue) -> String {
    params.push(value);
    style.placeholder(params.len())
}
