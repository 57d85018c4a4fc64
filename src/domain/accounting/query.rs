//! Typed builder for the provider's SQL-like query language.
//!
//! Grammar rendered by [`Query::render`]:
//!
//! ```text
//! select <fields|*> from <entity> [where <cond>[ AND <cond>]*] [STARTPOSITION n] [MAXRESULTS n]
//! ```
//!
//! Fields keep insertion order and conditions are joined with `AND` in
//! insertion order, so output is reproducible.

use std::fmt;

use super::entity::EntityKind;

/// Right-hand side of a condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    Text(String),
    Bool(bool),
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Text(value)
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        FilterValue::Bool(value)
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        FilterValue::Text(value.to_string())
    }
}

/// A single `field <op> value` condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Literal filter, rendered as `field = value`.
    Equals { field: String, value: FilterValue },
    /// Operator pair, rendered as `field <op> value`.
    Compare {
        field: String,
        op: String,
        value: FilterValue,
    },
}

impl Predicate {
    fn render(&self) -> String {
        match self {
            Predicate::Equals { field, value } => {
                format!("{} = {}", field, render_literal(value))
            }
            Predicate::Compare { field, op, value } => {
                let value = match value {
                    FilterValue::Text(text) => FilterValue::Text(escape_percent(text)),
                    other => other.clone(),
                };
                format!("{} {} {}", field, op, render_literal(&value))
            }
        }
    }
}

fn render_literal(value: &FilterValue) -> String {
    match value {
        FilterValue::Text(text) => format!("'{}'", text),
        FilterValue::Bool(flag) => flag.to_string(),
    }
}

/// `%` → `%25` so the raw query string carries a literal percent sign
/// through URL decoding on the provider side.
fn escape_percent(text: &str) -> String {
    text.replace('%', "%25")
}

/// Select statement against one entity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    entity: EntityKind,
    fields: Vec<String>,
    predicates: Vec<Predicate>,
    offset: Option<u32>,
    limit: Option<u32>,
}

impl Query {
    /// Starts a `select * from <entity>` statement.
    pub fn select(entity: EntityKind) -> Self {
        Self {
            entity,
            fields: Vec::new(),
            predicates: Vec::new(),
            offset: None,
            limit: None,
        }
    }

    pub fn entity(&self) -> EntityKind {
        self.entity
    }

    /// Projects the given fields instead of `*`.
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields.extend(fields.into_iter().map(Into::into));
        self
    }

    /// Adds `field = value`.
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.predicates.push(Predicate::Equals {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    /// Adds `field <op> value`.
    pub fn compare(
        mut self,
        field: impl Into<String>,
        op: impl Into<String>,
        value: impl Into<FilterValue>,
    ) -> Self {
        self.predicates.push(Predicate::Compare {
            field: field.into(),
            op: op.into(),
            value: value.into(),
        });
        self
    }

    /// Adds `field like value`.
    pub fn like(self, field: impl Into<String>, pattern: impl Into<FilterValue>) -> Self {
        self.compare(field, "like", pattern)
    }

    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Renders the statement.
    pub fn render(&self) -> String {
        let projection = if self.fields.is_empty() {
            "*".to_string()
        } else {
            self.fields.join(",")
        };

        let mut statement = format!("select {} from {}", projection, self.entity.as_str());

        if !self.predicates.is_empty() {
            let conditions: Vec<String> = self.predicates.iter().map(Predicate::render).collect();
            statement.push_str(" where ");
            statement.push_str(&conditions.join(" AND "));
        }

        if let Some(offset) = self.offset {
            statement.push_str(&format!(" STARTPOSITION {}", offset));
        }

        if let Some(limit) = self.limit {
            statement.push_str(&format!(" MAXRESULTS {}", limit));
        }

        statement
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
