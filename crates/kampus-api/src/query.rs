// Collection query description
//
// A `Query` is the transport-neutral shape of a `select`: zero or more
// column filters plus an optional ordering. The REST client renders it as
// PostgREST query parameters; the memory gateway evaluates it directly.

use serde_json::Value;

/// Comparison operator for a column filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl FilterOp {
    /// PostgREST operator token.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Neq => "neq",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
        }
    }
}

/// A single `column <op> value` predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub op: FilterOp,
    pub value: Value,
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            op: FilterOp::Eq,
            value: value.into(),
        }
    }

    /// Render as a `(column, "op.value")` query pair.
    pub fn to_param(&self) -> (String, String) {
        (
            self.column.clone(),
            format!("{}.{}", self.op.as_str(), param_value(&self.value)),
        )
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Ordering by a single column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub direction: Direction,
}

impl Order {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: Direction::Ascending,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: Direction::Descending,
        }
    }

    /// Render as the PostgREST `order` parameter value, e.g. `created_at.desc`.
    pub fn to_param(&self) -> String {
        let dir = match self.direction {
            Direction::Ascending => "asc",
            Direction::Descending => "desc",
        };
        format!("{}.{dir}", self.column)
    }
}

/// Filters plus ordering for a `select`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order(mut self, order: Order) -> Self {
        self.order = Some(order);
        self
    }

    /// All query pairs for a PostgREST `GET`, `select=*` first.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![("select".to_owned(), "*".to_owned())];
        params.extend(self.filters.iter().map(Filter::to_param));
        if let Some(ref order) = self.order {
            params.push(("order".to_owned(), order.to_param()));
        }
        params
    }
}

/// Render a JSON scalar the way PostgREST expects it inside a filter.
pub(crate) fn param_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_owned(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn params_include_select_filters_and_order() {
        let query = Query::new()
            .filter(Filter::eq("published", true))
            .filter(Filter::eq("category", "sports"))
            .order(Order::desc("created_at"));

        assert_eq!(
            query.to_params(),
            vec![
                ("select".to_owned(), "*".to_owned()),
                ("published".to_owned(), "eq.true".to_owned()),
                ("category".to_owned(), "eq.sports".to_owned()),
                ("order".to_owned(), "created_at.desc".to_owned()),
            ]
        );
    }

    #[test]
    fn numeric_values_render_without_quotes() {
        let filter = Filter::eq("id", json!(42));
        assert_eq!(filter.to_param(), ("id".to_owned(), "eq.42".to_owned()));
    }
}
