//! Column descriptors.
//!
//! A column is either a plain accessor, whose cells show the raw field value
//! as text, or a custom renderer that turns `(value, row)` into output of
//! type `O`. The UI uses `O = Element`; any other output type works the same
//! way, which keeps the descriptor logic usable without a renderer.

use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use super::row::{display_value, TableRow};

/// Content of a header or body cell.
#[derive(Clone, PartialEq)]
pub enum CellContent<O> {
    /// Plain text, either a label or a raw value.
    Text(String),
    /// Output of a render function.
    Rendered(O),
}

impl<O> CellContent<O> {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellContent::Text(text) => Some(text),
            CellContent::Rendered(_) => None,
        }
    }

    pub fn rendered(&self) -> Option<&O> {
        match self {
            CellContent::Text(_) => None,
            CellContent::Rendered(out) => Some(out),
        }
    }
}

impl<O> fmt::Debug for CellContent<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellContent::Text(text) => f.debug_tuple("Text").field(text).finish(),
            CellContent::Rendered(_) => f.write_str("Rendered(..)"),
        }
    }
}

/// Header of a column: text or a renderer.
pub enum Header<O> {
    Text(String),
    Render(Rc<dyn Fn() -> O>),
}

/// How body cells of a column are produced.
pub enum ColumnKind<R, O> {
    /// Show the raw field value as text.
    Accessor,
    /// Call the function with the field value and the full row.
    Custom(Rc<dyn Fn(&Value, &R) -> O>),
}

/// One column of a table.
pub struct Column<R, O> {
    key: String,
    header: Header<O>,
    kind: ColumnKind<R, O>,
    sortable: bool,
}

impl<R, O> Column<R, O> {
    /// A column showing `row[key]` as text.
    pub fn accessor(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            header: Header::Text(label.into()),
            kind: ColumnKind::Accessor,
            sortable: true,
        }
    }

    /// A column rendered by `render(value, row)`.
    pub fn custom(
        key: impl Into<String>,
        label: impl Into<String>,
        render: impl Fn(&Value, &R) -> O + 'static,
    ) -> Self {
        Self {
            key: key.into(),
            header: Header::Text(label.into()),
            kind: ColumnKind::Custom(Rc::new(render)),
            sortable: true,
        }
    }

    /// Replace the text label with a header renderer.
    pub fn with_header(mut self, render: impl Fn() -> O + 'static) -> Self {
        self.header = Header::Render(Rc::new(render));
        self
    }

    pub fn sortable(mut self, sortable: bool) -> Self {
        self.sortable = sortable;
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_sortable(&self) -> bool {
        self.sortable
    }

    pub fn kind(&self) -> &ColumnKind<R, O> {
        &self.kind
    }

    pub fn header(&self) -> CellContent<O> {
        match &self.header {
            Header::Text(label) => CellContent::Text(label.clone()),
            Header::Render(render) => CellContent::Rendered(render()),
        }
    }

    /// Produce the cell for `row`. Missing fields read as `null`.
    pub fn cell(&self, row: &R) -> CellContent<O>
    where
        R: TableRow,
    {
        let value = row.field(&self.key).unwrap_or(&Value::Null);
        match &self.kind {
            ColumnKind::Accessor => CellContent::Text(display_value(value)),
            ColumnKind::Custom(render) => CellContent::Rendered(render(value, row)),
        }
    }
}

impl<R, O> Clone for Column<R, O> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            header: match &self.header {
                Header::Text(label) => Header::Text(label.clone()),
                Header::Render(render) => Header::Render(render.clone()),
            },
            kind: match &self.kind {
                ColumnKind::Accessor => ColumnKind::Accessor,
                ColumnKind::Custom(render) => ColumnKind::Custom(render.clone()),
            },
            sortable: self.sortable,
        }
    }
}

// Render functions compare by identity.
impl<R, O> PartialEq for Column<R, O> {
    fn eq(&self, other: &Self) -> bool {
        let header_eq = match (&self.header, &other.header) {
            (Header::Text(a), Header::Text(b)) => a == b,
            (Header::Render(a), Header::Render(b)) => Rc::ptr_eq(a, b),
            _ => false,
        };
        let kind_eq = match (&self.kind, &other.kind) {
            (ColumnKind::Accessor, ColumnKind::Accessor) => true,
            (ColumnKind::Custom(a), ColumnKind::Custom(b)) => Rc::ptr_eq(a, b),
            _ => false,
        };
        self.key == other.key && self.sortable == other.sortable && header_eq && kind_eq
    }
}

impl<R, O> fmt::Debug for Column<R, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            ColumnKind::Accessor => "accessor",
            ColumnKind::Custom(_) => "custom",
        };
        f.debug_struct("Column")
            .field("key", &self.key)
            .field("kind", &kind)
            .field("sortable", &self.sortable)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TableError {
    #[error("duplicate column key `{0}`")]
    DuplicateColumn(String),
}

/// Column keys double as reconciliation keys and must be unique.
pub fn validate_columns<R, O>(columns: &[Column<R, O>]) -> Result<(), TableError> {
    let mut seen = HashSet::new();
    for column in columns {
        if !seen.insert(column.key()) {
            return Err(TableError::DuplicateColumn(column.key().to_string()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::row::Record;
    use serde_json::json;

    fn row() -> Record {
        json!({ "client": "A. Patel", "balance": 1250 })
            .as_object()
            .cloned()
            .unwrap()
    }

    #[test]
    fn missing_field_renders_empty_text() {
        let col: Column<Record, String> = Column::accessor("adjuster", "Adjuster");
        assert_eq!(col.cell(&row()).as_text(), Some(""));
    }

    #[test]
    fn clones_compare_equal_but_new_renderers_do_not() {
        let a: Column<Record, String> = Column::custom("balance", "Balance", |v, _| format!("${}", v));
        let b: Column<Record, String> = Column::custom("balance", "Balance", |v, _| format!("${}", v));
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn header_renderer_replaces_label() {
        let col: Column<Record, String> =
            Column::accessor("client", "Client").with_header(|| "<b>Client</b>".to_string());
        assert_eq!(col.header().rendered().map(String::as_str), Some("<b>Client</b>"));
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let cols: Vec<Column<Record, String>> = vec![
            Column::accessor("client", "Client"),
            Column::accessor("client", "Client again"),
        ];
        assert_eq!(
            validate_columns(&cols),
            Err(TableError::DuplicateColumn("client".to_string()))
        );
    }
}
