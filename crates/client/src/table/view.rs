//! Render-state resolution and the per-render table model.

use super::column::{CellContent, Column};
use super::row::TableRow;
use super::sort::{SortDirection, SortState};

pub const DEFAULT_EMPTY_MESSAGE: &str = "No records found.";

/// The four mutually exclusive things a table can show.
#[derive(Debug, PartialEq)]
pub enum TableState<'a, R> {
    Loading,
    Error,
    Empty,
    Populated(&'a [R]),
}

impl<'a, R> TableState<'a, R> {
    /// Loading wins over error, error wins over data. `data` is not read
    /// while loading or failed.
    pub fn resolve(is_loading: bool, has_error: bool, data: Option<&'a [R]>) -> Self {
        if is_loading {
            return TableState::Loading;
        }
        if has_error {
            return TableState::Error;
        }
        match data {
            Some(rows) if !rows.is_empty() => TableState::Populated(rows),
            _ => TableState::Empty,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeaderCell<O> {
    pub key: String,
    pub content: CellContent<O>,
    pub sortable: bool,
    pub sort: Option<SortDirection>,
}

impl<O> HeaderCell<O> {
    pub fn aria_sort(&self) -> &'static str {
        self.sort.map(|d| d.aria()).unwrap_or("none")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BodyRow<O> {
    /// `(column key, cell)` in column order.
    pub cells: Vec<(String, CellContent<O>)>,
}

/// Columns plus the current sort, borrowed for one render pass.
pub struct TableModel<'a, R, O> {
    columns: &'a [Column<R, O>],
    sort: &'a SortState,
}

impl<'a, R: TableRow, O> TableModel<'a, R, O> {
    pub fn new(columns: &'a [Column<R, O>], sort: &'a SortState) -> Self {
        Self { columns, sort }
    }

    pub fn headers(&self) -> Vec<HeaderCell<O>> {
        self.columns
            .iter()
            .map(|column| HeaderCell {
                key: column.key().to_string(),
                content: column.header(),
                sortable: column.is_sortable(),
                sort: self.sort.direction_of(column.key()),
            })
            .collect()
    }

    /// Body rows in sorted order. The input slice is never modified.
    pub fn rows(&self, data: &[R]) -> Vec<BodyRow<O>> {
        self.sort
            .apply(data)
            .into_iter()
            .map(|row| BodyRow {
                cells: self
                    .columns
                    .iter()
                    .map(|column| (column.key().to_string(), column.cell(row)))
                    .collect(),
            })
            .collect()
    }
}
