//! Generic data table: column descriptors, sort state, page windowing and
//! the `DataTable` component.
//!
//! Everything except [`component`] is renderer-agnostic. Screens build a
//! `Vec<TableColumn>`, pass the records they fetched, and choose a
//! [`Pagination`] mode:
//!
//! ```rust,ignore
//! let columns = vec![
//!     TableColumn::accessor("claim_number", "Claim #"),
//!     TableColumn::custom("status", "Status", |value, _row| rsx! {
//!         StatusBadge { status: display_value(value) }
//!     }),
//! ];
//!
//! rsx! {
//!     DataTable {
//!         columns,
//!         data: claims.cloned(),
//!         is_loading: claims.is_loading(),
//!         pagination: Pagination::Paginated {
//!             current_page: page(),
//!             per_page: 25,
//!             total_pages,
//!             on_page_change: move |p| page.set(p),
//!         },
//!     }
//! }
//! ```

pub mod column;
pub mod component;
pub mod pager;
pub mod row;
pub mod sort;
pub mod view;

pub use column::{validate_columns, CellContent, Column, ColumnKind, TableError};
pub use component::{DataTable, DataTableProps, Pagination, TableColumn};
pub use pager::{PageWindow, PagerItem};
pub use row::{compare_values, display_value, Record, TableRow};
pub use sort::{SortDescriptor, SortDirection, SortState};
pub use view::{BodyRow, HeaderCell, TableModel, TableState, DEFAULT_EMPTY_MESSAGE};
