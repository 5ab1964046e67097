//! The `DataTable` component.

use dioxus::prelude::*;

use super::column::{validate_columns, CellContent, Column};
use super::pager::{PageWindow, PagerItem};
use super::row::Record;
use super::sort::SortState;
use super::view::{HeaderCell, TableModel, TableState, DEFAULT_EMPTY_MESSAGE};
use crate::components::ui::{Button, ButtonSize, ButtonVariant};

/// Column type the component renders.
pub type TableColumn = Column<Record, Element>;

/// Caller-selected pagination mode.
///
/// In `Unpaginated` mode every row passed in is rendered and no pager is
/// shown. In `Paginated` mode the caller has already sliced `data` to the
/// current page and owns `current_page`; the table only emits requests.
#[derive(Clone, PartialEq, Default)]
pub enum Pagination {
    #[default]
    Unpaginated,
    Paginated {
        current_page: u32,
        per_page: u32,
        total_pages: u32,
        on_page_change: EventHandler<u32>,
    },
}

impl Pagination {
    pub fn window(&self) -> Option<PageWindow> {
        match self {
            Pagination::Unpaginated => None,
            Pagination::Paginated {
                current_page,
                total_pages,
                ..
            } => Some(PageWindow::new(*current_page, *total_pages)),
        }
    }
}

#[derive(Props, Clone, PartialEq)]
pub struct DataTableProps {
    pub columns: Vec<TableColumn>,
    pub data: Option<Vec<Record>>,
    #[props(default)]
    pub is_loading: bool,
    #[props(default)]
    pub error: bool,
    #[props(default)]
    pub pagination: Pagination,
    #[props(default = DEFAULT_EMPTY_MESSAGE.to_string(), into)]
    pub empty_state_message: String,
    /// Placeholder rows in the loading skeleton.
    #[props(default = 5)]
    pub skeleton_rows: usize,
}

#[component]
pub fn DataTable(props: DataTableProps) -> Element {
    let sort = use_signal(SortState::default);

    if let Err(err) = validate_columns(&props.columns) {
        crate::log_error!("DataTable: {}", err);
    }

    match TableState::resolve(props.is_loading, props.error, props.data.as_deref()) {
        TableState::Loading => rsx! {
            LoadingSkeleton { rows: props.skeleton_rows }
        },
        TableState::Error => rsx! {
            div {
                class: "rounded-md border border-red-200 bg-red-50 p-6 text-center text-sm text-red-700",
                role: "alert",
                "Something went wrong while loading these records."
            }
        },
        TableState::Empty => rsx! {
            div {
                class: "rounded-md border border-slate-200 p-6 text-center text-sm text-slate-500",
                "{props.empty_state_message}"
            }
        },
        TableState::Populated(rows) => {
            let sort_state = sort.read().clone();
            let model = TableModel::new(&props.columns, &sort_state);
            let headers = model.headers().into_iter().map(|h| header_cell(h, sort));
            let body = model.rows(rows);
            let pager = match (&props.pagination, props.pagination.window()) {
                (Pagination::Paginated { on_page_change, .. }, Some(window)) => Some((window, *on_page_change)),
                _ => None,
            };

            rsx! {
                div { class: "w-full overflow-x-auto",
                    table { class: "w-full caption-bottom text-sm",
                        thead {
                            tr { class: "border-b", {headers} }
                        }
                        tbody {
                            for (row_index, row) in body.into_iter().enumerate() {
                                tr {
                                    key: "{row_index}",
                                    class: "border-b transition-colors hover:bg-slate-50",
                                    for (cell_key, cell) in row.cells.into_iter() {
                                        td { key: "{cell_key}", class: "p-2 align-middle", {cell_element(cell)} }
                                    }
                                }
                            }
                        }
                    }
                    if let Some((window, on_page_change)) = pager {
                        Pager { window, on_page_change }
                    }
                }
            }
        }
    }
}

fn cell_element(cell: CellContent<Element>) -> Element {
    match cell {
        CellContent::Text(text) => rsx! { "{text}" },
        CellContent::Rendered(element) => element,
    }
}

fn header_cell(header: HeaderCell<Element>, mut sort: Signal<SortState>) -> Element {
    let sortable = header.sortable;
    let aria_sort = header.aria_sort();
    let arrow = header.sort.map(|d| d.arrow());
    let class = if sortable {
        "h-10 px-2 text-left align-middle font-medium text-slate-600 cursor-pointer select-none"
    } else {
        "h-10 px-2 text-left align-middle font-medium text-slate-600"
    };
    let sort_key = header.key.clone();
    let header_key = header.key;
    let label = cell_element(header.content);

    rsx! {
        th {
            key: "{header_key}",
            scope: "col",
            class,
            "aria-sort": aria_sort,
            onclick: move |_| {
                if sortable {
                    sort.write().toggle(&sort_key);
                }
            },
            {label}
            if let Some(arrow) = arrow {
                span { class: "ml-1 text-xs", "{arrow}" }
            }
        }
    }
}

#[component]
fn LoadingSkeleton(rows: usize) -> Element {
    rsx! {
        div { class: "w-full animate-pulse space-y-2", "aria-busy": "true",
            div { class: "h-10 rounded bg-slate-200" }
            for i in 0..rows {
                div { key: "{i}", class: "h-8 rounded bg-slate-100" }
            }
        }
    }
}

#[component]
fn Pager(window: PageWindow, on_page_change: EventHandler<u32>) -> Element {
    let controls = window
        .items()
        .into_iter()
        .enumerate()
        .map(move |(index, item)| pager_control(index, item, window, on_page_change));

    rsx! {
        nav { class: "flex items-center justify-end gap-1 py-3", "aria-label": "pagination",
            {controls}
        }
    }
}

fn pager_control(
    index: usize,
    item: PagerItem,
    window: PageWindow,
    on_page_change: EventHandler<u32>,
) -> Element {
    let activate = move |_: MouseEvent| {
        window.activate(&item, |page| on_page_change.call(page));
    };

    match item {
        PagerItem::Ellipsis => rsx! {
            span {
                key: "{index}",
                class: "flex h-9 w-9 items-center justify-center text-slate-400",
                "aria-hidden": "true",
                "…"
            }
        },
        PagerItem::Previous { .. } => rsx! {
            Button {
                key: "{index}",
                variant: ButtonVariant::Ghost,
                disabled: item.is_disabled(),
                aria_label: "Go to previous page".to_string(),
                onclick: activate,
                "Previous"
            }
        },
        PagerItem::Next { .. } => rsx! {
            Button {
                key: "{index}",
                variant: ButtonVariant::Ghost,
                disabled: item.is_disabled(),
                aria_label: "Go to next page".to_string(),
                onclick: activate,
                "Next"
            }
        },
        PagerItem::Page { number, current } => rsx! {
            Button {
                key: "{index}",
                variant: if current { ButtonVariant::Secondary } else { ButtonVariant::Ghost },
                size: ButtonSize::Compact,
                aria_current: current,
                aria_label: format!("Go to page {}", number),
                onclick: activate,
                "{number}"
            }
        },
    }
}
