use std::cell::RefCell;
use std::rc::Rc;

use lexdesk_client::table::{
    CellContent, Column, PageWindow, PagerItem, Record, SortDirection, SortState, TableModel,
    TableState,
};
use rstest::{fixture, rstest};
use serde_json::{json, Value};

fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        other => panic!("not an object: {other}"),
    }
}

#[fixture]
fn claims() -> Vec<Record> {
    vec![
        record(json!({"id": 1, "client": "Okafor", "amount": 1200, "status": "open"})),
        record(json!({"id": 2, "client": "Brandt", "amount": 300, "status": "closed"})),
        record(json!({"id": 3, "client": "Almeida", "amount": 1200, "status": "open"})),
        record(json!({"id": 4, "client": "Chen", "status": "pending"})),
    ]
}

fn texts(row: &lexdesk_client::table::BodyRow<String>) -> Vec<String> {
    row.cells
        .iter()
        .map(|(_, cell)| match cell {
            CellContent::Text(text) => text.clone(),
            CellContent::Rendered(out) => out.clone(),
        })
        .collect()
}

#[rstest]
#[case(true, true, Some(vec![]), "loading")]
#[case(true, false, None, "loading")]
#[case(true, true, None, "loading")]
#[case(false, true, Some(vec![record(json!({"id": 1}))]), "error")]
#[case(false, true, None, "error")]
#[case(false, false, None, "empty")]
#[case(false, false, Some(vec![]), "empty")]
#[case(false, false, Some(vec![record(json!({"id": 1}))]), "populated")]
fn exactly_one_state_with_loading_then_error_priority(
    #[case] is_loading: bool,
    #[case] error: bool,
    #[case] data: Option<Vec<Record>>,
    #[case] expected: &str,
) {
    let state = TableState::resolve(is_loading, error, data.as_deref());
    let name = match state {
        TableState::Loading => "loading",
        TableState::Error => "error",
        TableState::Empty => "empty",
        TableState::Populated(_) => "populated",
    };
    assert_eq!(name, expected);
}

#[test]
fn window_around_middle_page() {
    let window = PageWindow::new(5, 10);
    assert_eq!(window.page_numbers(), vec![1, 3, 4, 5, 6, 7, 10]);

    let strip: Vec<PagerItem> = window.items();
    assert_eq!(
        strip,
        vec![
            PagerItem::Previous { target: Some(4) },
            PagerItem::Page { number: 1, current: false },
            PagerItem::Ellipsis,
            PagerItem::Page { number: 3, current: false },
            PagerItem::Page { number: 4, current: false },
            PagerItem::Page { number: 5, current: true },
            PagerItem::Page { number: 6, current: false },
            PagerItem::Page { number: 7, current: false },
            PagerItem::Ellipsis,
            PagerItem::Page { number: 10, current: false },
            PagerItem::Next { target: Some(6) },
        ]
    );
}

#[rstest]
#[case(1, 10, vec![1, 2, 3, 10])]
#[case(4, 10, vec![1, 2, 3, 4, 5, 6, 10])]
#[case(10, 10, vec![1, 8, 9, 10])]
#[case(1, 1, vec![1])]
#[case(2, 3, vec![1, 2, 3])]
#[case(3, 0, vec![])]
fn window_edges(#[case] current: u32, #[case] total: u32, #[case] expected: Vec<u32>) {
    assert_eq!(PageWindow::new(current, total).page_numbers(), expected);
}

#[test]
fn no_ellipsis_when_nothing_is_hidden() {
    let items = PageWindow::new(4, 7).items();
    assert!(!items.contains(&PagerItem::Ellipsis));
}

#[rstest]
#[case::first_page(1, 5)]
#[case::last_page(5, 5)]
fn disabled_controls_never_request_a_page(#[case] current: u32, #[case] total: u32) {
    let window = PageWindow::new(current, total);
    let requested = Rc::new(RefCell::new(Vec::new()));

    for item in window.items() {
        let sink = requested.clone();
        let fired = window.activate(&item, move |page| sink.borrow_mut().push(page));
        assert_eq!(fired, !item.is_disabled());
    }

    let previous = window.items().into_iter().next();
    let next = window.items().into_iter().last();
    if current == 1 {
        assert_eq!(previous, Some(PagerItem::Previous { target: None }));
    }
    if current == total {
        assert_eq!(next, Some(PagerItem::Next { target: None }));
    }
    // Disabled control skipped; every other control fired once.
    assert!(requested.borrow().iter().all(|p| (1..=total).contains(p)));
}

#[test]
fn clicking_disabled_previous_does_nothing() {
    let window = PageWindow::new(1, 3);
    let mut calls = 0;
    assert!(!window.activate(&PagerItem::Previous { target: window.previous() }, |_| calls += 1));
    assert!(!window.activate(&PagerItem::Ellipsis, |_| calls += 1));
    assert_eq!(calls, 0);
}

#[test]
fn three_clicks_return_to_unsorted() {
    let mut sort = SortState::default();
    sort.toggle("amount");
    assert_eq!(sort.direction_of("amount"), Some(SortDirection::Ascending));
    sort.toggle("amount");
    assert_eq!(sort.direction_of("amount"), Some(SortDirection::Descending));
    sort.toggle("amount");
    assert!(sort.is_unsorted());
}

#[test]
fn selecting_another_column_replaces_the_sort() {
    let mut sort = SortState::default();
    sort.toggle("amount");
    sort.toggle("client");
    assert_eq!(sort.entries().len(), 1);
    assert_eq!(sort.direction_of("amount"), None);
    assert_eq!(sort.direction_of("client"), Some(SortDirection::Ascending));
}

#[rstest]
fn sorting_is_stable_and_leaves_input_untouched(claims: Vec<Record>) {
    let before = claims.clone();
    let columns: Vec<Column<Record, String>> = vec![
        Column::accessor("id", "ID"),
        Column::accessor("amount", "Amount"),
    ];

    let mut sort = SortState::default();
    sort.toggle("amount");
    let ids: Vec<String> = TableModel::new(&columns, &sort)
        .rows(&claims)
        .iter()
        .map(|row| texts(row)[0].clone())
        .collect();
    // Missing amount sorts first; equal amounts keep input order.
    assert_eq!(ids, vec!["4", "2", "1", "3"]);

    sort.toggle("amount");
    let ids: Vec<String> = TableModel::new(&columns, &sort)
        .rows(&claims)
        .iter()
        .map(|row| texts(row)[0].clone())
        .collect();
    assert_eq!(ids, vec!["1", "3", "2", "4"]);

    assert_eq!(claims, before);
}

#[rstest]
fn accessor_shows_raw_value_and_render_gets_value_and_row(claims: Vec<Record>) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    let columns: Vec<Column<Record, String>> = vec![
        Column::accessor("amount", "Amount"),
        Column::custom("status", "Status", move |value: &Value, row: &Record| {
            sink.borrow_mut().push((value.clone(), row.get("id").cloned()));
            format!("<badge>{}</badge>", value.as_str().unwrap_or(""))
        }),
    ];

    let sort = SortState::default();
    let rows = TableModel::new(&columns, &sort).rows(&claims);

    assert_eq!(rows[0].cells[0].1, CellContent::Text("1200".to_string()));
    assert_eq!(rows[3].cells[0].1, CellContent::Text(String::new()));
    assert_eq!(
        rows[1].cells[1].1,
        CellContent::Rendered("<badge>closed</badge>".to_string())
    );
    assert_eq!(
        seen.borrow()[1],
        (json!("closed"), Some(json!(2)))
    );
}

#[test]
fn headers_report_aria_sort() {
    let columns: Vec<Column<Record, String>> = vec![
        Column::accessor("client", "Client"),
        Column::accessor("notes", "Notes").sortable(false),
    ];
    let mut sort = SortState::default();
    sort.toggle("client");
    sort.toggle("client");

    let headers = TableModel::new(&columns, &sort).headers();
    assert_eq!(headers[0].aria_sort(), "descending");
    assert_eq!(headers[1].aria_sort(), "none");
    assert!(!headers[1].sortable);
    assert_eq!(headers[0].content, CellContent::Text("Client".to_string()));
}
