//! Single-column sort state.

use super::row::{compare_values, TableRow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    /// Value for the `aria-sort` attribute.
    pub fn aria(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "ascending",
            SortDirection::Descending => "descending",
        }
    }

    pub fn arrow(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "▲",
            SortDirection::Descending => "▼",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortDescriptor {
    pub column_key: String,
    pub direction: SortDirection,
}

/// Sort entries owned by one table instance. Holds at most one entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortState {
    entries: Vec<SortDescriptor>,
}

impl SortState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[SortDescriptor] {
        &self.entries
    }

    pub fn is_unsorted(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn direction_of(&self, column_key: &str) -> Option<SortDirection> {
        self.entries
            .iter()
            .find(|entry| entry.column_key == column_key)
            .map(|entry| entry.direction)
    }

    /// Advance `column_key` through unsorted -> ascending -> descending -> unsorted.
    ///
    /// A column that is not currently sorted replaces whatever entry exists.
    pub fn toggle(&mut self, column_key: &str) {
        let next = match self.direction_of(column_key) {
            None => Some(SortDirection::Ascending),
            Some(SortDirection::Ascending) => Some(SortDirection::Descending),
            Some(SortDirection::Descending) => None,
        };

        self.entries.clear();
        if let Some(direction) = next {
            self.entries.push(SortDescriptor {
                column_key: column_key.to_string(),
                direction,
            });
        }
    }

    /// Borrow `rows` in display order. The sort is stable, so equal keys
    /// keep their original relative order in both directions.
    pub fn apply<'a, R: TableRow>(&self, rows: &'a [R]) -> Vec<&'a R> {
        let mut ordered: Vec<&R> = rows.iter().collect();
        if let Some(entry) = self.entries.first() {
            let key = entry.column_key.as_str();
            ordered.sort_by(|a, b| {
                let ord = compare_values(a.field(key), b.field(key));
                match entry.direction {
                    SortDirection::Ascending => ord,
                    SortDirection::Descending => ord.reverse(),
                }
            });
        }
        ordered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn rows() -> Vec<Value> {
        vec![
            json!({ "id": 1, "insurer": "Aviva" }),
            json!({ "id": 2, "insurer": "Intact" }),
            json!({ "id": 3, "insurer": "Aviva" }),
            json!({ "id": 4 }),
        ]
    }

    fn ids(rows: &[&Value]) -> Vec<i64> {
        rows.iter().map(|r| r["id"].as_i64().unwrap()).collect()
    }

    #[test]
    fn unsorted_keeps_input_order() {
        let data = rows();
        assert_eq!(ids(&SortState::new().apply(&data)), vec![1, 2, 3, 4]);
    }

    #[test]
    fn ties_keep_input_order_both_ways() {
        let data = rows();
        let mut state = SortState::new();

        state.toggle("insurer");
        assert_eq!(ids(&state.apply(&data)), vec![4, 1, 3, 2]);

        state.toggle("insurer");
        assert_eq!(ids(&state.apply(&data)), vec![2, 1, 3, 4]);
    }

    #[test]
    fn new_column_replaces_active_sort() {
        let mut state = SortState::new();
        state.toggle("insurer");
        state.toggle("insurer");
        state.toggle("id");

        assert_eq!(
            state.entries(),
            &[SortDescriptor {
                column_key: "id".to_string(),
                direction: SortDirection::Ascending,
            }]
        );
        assert_eq!(state.direction_of("insurer"), None);
    }
}
