//! Query engine: filter and sort a snapshot of items

use std::cmp::Ordering;

use super::error::{Result, TodoError};
use super::params::TodoParams;
use super::types::TodoItem;

/// `complete` filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompleteFilter {
    Completed,
    Open,
}

impl CompleteFilter {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.to_lowercase().as_str() {
            "true" | "1" => Ok(Self::Completed),
            "false" | "0" => Ok(Self::Open),
            other => Err(TodoError::validation(format!(
                "Filtering completed tasks requires a true/false or 0/1 value, not {other}."
            ))),
        }
    }

    pub fn matches(self, item: &TodoItem) -> bool {
        match self {
            Self::Completed => item.is_completed(),
            Self::Open => !item.is_completed(),
        }
    }
}

/// Field named by `order_by`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Content,
    Id,
    CreatedAt,
    Priority,
    DueDate,
    Completed,
}

impl SortKey {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.to_lowercase().as_str() {
            "content" => Ok(Self::Content),
            "id" => Ok(Self::Id),
            "created_at" => Ok(Self::CreatedAt),
            "priority" => Ok(Self::Priority),
            "due_date" => Ok(Self::DueDate),
            "completed" => Ok(Self::Completed),
            other => Err(TodoError::validation(format!(
                "You can only sort by a value that exists in each todo item, not {other}."
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    /// `desc` (any case) reverses; every other value sorts ascending
    pub fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("desc") {
            Self::Descending
        } else {
            Self::Ascending
        }
    }
}

/// Parsed listing request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ListQuery {
    pub complete: Option<CompleteFilter>,
    pub order_by: Option<SortKey>,
    pub direction: SortDirection,
}

impl ListQuery {
    /// Build from request parameters. The filter is validated before the sort key.
    pub fn from_params(params: &TodoParams) -> Result<Self> {
        let complete = params
            .complete
            .as_deref()
            .map(CompleteFilter::parse)
            .transpose()?;
        let order_by = params.order_by.as_deref().map(SortKey::parse).transpose()?;
        let direction = params
            .direction
            .as_deref()
            .map(SortDirection::parse)
            .unwrap_or_default();

        Ok(Self {
            complete,
            order_by,
            direction,
        })
    }

    /// Filter, then sort. Without a sort key the snapshot order is kept.
    pub fn run(&self, mut items: Vec<TodoItem>) -> Vec<TodoItem> {
        if let Some(filter) = self.complete {
            items.retain(|item| filter.matches(item));
        }

        if let Some(key) = self.order_by {
            let direction = self.direction;
            items.sort_by(|a, b| {
                let ordering = compare(a, b, key);
                match direction {
                    SortDirection::Ascending => ordering,
                    SortDirection::Descending => ordering.reverse(),
                }
            });
        }

        items
    }
}

/// Three-way comparison of two items under one key
///
/// `Content` lower-cases both texts and then goes through the same plain
/// `<` / `>` comparison as `Id`, `CreatedAt` and `Priority`; ties stay ties.
/// For the optional timestamps a present value sorts before an absent one.
pub fn compare(a: &TodoItem, b: &TodoItem, key: SortKey) -> Ordering {
    match key {
        SortKey::Content => {
            let (a, b) = (a.content.to_lowercase(), b.content.to_lowercase());
            relational(&a, &b)
        }
        SortKey::Id => relational(&a.id, &b.id),
        SortKey::CreatedAt => relational(&a.created_at, &b.created_at),
        SortKey::Priority => relational(&a.priority, &b.priority),
        SortKey::DueDate => absent_last(a.due_date, b.due_date),
        SortKey::Completed => absent_last(a.completed, b.completed),
    }
}

fn relational<T: PartialOrd>(a: &T, b: &T) -> Ordering {
    if a < b {
        Ordering::Less
    } else if a > b {
        Ordering::Greater
    } else {
        Ordering::Equal
    }
}

fn absent_last(
    a: Option<chrono::DateTime<chrono::Utc>>,
    b: Option<chrono::DateTime<chrono::Utc>>,
) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => (a.timestamp() - b.timestamp()).cmp(&0),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn item(id: u64, content: &str) -> TodoItem {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut item = TodoItem::new(base + Duration::minutes(id as i64));
        item.id = id;
        item.content = content.to_string();
        item
    }

    fn contents(items: &[TodoItem]) -> Vec<&str> {
        items.iter().map(|i| i.content.as_str()).collect()
    }

    fn query(order_by: SortKey, direction: SortDirection) -> ListQuery {
        ListQuery {
            complete: None,
            order_by: Some(order_by),
            direction,
        }
    }

    #[test]
    fn test_content_desc_is_case_insensitive() {
        let items = vec![item(1, "banana"), item(2, "Apple"), item(3, "cherry")];
        let sorted = query(SortKey::Content, SortDirection::Descending).run(items);
        assert_eq!(contents(&sorted), vec!["cherry", "banana", "Apple"]);
    }

    #[test]
    fn test_content_ties_keep_input_order() {
        let items = vec![item(1, "milk"), item(2, "MILK"), item(3, "Milk")];
        let sorted = query(SortKey::Content, SortDirection::Ascending).run(items);
        assert_eq!(sorted.iter().map(|i| i.id).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_priority_sort() {
        let mut a = item(1, "a");
        a.priority = 5;
        let mut b = item(2, "b");
        b.priority = 1;
        let c = item(3, "c");

        let sorted = query(SortKey::Priority, SortDirection::Ascending).run(vec![a, b, c]);
        assert_eq!(contents(&sorted), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_due_date_absent_sorts_last() {
        let base = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let none = item(1, "none");
        let mut late = item(2, "late");
        late.due_date = Some(base + Duration::days(3));
        let mut early = item(3, "early");
        early.due_date = Some(base);

        let asc = query(SortKey::DueDate, SortDirection::Ascending)
            .run(vec![none.clone(), late.clone(), early.clone()]);
        assert_eq!(contents(&asc), vec!["early", "late", "none"]);

        let desc = query(SortKey::DueDate, SortDirection::Descending).run(vec![none, late, early]);
        assert_eq!(contents(&desc), vec!["none", "late", "early"]);
    }

    fn ids(items: &[TodoItem]) -> Vec<u64> {
        items.iter().map(|i| i.id).collect()
    }

    #[test]
    fn test_completed_sort_present_first_then_elapsed() {
        let base = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let open_a = item(1, "open a");
        let mut late = item(2, "late");
        late.completed = Some(base + Duration::minutes(5));
        let mut early = item(3, "early");
        early.completed = Some(base + Duration::minutes(1));
        let open_b = item(4, "open b");
        let items = vec![open_a, late, early, open_b];

        let asc = query(SortKey::Completed, SortDirection::Ascending).run(items.clone());
        assert_eq!(ids(&asc), vec![3, 2, 1, 4]);

        let desc = query(SortKey::Completed, SortDirection::Descending).run(items);
        assert_eq!(ids(&desc), vec![1, 4, 2, 3]);
    }

    #[test]
    fn test_id_and_created_at_descending() {
        // item() derives created_at from the id, so shuffle to make both keys work
        let items = vec![item(2, "b"), item(3, "c"), item(1, "a")];

        let by_id = query(SortKey::Id, SortDirection::Descending).run(items.clone());
        assert_eq!(ids(&by_id), vec![3, 2, 1]);

        let by_created = query(SortKey::CreatedAt, SortDirection::Descending).run(items.clone());
        assert_eq!(ids(&by_created), vec![3, 2, 1]);

        let ascending = query(SortKey::CreatedAt, SortDirection::Ascending).run(items);
        assert_eq!(ids(&ascending), vec![1, 2, 3]);
    }

    #[test]
    fn test_created_at_ties_keep_input_order() {
        let stamp = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let items: Vec<TodoItem> = [5, 2, 9]
            .into_iter()
            .map(|id| {
                let mut it = item(id, "same");
                it.created_at = stamp;
                it
            })
            .collect();

        let sorted = query(SortKey::CreatedAt, SortDirection::Descending).run(items);
        assert_eq!(ids(&sorted), vec![5, 2, 9]);
    }

    #[test]
    fn test_complete_filter_partitions() {
        let mut done = item(1, "done");
        done.completed = Some(Utc::now());
        let open = item(2, "open");
        let all = vec![done, open];

        let completed = ListQuery {
            complete: Some(CompleteFilter::Completed),
            ..Default::default()
        }
        .run(all.clone());
        let pending = ListQuery {
            complete: Some(CompleteFilter::Open),
            ..Default::default()
        }
        .run(all.clone());

        assert_eq!(contents(&completed), vec!["done"]);
        assert_eq!(contents(&pending), vec!["open"]);
        assert_eq!(completed.len() + pending.len(), all.len());
    }

    #[test]
    fn test_parse_errors() {
        assert!(CompleteFilter::parse("yes").is_err());
        assert_eq!(CompleteFilter::parse("TRUE").unwrap(), CompleteFilter::Completed);
        assert_eq!(CompleteFilter::parse("0").unwrap(), CompleteFilter::Open);

        let err = SortKey::parse("colour").unwrap_err();
        assert_eq!(
            err.to_string(),
            "You can only sort by a value that exists in each todo item, not colour."
        );
        assert_eq!(SortKey::parse("Created_At").unwrap(), SortKey::CreatedAt);

        assert_eq!(SortDirection::parse("DESC"), SortDirection::Descending);
        assert_eq!(SortDirection::parse("down"), SortDirection::Ascending);
    }

    #[test]
    fn test_from_params_checks_filter_first() {
        let params = TodoParams {
            complete: Some("maybe".to_string()),
            order_by: Some("colour".to_string()),
            ..Default::default()
        };
        let err = ListQuery::from_params(&params).unwrap_err();
        assert!(err.to_string().starts_with("Filtering completed tasks"));
    }
}
