//! Database query helpers for the cash-flow page.

use rusqlite::{Connection, params_from_iter, types::Value};
use time::Date;

use crate::{
    Error, UserID,
    cash_flow::{Amount, EntryId},
    taxonomy::TaxonomyId,
};

/// Restricts which entries [list_entries] returns.
///
/// Every field that is set must match, dates are inclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntryFilter {
    pub date_from: Option<Date>,
    pub date_to: Option<Date>,
    pub status_id: Option<TaxonomyId>,
    pub operation_type_id: Option<TaxonomyId>,
    pub category_id: Option<TaxonomyId>,
    pub subcategory_id: Option<TaxonomyId>,
}

impl EntryFilter {
    /// Whether no field is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// The SQL conditions for this filter and their values, starting with the
    /// owner check. Placeholders are numbered from `?1`.
    fn conditions(&self, owner: UserID) -> (Vec<String>, Vec<Value>) {
        let mut conditions = vec!["cash_flow.user_id = ?1".to_owned()];
        let mut values = vec![Value::Integer(owner.as_i64())];

        let mut push = |condition: &str, value: Value| {
            values.push(value);
            conditions.push(format!("{condition} ?{}", values.len()));
        };

        if let Some(date_from) = self.date_from {
            push("cash_flow.date >=", Value::Text(date_from.to_string()));
        }

        if let Some(date_to) = self.date_to {
            push("cash_flow.date <=", Value::Text(date_to.to_string()));
        }

        let ids = [
            ("cash_flow.status_id =", self.status_id),
            ("cash_flow.operation_type_id =", self.operation_type_id),
            ("cash_flow.category_id =", self.category_id),
            ("cash_flow.subcategory_id =", self.subcategory_id),
        ];

        for (condition, id) in ids {
            if let Some(id) = id {
                push(condition, Value::Integer(id));
            }
        }

        (conditions, values)
    }
}

/// An entry with the names of its taxonomy rows, ready for display.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryRow {
    pub id: EntryId,
    pub date: Date,
    pub amount: Amount,
    pub comment: String,
    pub status: String,
    pub operation_type: String,
    pub category: String,
    pub subcategory: String,
}

/// One page of entries.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryPage {
    /// The entries on this page, newest first.
    pub rows: Vec<EntryRow>,
    /// The 1-based page number.
    pub page: u64,
    /// The number of pages, zero when nothing matches.
    pub page_count: u64,
    /// The number of entries that match the filter across all pages.
    pub total: u64,
}

/// Get one page of `owner`'s entries that match `filter`.
///
/// Entries are ordered by date, then creation time, then ID, all
/// descending. A `page` of zero is treated as the first page and a page past
/// the end as the last page.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub fn list_entries(
    owner: UserID,
    filter: &EntryFilter,
    page: u64,
    page_size: u64,
    connection: &Connection,
) -> Result<EntryPage, Error> {
    let page_size = page_size.max(1);
    let (conditions, mut values) = filter.conditions(owner);
    let where_clause = conditions.join(" AND ");

    let total: i64 = connection.query_row(
        &format!("SELECT COUNT(cash_flow.id) FROM cash_flow WHERE {where_clause}"),
        params_from_iter(values.iter()),
        |row| row.get(0),
    )?;
    let total = u64::try_from(total).unwrap_or_default();
    let page_count = total.div_ceil(page_size);
    let page = page.clamp(1, page_count.max(1));

    // The offset is below `total` once the page is clamped.
    let offset = (page - 1)
        .checked_mul(page_size)
        .and_then(|offset| i64::try_from(offset).ok())
        .unwrap_or(i64::MAX);

    let limit_placeholder = values.len() + 1;
    let offset_placeholder = values.len() + 2;
    values.push(Value::Integer(
        i64::try_from(page_size).unwrap_or(i64::MAX),
    ));
    values.push(Value::Integer(offset));

    let query = format!(
        "SELECT cash_flow.id, cash_flow.date, cash_flow.amount, cash_flow.comment,
            status.name, operation_type.name, category.name, subcategory.name
        FROM cash_flow
        INNER JOIN status ON cash_flow.status_id = status.id
        INNER JOIN operation_type ON cash_flow.operation_type_id = operation_type.id
        INNER JOIN category ON cash_flow.category_id = category.id
        INNER JOIN subcategory ON cash_flow.subcategory_id = subcategory.id
        WHERE {where_clause}
        ORDER BY cash_flow.date DESC, cash_flow.created_at DESC, cash_flow.id DESC
        LIMIT ?{limit_placeholder} OFFSET ?{offset_placeholder}"
    );

    let rows = connection
        .prepare(&query)?
        .query_map(params_from_iter(values.iter()), |row| {
            Ok(EntryRow {
                id: row.get(0)?,
                date: row.get(1)?,
                amount: row.get(2)?,
                comment: row.get(3)?,
                status: row.get(4)?,
                operation_type: row.get(5)?,
                category: row.get(6)?,
                subcategory: row.get(7)?,
            })
        })?
        .map(|row_result| row_result.map_err(Error::from))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(EntryPage {
        rows,
        page,
        page_count,
        total,
    })
}
