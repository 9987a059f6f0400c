//! Defines the core data models and database queries for cash-flow entries.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use rust_decimal::Decimal;
use time::{Date, OffsetDateTime};

use crate::{
    Error, UserID,
    cash_flow::consistency::{LinkField, Selection, validate_selection},
    taxonomy::TaxonomyId,
};

/// Database identifier for a cash-flow entry.
pub type EntryId = i64;

/// The maximum number of digits before the decimal point in an [Amount].
pub const MAX_AMOUNT_INTEGER_DIGITS: u32 = 10;

// ============================================================================
// MODELS
// ============================================================================

/// A strictly positive amount of money with at most two decimal places.
///
/// Amounts are stored as integer cents so that no precision is lost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Amount(Decimal);

impl Amount {
    /// Create an amount.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidAmount] if `value` is zero or negative, has more
    /// than two decimal places, or has more than [MAX_AMOUNT_INTEGER_DIGITS]
    /// digits before the decimal point.
    pub fn new(value: Decimal) -> Result<Self, Error> {
        let value = value.normalize();

        if value <= Decimal::ZERO {
            return Err(Error::InvalidAmount(
                "amount must be greater than zero".to_owned(),
            ));
        }

        if value.scale() > 2 {
            return Err(Error::InvalidAmount(
                "amount cannot have more than 2 decimal places".to_owned(),
            ));
        }

        if value.trunc() >= Decimal::from(10_i64.pow(MAX_AMOUNT_INTEGER_DIGITS)) {
            return Err(Error::InvalidAmount(format!(
                "amount cannot have more than {MAX_AMOUNT_INTEGER_DIGITS} digits before the decimal point"
            )));
        }

        Ok(Self(value))
    }

    /// Create an amount from a whole number of cents.
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, 2).normalize())
    }

    /// The amount as a whole number of cents.
    pub fn to_cents(self) -> i64 {
        let mut value = self.0;
        value.rescale(2);
        // At most 12 digits, which always fits in an i64.
        value.mantissa() as i64
    }

    /// The amount as a decimal number.
    pub fn as_decimal(self) -> Decimal {
        self.0
    }
}

impl FromStr for Amount {
    type Err = Error;

    /// Parse a plain decimal number such as "12.5" or "1000.00".
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let value = Decimal::from_str_exact(text.trim()).map_err(|_| {
            Error::InvalidAmount(format!("\"{}\" is not a valid amount", text.trim()))
        })?;

        Amount::new(value)
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl ToSql for Amount {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_cents()))
    }
}

impl FromSql for Amount {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let cents = i64::column_result(value)?;

        if cents <= 0 {
            return Err(FromSqlError::OutOfRange(cents));
        }

        Ok(Amount::from_cents(cents))
    }
}

/// The fields of the entry form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryField {
    Date,
    Status,
    OperationType,
    Category,
    Subcategory,
    Amount,
    Comment,
}

impl EntryField {
    /// The `name` attribute of the form input for this field.
    pub fn form_name(self) -> &'static str {
        match self {
            EntryField::Date => "date",
            EntryField::Status => "status_id",
            EntryField::OperationType => "operation_type_id",
            EntryField::Category => "category_id",
            EntryField::Subcategory => "subcategory_id",
            EntryField::Amount => "amount",
            EntryField::Comment => "comment",
        }
    }
}

impl Display for EntryField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            EntryField::Date => "date",
            EntryField::Status => "status",
            EntryField::OperationType => "operation type",
            EntryField::Category => "category",
            EntryField::Subcategory => "subcategory",
            EntryField::Amount => "amount",
            EntryField::Comment => "comment",
        };

        write!(f, "{label}")
    }
}

impl From<LinkField> for EntryField {
    fn from(value: LinkField) -> Self {
        match value {
            LinkField::Category => EntryField::Category,
            LinkField::Subcategory => EntryField::Subcategory,
        }
    }
}

/// A dated amount classified by a status, operation type, category and subcategory.
///
/// To create a new `CashFlowEntry`, use [CashFlowEntry::build].
#[derive(Debug, Clone, PartialEq)]
pub struct CashFlowEntry {
    /// The ID of the entry.
    pub id: EntryId,
    /// The day the money moved.
    pub date: Date,
    /// Whether the money has moved yet, e.g. "Paid" or "Pending".
    pub status_id: TaxonomyId,
    /// The top of the classification hierarchy, e.g. "Income" or "Expense".
    pub operation_type_id: TaxonomyId,
    /// Must belong to the operation type.
    pub category_id: TaxonomyId,
    /// Must belong to the category.
    pub subcategory_id: TaxonomyId,
    /// How much money moved.
    pub amount: Amount,
    /// Free text, may be empty.
    pub comment: String,
    /// When the entry was recorded (UTC).
    pub created_at: OffsetDateTime,
    /// When the entry was last changed (UTC).
    pub updated_at: OffsetDateTime,
}

impl CashFlowEntry {
    /// Create a new entry.
    ///
    /// Shortcut for [CashFlowEntryBuilder] for discoverability.
    pub fn build(
        date: Date,
        status_id: TaxonomyId,
        operation_type_id: TaxonomyId,
        category_id: TaxonomyId,
        subcategory_id: TaxonomyId,
        amount: Amount,
    ) -> CashFlowEntryBuilder {
        CashFlowEntryBuilder {
            date,
            status_id,
            operation_type_id,
            category_id,
            subcategory_id,
            amount,
            comment: String::new(),
        }
    }

    /// A builder holding this entry's user editable fields.
    pub fn rebuild(&self) -> CashFlowEntryBuilder {
        Self::build(
            self.date,
            self.status_id,
            self.operation_type_id,
            self.category_id,
            self.subcategory_id,
            self.amount,
        )
        .comment(&self.comment)
    }
}

/// The user editable fields of a [CashFlowEntry].
///
/// The database sets the ID and timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct CashFlowEntryBuilder {
    pub date: Date,
    pub status_id: TaxonomyId,
    pub operation_type_id: TaxonomyId,
    pub category_id: TaxonomyId,
    pub subcategory_id: TaxonomyId,
    pub amount: Amount,
    pub comment: String,
}

impl CashFlowEntryBuilder {
    /// Set the comment, trimming surrounding whitespace.
    pub fn comment(mut self, comment: &str) -> Self {
        self.comment = comment.trim().to_owned();
        self
    }

    /// The taxonomy rows the entry refers to.
    pub fn selection(&self) -> Selection {
        Selection {
            status_id: self.status_id,
            operation_type_id: self.operation_type_id,
            category_id: self.category_id,
            subcategory_id: self.subcategory_id,
        }
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

const SELECT_COLUMNS: &str = "id, date, status_id, operation_type_id, category_id, \
    subcategory_id, amount, comment, created_at, updated_at";

/// Create the cash-flow table in the database.
///
/// Deleting a taxonomy row that an entry references is refused by SQLite.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_cash_flow_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS cash_flow (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            date TEXT NOT NULL,
            status_id INTEGER NOT NULL REFERENCES status(id) ON DELETE RESTRICT,
            operation_type_id INTEGER NOT NULL
                REFERENCES operation_type(id) ON DELETE RESTRICT,
            category_id INTEGER NOT NULL REFERENCES category(id) ON DELETE RESTRICT,
            subcategory_id INTEGER NOT NULL REFERENCES subcategory(id) ON DELETE RESTRICT,
            amount INTEGER NOT NULL CHECK (amount > 0),
            comment TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_cash_flow_user_date
            ON cash_flow(user_id, date DESC, created_at DESC);
        CREATE INDEX IF NOT EXISTS idx_cash_flow_status ON cash_flow(status_id);
        CREATE INDEX IF NOT EXISTS idx_cash_flow_operation_type ON cash_flow(operation_type_id);
        CREATE INDEX IF NOT EXISTS idx_cash_flow_category ON cash_flow(category_id);
        CREATE INDEX IF NOT EXISTS idx_cash_flow_subcategory ON cash_flow(subcategory_id);",
    )
}

/// Create a new entry for `owner`.
///
/// The taxonomy rows are checked inside the same database transaction as
/// the insert, so an entry that breaks the operation type → category →
/// subcategory hierarchy is never committed.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidReference] if a taxonomy row does not exist or belongs to another user,
/// - [Error::ReferentialMismatch] if the category or subcategory has a different parent,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_entry(
    builder: CashFlowEntryBuilder,
    owner: UserID,
    connection: &Connection,
) -> Result<CashFlowEntry, Error> {
    let transaction = connection.unchecked_transaction()?;
    validate_selection(&builder.selection(), owner, &transaction)?;

    let now = OffsetDateTime::now_utc();
    let entry = transaction
        .prepare(&format!(
            "INSERT INTO cash_flow (user_id, date, status_id, operation_type_id, category_id,
                subcategory_id, amount, comment, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
             RETURNING {SELECT_COLUMNS}"
        ))?
        .query_row(
            (
                owner.as_i64(),
                builder.date,
                builder.status_id,
                builder.operation_type_id,
                builder.category_id,
                builder.subcategory_id,
                builder.amount,
                &builder.comment,
                now,
            ),
            map_entry_row,
        )?;

    transaction.commit()?;

    Ok(entry)
}

/// Retrieve one of `owner`'s entries by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to one of `owner`'s entries,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_entry(id: EntryId, owner: UserID, connection: &Connection) -> Result<CashFlowEntry, Error> {
    let entry = connection
        .prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM cash_flow WHERE id = ?1 AND user_id = ?2"
        ))?
        .query_one((id, owner.as_i64()), map_entry_row)?;

    Ok(entry)
}

/// Replace the user editable fields of an entry and bump its `updated_at` time.
///
/// # Errors
/// This function will return a:
/// - [Error::UpdateMissingEntry] if `id` does not refer to one of `owner`'s entries,
/// - the same validation errors as [create_entry],
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_entry(
    id: EntryId,
    builder: CashFlowEntryBuilder,
    owner: UserID,
    connection: &Connection,
) -> Result<CashFlowEntry, Error> {
    let transaction = connection.unchecked_transaction()?;

    get_entry(id, owner, &transaction).map_err(|error| match error {
        Error::NotFound => Error::UpdateMissingEntry,
        error => error,
    })?;

    validate_selection(&builder.selection(), owner, &transaction)?;

    let entry = transaction
        .prepare(&format!(
            "UPDATE cash_flow
             SET date = ?1, status_id = ?2, operation_type_id = ?3, category_id = ?4,
                subcategory_id = ?5, amount = ?6, comment = ?7, updated_at = ?8
             WHERE id = ?9 AND user_id = ?10
             RETURNING {SELECT_COLUMNS}"
        ))?
        .query_row(
            (
                builder.date,
                builder.status_id,
                builder.operation_type_id,
                builder.category_id,
                builder.subcategory_id,
                builder.amount,
                &builder.comment,
                OffsetDateTime::now_utc(),
                id,
                owner.as_i64(),
            ),
            map_entry_row,
        )?;

    transaction.commit()?;

    Ok(entry)
}

/// Delete one of `owner`'s entries.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingEntry] if `id` does not refer to one of `owner`'s entries,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_entry(id: EntryId, owner: UserID, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM cash_flow WHERE id = ?1 AND user_id = ?2",
        (id, owner.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingEntry);
    }

    Ok(())
}

/// Get the number of entries that belong to `owner`.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn count_entries(owner: UserID, connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row(
            "SELECT COUNT(id) FROM cash_flow WHERE user_id = ?1",
            [owner.as_i64()],
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

fn map_entry_row(row: &Row) -> Result<CashFlowEntry, rusqlite::Error> {
    Ok(CashFlowEntry {
        id: row.get(0)?,
        date: row.get(1)?,
        status_id: row.get(2)?,
        operation_type_id: row.get(3)?,
        category_id: row.get(4)?,
        subcategory_id: row.get(5)?,
        amount: row.get(6)?,
        comment: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}
