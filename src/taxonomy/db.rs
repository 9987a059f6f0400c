//! Database operations for statuses, operation types, categories and subcategories.
//!
//! Every function takes the owner's [UserID] and never reads or writes rows
//! that belong to another user. Table and column names come from
//! [TaxonomyKind], never from user input.

use std::collections::HashMap;

use rusqlite::{Connection, Row};

use crate::{
    Error, UserID,
    error::{is_foreign_key_violation, is_unique_violation},
    taxonomy::{Choice, NewTaxonomyItem, TaxonomyId, TaxonomyItem, TaxonomyKind, TaxonomyName},
};

/// Create the four taxonomy tables and their indexes.
///
/// Categories and subcategories are deleted along with their parent. The
/// `cash_flow` table restricts deletes of anything it references, so a
/// cascade that reaches a referenced row fails the whole statement.
pub fn create_taxonomy_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS status (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            description TEXT,
            UNIQUE(user_id, name)
        );

        CREATE TABLE IF NOT EXISTS operation_type (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            description TEXT,
            UNIQUE(user_id, name)
        );

        CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            operation_type_id INTEGER NOT NULL
                REFERENCES operation_type(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            description TEXT,
            UNIQUE(user_id, operation_type_id, name)
        );

        CREATE INDEX IF NOT EXISTS idx_category_operation_type
            ON category(operation_type_id);

        CREATE TABLE IF NOT EXISTS subcategory (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            category_id INTEGER NOT NULL REFERENCES category(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            description TEXT,
            UNIQUE(user_id, category_id, name)
        );

        CREATE INDEX IF NOT EXISTS idx_subcategory_category ON subcategory(category_id);",
    )?;

    Ok(())
}

fn select_clause(kind: TaxonomyKind) -> String {
    format!(
        "SELECT id, name, {}, description FROM {}",
        kind.parent_column().unwrap_or("NULL"),
        kind.table()
    )
}

fn map_row(kind: TaxonomyKind, row: &Row) -> Result<TaxonomyItem, rusqlite::Error> {
    let raw_name: String = row.get(1)?;

    Ok(TaxonomyItem {
        id: row.get(0)?,
        kind,
        name: TaxonomyName::new_unchecked(&raw_name),
        parent_id: row.get(2)?,
        description: row.get(3)?,
    })
}

fn map_choice(row: &Row) -> Result<Choice, rusqlite::Error> {
    Ok(Choice {
        id: row.get(0)?,
        name: row.get(1)?,
    })
}

fn item_exists(
    kind: TaxonomyKind,
    id: TaxonomyId,
    owner: UserID,
    connection: &Connection,
) -> Result<bool, Error> {
    connection
        .prepare(&format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?1 AND user_id = ?2)",
            kind.table()
        ))?
        .query_row((id, owner.as_i64()), |row| row.get(0))
        .map_err(|error| error.into())
}

/// Check that `parent_id` is given exactly when `kind` takes a parent, and
/// that the parent belongs to `owner`.
fn check_parent(
    kind: TaxonomyKind,
    parent_id: Option<TaxonomyId>,
    owner: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    match (kind.parent(), parent_id) {
        (None, None) => Ok(()),
        (None, Some(_)) => Err(Error::InvalidParent(kind)),
        (Some(parent_kind), None) => Err(Error::MissingParent(parent_kind)),
        (Some(parent_kind), Some(parent_id)) => {
            if item_exists(parent_kind, parent_id, owner, connection)? {
                Ok(())
            } else {
                Err(Error::InvalidParent(parent_kind))
            }
        }
    }
}

fn map_write_error(error: rusqlite::Error, name: &TaxonomyName) -> Error {
    if is_unique_violation(&error) {
        Error::DuplicateName(name.to_string())
    } else {
        error.into()
    }
}

/// Create a status, operation type, category or subcategory for `owner`.
///
/// # Errors
///
/// Returns:
/// - [Error::MissingParent] or [Error::InvalidParent] if the parent is
///   missing, not owned by `owner`, or given for a kind without parents,
/// - [Error::DuplicateName] if the name is taken within its scope,
/// - [Error::SqlError] for other SQL errors.
pub fn create_item(
    kind: TaxonomyKind,
    item: NewTaxonomyItem,
    owner: UserID,
    connection: &Connection,
) -> Result<TaxonomyItem, Error> {
    let transaction = connection.unchecked_transaction()?;
    check_parent(kind, item.parent_id, owner, &transaction)?;

    let id: TaxonomyId = match kind.parent_column() {
        Some(parent_column) => transaction
            .prepare(&format!(
                "INSERT INTO {} (user_id, {parent_column}, name, description)
                 VALUES (?1, ?2, ?3, ?4) RETURNING id",
                kind.table()
            ))?
            .query_row(
                (
                    owner.as_i64(),
                    item.parent_id,
                    item.name.as_ref(),
                    &item.description,
                ),
                |row| row.get(0),
            ),
        None => transaction
            .prepare(&format!(
                "INSERT INTO {} (user_id, name, description) VALUES (?1, ?2, ?3) RETURNING id",
                kind.table()
            ))?
            .query_row(
                (owner.as_i64(), item.name.as_ref(), &item.description),
                |row| row.get(0),
            ),
    }
    .map_err(|error| map_write_error(error, &item.name))?;

    transaction.commit()?;

    Ok(TaxonomyItem {
        id,
        kind,
        name: item.name,
        parent_id: item.parent_id,
        description: item.description,
    })
}

/// Retrieve a single row owned by `owner`.
///
/// # Errors
///
/// Returns [Error::NotFound] if the row does not exist or belongs to another user.
pub fn get_item(
    kind: TaxonomyKind,
    id: TaxonomyId,
    owner: UserID,
    connection: &Connection,
) -> Result<TaxonomyItem, Error> {
    connection
        .prepare(&format!(
            "{} WHERE id = ?1 AND user_id = ?2",
            select_clause(kind)
        ))?
        .query_row((id, owner.as_i64()), |row| map_row(kind, row))
        .map_err(|error| error.into())
}

/// Retrieve all of `owner`'s rows of `kind` ordered by name.
pub fn get_all_items(
    kind: TaxonomyKind,
    owner: UserID,
    connection: &Connection,
) -> Result<Vec<TaxonomyItem>, Error> {
    connection
        .prepare(&format!(
            "{} WHERE user_id = ?1 ORDER BY name ASC, id ASC",
            select_clause(kind)
        ))?
        .query_map([owner.as_i64()], |row| map_row(kind, row))?
        .map(|maybe_item| maybe_item.map_err(|error| error.into()))
        .collect()
}

/// Update the name, parent and description of a row.
///
/// # Errors
///
/// Returns:
/// - [Error::UpdateMissingTaxonomyItem] if the row does not exist or belongs to another user,
/// - [Error::ReparentInUse] if the parent changes while entries reference the row,
/// - the same validation errors as [create_item].
pub fn update_item(
    kind: TaxonomyKind,
    id: TaxonomyId,
    item: NewTaxonomyItem,
    owner: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let transaction = connection.unchecked_transaction()?;

    let current = get_item(kind, id, owner, &transaction).map_err(|error| match error {
        Error::NotFound => Error::UpdateMissingTaxonomyItem(kind),
        error => error,
    })?;

    check_parent(kind, item.parent_id, owner, &transaction)?;

    if current.parent_id != item.parent_id
        && count_referencing_entries(kind, id, &transaction)? > 0
    {
        return Err(Error::ReparentInUse(kind));
    }

    match kind.parent_column() {
        Some(parent_column) => transaction.execute(
            &format!(
                "UPDATE {} SET name = ?1, description = ?2, {parent_column} = ?3
                 WHERE id = ?4 AND user_id = ?5",
                kind.table()
            ),
            (
                item.name.as_ref(),
                &item.description,
                item.parent_id,
                id,
                owner.as_i64(),
            ),
        ),
        None => transaction.execute(
            &format!(
                "UPDATE {} SET name = ?1, description = ?2 WHERE id = ?3 AND user_id = ?4",
                kind.table()
            ),
            (item.name.as_ref(), &item.description, id, owner.as_i64()),
        ),
    }
    .map_err(|error| map_write_error(error, &item.name))?;

    transaction.commit()?;

    Ok(())
}

/// Count the entries that reference the row or anything beneath it in the
/// operation type → category → subcategory hierarchy.
fn count_referencing_entries(
    kind: TaxonomyKind,
    id: TaxonomyId,
    connection: &Connection,
) -> Result<u32, Error> {
    let condition = match kind {
        TaxonomyKind::Status => "status_id = ?1",
        TaxonomyKind::OperationType => {
            "operation_type_id = ?1
            OR category_id IN (SELECT id FROM category WHERE operation_type_id = ?1)
            OR subcategory_id IN (
                SELECT subcategory.id FROM subcategory
                INNER JOIN category ON subcategory.category_id = category.id
                WHERE category.operation_type_id = ?1
            )"
        }
        TaxonomyKind::Category => {
            "category_id = ?1
            OR subcategory_id IN (SELECT id FROM subcategory WHERE category_id = ?1)"
        }
        TaxonomyKind::Subcategory => "subcategory_id = ?1",
    };

    connection
        .prepare(&format!("SELECT COUNT(*) FROM cash_flow WHERE {condition}"))?
        .query_row([id], |row| row.get(0))
        .map_err(|error| error.into())
}

/// Delete a row along with its children.
///
/// The delete is all or nothing: if any entry references the row or one of
/// its children, nothing is deleted.
///
/// # Errors
///
/// Returns:
/// - [Error::DeleteMissingTaxonomyItem] if the row does not exist or belongs to another user,
/// - [Error::ProtectedReference] if entries reference the row or its children.
pub fn delete_item(
    kind: TaxonomyKind,
    id: TaxonomyId,
    owner: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let transaction = connection.unchecked_transaction()?;

    if !item_exists(kind, id, owner, &transaction)? {
        return Err(Error::DeleteMissingTaxonomyItem(kind));
    }

    if count_referencing_entries(kind, id, &transaction)? > 0 {
        return Err(Error::ProtectedReference(kind));
    }

    transaction
        .execute(
            &format!("DELETE FROM {} WHERE id = ?1 AND user_id = ?2", kind.table()),
            (id, owner.as_i64()),
        )
        .map_err(|error| {
            if is_foreign_key_violation(&error) {
                Error::ProtectedReference(kind)
            } else {
                error.into()
            }
        })?;

    transaction.commit()?;

    Ok(())
}

/// The number of `owner`'s entries that reference each row of `kind`.
///
/// Rows without entries are absent from the map.
pub fn count_entries_per_item(
    kind: TaxonomyKind,
    owner: UserID,
    connection: &Connection,
) -> Result<HashMap<TaxonomyId, u32>, Error> {
    let column = kind.entry_column();

    connection
        .prepare(&format!(
            "SELECT {column}, COUNT(*) FROM cash_flow WHERE user_id = ?1 GROUP BY {column}"
        ))?
        .query_map([owner.as_i64()], |row| Ok((row.get(0)?, row.get(1)?)))?
        .map(|maybe_count| maybe_count.map_err(|error| error.into()))
        .collect()
}

/// `owner`'s rows of `kind` as choices for a select input, ordered by name.
pub fn get_choices(
    kind: TaxonomyKind,
    owner: UserID,
    connection: &Connection,
) -> Result<Vec<Choice>, Error> {
    connection
        .prepare(&format!(
            "SELECT id, name FROM {} WHERE user_id = ?1 ORDER BY name ASC, id ASC",
            kind.table()
        ))?
        .query_map([owner.as_i64()], map_choice)?
        .map(|maybe_choice| maybe_choice.map_err(|error| error.into()))
        .collect()
}

/// The rows of `kind` whose parent is `parent_id`, in insertion order.
///
/// Returns an empty list for kinds without a parent and for parents that do
/// not belong to `owner`.
pub fn get_children(
    kind: TaxonomyKind,
    parent_id: TaxonomyId,
    owner: UserID,
    connection: &Connection,
) -> Result<Vec<Choice>, Error> {
    let Some(parent_column) = kind.parent_column() else {
        return Ok(Vec::new());
    };

    connection
        .prepare(&format!(
            "SELECT id, name FROM {} WHERE {parent_column} = ?1 AND user_id = ?2 ORDER BY id ASC",
            kind.table()
        ))?
        .query_map((parent_id, owner.as_i64()), map_choice)?
        .map(|maybe_choice| maybe_choice.map_err(|error| error.into()))
        .collect()
}

/// The options for the parent select on the form for `kind`.
///
/// Subcategory parents are labelled with their operation type, e.g.
/// "Salary (Income)", since category names may repeat across operation types.
pub fn get_parent_choices(
    kind: TaxonomyKind,
    owner: UserID,
    connection: &Connection,
) -> Result<Vec<Choice>, Error> {
    match kind {
        TaxonomyKind::Status | TaxonomyKind::OperationType => Ok(Vec::new()),
        TaxonomyKind::Category => get_choices(TaxonomyKind::OperationType, owner, connection),
        TaxonomyKind::Subcategory => connection
            .prepare(
                "SELECT category.id, category.name || ' (' || operation_type.name || ')'
                 FROM category
                 INNER JOIN operation_type ON category.operation_type_id = operation_type.id
                 WHERE category.user_id = ?1
                 ORDER BY category.name ASC, operation_type.name ASC",
            )?
            .query_map([owner.as_i64()], map_choice)?
            .map(|maybe_choice| maybe_choice.map_err(|error| error.into()))
            .collect(),
    }
}
