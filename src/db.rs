//! Database schema setup.

use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::{
    Error, auth::create_user_table, cash_flow::create_cash_flow_table,
    taxonomy::create_taxonomy_tables,
};

/// Turn on foreign key enforcement and create any missing tables.
///
/// The tables are created in one exclusive transaction, so either every
/// table exists afterwards or none of the new ones do. Safe to call on an
/// existing database.
///
/// # Errors
/// Returns an [Error::SqlError] if the pragma or any statement fails.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_taxonomy_tables(&transaction)?;
    create_cash_flow_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}
