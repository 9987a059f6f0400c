use rusqlite::Connection;
use time::macros::date;

use crate::{
    Email, NewUser, PasswordHash, UserID,
    cash_flow::{CashFlowEntry, EntryId, Selection, create_entry},
    create_user,
    db::initialize,
    taxonomy::{NewTaxonomyItem, TaxonomyId, TaxonomyKind, TaxonomyName, create_item},
};

/// An in-memory database with every table created.
pub(crate) fn open_test_db() -> Connection {
    let connection =
        Connection::open_in_memory().expect("Could not open in-memory SQLite database");
    initialize(&connection).expect("Could not initialize database");
    connection
}

pub(crate) fn create_test_user(connection: &Connection, email: &str) -> UserID {
    create_user(
        NewUser::new(
            Email::new_unchecked(email),
            PasswordHash::new_unchecked("hunter2"),
        ),
        connection,
    )
    .expect("Could not create test user")
    .id
}

/// One row of each taxonomy kind, linked into a valid chain.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TestTaxonomy {
    pub status: TaxonomyId,
    pub operation_type: TaxonomyId,
    pub category: TaxonomyId,
    pub subcategory: TaxonomyId,
}

impl TestTaxonomy {
    pub(crate) fn selection(&self) -> Selection {
        Selection {
            status_id: self.status,
            operation_type_id: self.operation_type,
            category_id: self.category,
            subcategory_id: self.subcategory,
        }
    }
}

/// Create "Paid", "Expense" → "Groceries" → "Supermarket" for `owner`.
pub(crate) fn create_test_taxonomy(connection: &Connection, owner: UserID) -> TestTaxonomy {
    let create = |kind, name: &str, parent: Option<TaxonomyId>| {
        let mut item = NewTaxonomyItem::new(TaxonomyName::new_unchecked(name));
        item.parent_id = parent;

        create_item(kind, item, owner, connection)
            .unwrap_or_else(|error| panic!("Could not create {kind} {name}: {error}"))
            .id
    };

    let status = create(TaxonomyKind::Status, "Paid", None);
    let operation_type = create(TaxonomyKind::OperationType, "Expense", None);
    let category = create(TaxonomyKind::Category, "Groceries", Some(operation_type));
    let subcategory = create(TaxonomyKind::Subcategory, "Supermarket", Some(category));

    TestTaxonomy {
        status,
        operation_type,
        category,
        subcategory,
    }
}

/// Create an entry dated 2025-01-01 using `taxonomy`.
pub(crate) fn create_test_entry(
    connection: &Connection,
    owner: UserID,
    taxonomy: &TestTaxonomy,
    amount: &str,
) -> EntryId {
    create_entry(
        CashFlowEntry::build(
            date!(2025 - 01 - 01),
            taxonomy.status,
            taxonomy.operation_type,
            taxonomy.category,
            taxonomy.subcategory,
            amount.parse().expect("Invalid test amount"),
        ),
        owner,
        connection,
    )
    .expect("Could not create test entry")
    .id
}
