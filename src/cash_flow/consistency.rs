//! Checks that an entry's operation type, category and subcategory form a
//! chain: the category belongs to the operation type and the subcategory
//! belongs to the category.

use rusqlite::Connection;

use crate::{
    Error, UserID,
    cash_flow::EntryField,
    taxonomy::{TaxonomyId, TaxonomyKind, get_item},
};

/// The entry fields whose taxonomy row must belong to another selected row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkField {
    /// The category must belong to the operation type.
    Category,
    /// The subcategory must belong to the category.
    Subcategory,
}

impl LinkField {
    /// The message shown when the link is broken.
    pub fn mismatch_message(self) -> &'static str {
        match self {
            LinkField::Category => "the category does not belong to the selected operation type",
            LinkField::Subcategory => "the subcategory does not belong to the selected category",
        }
    }
}

/// A category or subcategory along with the row it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParentLink {
    pub id: TaxonomyId,
    pub parent_id: TaxonomyId,
}

/// The taxonomy rows an entry refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub status_id: TaxonomyId,
    pub operation_type_id: TaxonomyId,
    pub category_id: TaxonomyId,
    pub subcategory_id: TaxonomyId,
}

/// Every link that is broken, in form order.
///
/// A link is only checked when both of its ends are known.
pub fn link_mismatches(
    operation_type_id: Option<TaxonomyId>,
    category: Option<ParentLink>,
    subcategory: Option<ParentLink>,
) -> Vec<LinkField> {
    let mut mismatches = Vec::new();

    if let (Some(operation_type_id), Some(category)) = (operation_type_id, category)
        && category.parent_id != operation_type_id
    {
        mismatches.push(LinkField::Category);
    }

    if let (Some(category), Some(subcategory)) = (category, subcategory)
        && subcategory.parent_id != category.id
    {
        mismatches.push(LinkField::Subcategory);
    }

    mismatches
}

/// Check the operation type → category → subcategory chain on already
/// loaded rows.
///
/// # Errors
///
/// Returns [Error::ReferentialMismatch] for the first broken link.
pub fn check_links(
    operation_type_id: Option<TaxonomyId>,
    category: Option<ParentLink>,
    subcategory: Option<ParentLink>,
) -> Result<(), Error> {
    match link_mismatches(operation_type_id, category, subcategory).first() {
        Some(field) => Err(Error::ReferentialMismatch(*field)),
        None => Ok(()),
    }
}

/// The taxonomy rows picked on a form that may be partly filled in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DraftSelection {
    pub status_id: Option<TaxonomyId>,
    pub operation_type_id: Option<TaxonomyId>,
    pub category_id: Option<TaxonomyId>,
    pub subcategory_id: Option<TaxonomyId>,
}

impl From<&Selection> for DraftSelection {
    fn from(selection: &Selection) -> Self {
        Self {
            status_id: Some(selection.status_id),
            operation_type_id: Some(selection.operation_type_id),
            category_id: Some(selection.category_id),
            subcategory_id: Some(selection.subcategory_id),
        }
    }
}

/// Load `id` if it belongs to `owner`, returning its parent ID.
///
/// The outer option is `None` when the row is missing or not owned.
fn find_owned(
    kind: TaxonomyKind,
    id: TaxonomyId,
    owner: UserID,
    connection: &Connection,
) -> Result<Option<Option<TaxonomyId>>, Error> {
    match get_item(kind, id, owner, connection) {
        Ok(item) => Ok(Some(item.parent_id)),
        Err(Error::NotFound) => Ok(None),
        Err(error) => Err(error),
    }
}

/// Every problem with `selection`: rows that are missing or belong to
/// another user, followed by broken links. Fields that are not set are
/// skipped.
///
/// The outer error is for database failures only.
pub fn selection_errors(
    selection: &DraftSelection,
    owner: UserID,
    connection: &Connection,
) -> Result<Vec<Error>, Error> {
    let mut errors = Vec::new();

    let mut lookup = |kind: TaxonomyKind,
                      field: EntryField,
                      id: Option<TaxonomyId>|
     -> Result<Option<(TaxonomyId, Option<TaxonomyId>)>, Error> {
        let Some(id) = id else {
            return Ok(None);
        };

        let found = find_owned(kind, id, owner, connection)?;

        if found.is_none() {
            errors.push(Error::InvalidReference(field));
        }

        Ok(found.map(|parent_id| (id, parent_id)))
    };

    lookup(TaxonomyKind::Status, EntryField::Status, selection.status_id)?;
    let operation_type = lookup(
        TaxonomyKind::OperationType,
        EntryField::OperationType,
        selection.operation_type_id,
    )?;
    let category = lookup(
        TaxonomyKind::Category,
        EntryField::Category,
        selection.category_id,
    )?;
    let subcategory = lookup(
        TaxonomyKind::Subcategory,
        EntryField::Subcategory,
        selection.subcategory_id,
    )?;

    let to_link = |found: Option<(TaxonomyId, Option<TaxonomyId>)>| {
        found.and_then(|(id, parent_id)| parent_id.map(|parent_id| ParentLink { id, parent_id }))
    };

    errors.extend(
        link_mismatches(
            operation_type.map(|(id, _)| id),
            to_link(category),
            to_link(subcategory),
        )
        .into_iter()
        .map(Error::ReferentialMismatch),
    );

    Ok(errors)
}

/// Check that every row in `selection` belongs to `owner` and that the
/// operation type → category → subcategory chain holds.
///
/// This only reads from the database. Writers call it inside the same
/// transaction as their INSERT or UPDATE.
///
/// # Errors
///
/// Returns the first of:
/// - [Error::InvalidReference] if a row is missing or belongs to another user,
/// - [Error::ReferentialMismatch] if a link is broken.
pub fn validate_selection(
    selection: &Selection,
    owner: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    match selection_errors(&selection.into(), owner, connection)?
        .into_iter()
        .next()
    {
        Some(error) => Err(error),
        None => Ok(()),
    }
}


#[cfg(test)]
mod validate_selection_tests {
    use crate::{
        Error,
        cash_flow::{EntryField, LinkField},
        taxonomy::{NewTaxonomyItem, TaxonomyKind, TaxonomyName, create_item},
        test_utils::{create_test_taxonomy, create_test_user, open_test_db},
    };

    use super::{DraftSelection, Selection, selection_errors, validate_selection};

    #[test]
    fn owned_consistent_selection_passes() {
        let connection = open_test_db();
        let owner = create_test_user(&connection, "test@example.com");
        let taxonomy = create_test_taxonomy(&connection, owner);

        let result = validate_selection(&taxonomy.selection(), owner, &connection);

        assert_eq!(result, Ok(()));
    }

    #[test]
    fn other_owners_rows_are_invalid_references() {
        let connection = open_test_db();
        let owner = create_test_user(&connection, "test@example.com");
        let other = create_test_user(&connection, "other@example.com");
        let mine = create_test_taxonomy(&connection, owner);
        let theirs = create_test_taxonomy(&connection, other);
        let selection = Selection {
            status_id: theirs.status,
            ..mine.selection()
        };

        let result = validate_selection(&selection, owner, &connection);

        assert_eq!(result, Err(Error::InvalidReference(EntryField::Status)));
    }

    #[test]
    fn collects_every_error() {
        let connection = open_test_db();
        let owner = create_test_user(&connection, "test@example.com");
        let taxonomy = create_test_taxonomy(&connection, owner);
        let income = create_item(
            TaxonomyKind::OperationType,
            NewTaxonomyItem::new(TaxonomyName::new_unchecked("Income")),
            owner,
            &connection,
        )
        .unwrap();
        let salary = create_item(
            TaxonomyKind::Category,
            NewTaxonomyItem::new(TaxonomyName::new_unchecked("Salary")).parent(income.id),
            owner,
            &connection,
        )
        .unwrap();
        let selection = Selection {
            status_id: 999,
            category_id: salary.id,
            ..taxonomy.selection()
        };

        let errors = selection_errors(&(&selection).into(), owner, &connection).unwrap();

        assert_eq!(
            errors,
            [
                Error::InvalidReference(EntryField::Status),
                Error::ReferentialMismatch(LinkField::Category),
                Error::ReferentialMismatch(LinkField::Subcategory),
            ]
        );
    }

    #[test]
    fn subcategory_mismatch_is_not_reported_as_category() {
        let connection = open_test_db();
        let owner = create_test_user(&connection, "test@example.com");
        let taxonomy = create_test_taxonomy(&connection, owner);
        let takeaways = create_item(
            TaxonomyKind::Category,
            NewTaxonomyItem::new(TaxonomyName::new_unchecked("Takeaways"))
                .parent(taxonomy.operation_type),
            owner,
            &connection,
        )
        .unwrap();
        let selection = DraftSelection {
            operation_type_id: Some(taxonomy.operation_type),
            category_id: Some(takeaways.id),
            subcategory_id: Some(taxonomy.subcategory),
            ..Default::default()
        };

        let errors = selection_errors(&selection, owner, &connection).unwrap();

        assert_eq!(errors, [Error::ReferentialMismatch(LinkField::Subcategory)]);
    }

    #[test]
    fn unset_fields_are_skipped() {
        let connection = open_test_db();
        let owner = create_test_user(&connection, "test@example.com");
        let taxonomy = create_test_taxonomy(&connection, owner);
        let selection = DraftSelection {
            operation_type_id: Some(taxonomy.operation_type),
            subcategory_id: Some(taxonomy.subcategory),
            ..Default::default()
        };

        let errors = selection_errors(&selection, owner, &connection).unwrap();

        assert!(errors.is_empty(), "got errors {errors:?}");
    }
}
