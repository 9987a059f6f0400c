//! Core taxonomy domain types.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::{
    Error,
    endpoints::{self, format_endpoint},
};

/// The maximum number of characters in a taxonomy name.
pub const MAX_NAME_LENGTH: usize = 100;

/// Database identifier for a status, operation type, category or subcategory.
pub type TaxonomyId = i64;

/// The four kinds of taxonomy rows that classify cash-flow entries.
///
/// Operation types, categories and subcategories form a hierarchy: a
/// category belongs to an operation type and a subcategory belongs to a
/// category. Statuses stand alone.
///
/// The serialized form is the URL path segment, e.g. `/taxonomy/categories`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaxonomyKind {
    #[serde(rename = "statuses")]
    Status,
    #[serde(rename = "operation_types")]
    OperationType,
    #[serde(rename = "categories")]
    Category,
    #[serde(rename = "subcategories")]
    Subcategory,
}

impl TaxonomyKind {
    /// Every kind, in the order they appear in the navigation bar.
    pub const ALL: [TaxonomyKind; 4] = [
        TaxonomyKind::Status,
        TaxonomyKind::OperationType,
        TaxonomyKind::Category,
        TaxonomyKind::Subcategory,
    ];

    /// The SQL table holding rows of this kind.
    pub fn table(self) -> &'static str {
        match self {
            TaxonomyKind::Status => "status",
            TaxonomyKind::OperationType => "operation_type",
            TaxonomyKind::Category => "category",
            TaxonomyKind::Subcategory => "subcategory",
        }
    }

    /// The kind a row of this kind belongs to, if any.
    pub fn parent(self) -> Option<TaxonomyKind> {
        match self {
            TaxonomyKind::Status | TaxonomyKind::OperationType => None,
            TaxonomyKind::Category => Some(TaxonomyKind::OperationType),
            TaxonomyKind::Subcategory => Some(TaxonomyKind::Category),
        }
    }

    /// The column in this kind's table that points at the parent row.
    pub fn parent_column(self) -> Option<&'static str> {
        self.parent().map(TaxonomyKind::entry_column)
    }

    /// The column in the `cash_flow` table that references this kind.
    pub fn entry_column(self) -> &'static str {
        match self {
            TaxonomyKind::Status => "status_id",
            TaxonomyKind::OperationType => "operation_type_id",
            TaxonomyKind::Category => "category_id",
            TaxonomyKind::Subcategory => "subcategory_id",
        }
    }

    /// The URL path segment for this kind.
    pub fn path_segment(self) -> &'static str {
        match self {
            TaxonomyKind::Status => "statuses",
            TaxonomyKind::OperationType => "operation_types",
            TaxonomyKind::Category => "categories",
            TaxonomyKind::Subcategory => "subcategories",
        }
    }

    /// Title case name of a single item, e.g. "Operation Type".
    pub fn singular(self) -> &'static str {
        match self {
            TaxonomyKind::Status => "Status",
            TaxonomyKind::OperationType => "Operation Type",
            TaxonomyKind::Category => "Category",
            TaxonomyKind::Subcategory => "Subcategory",
        }
    }

    /// Title case name of many items, e.g. "Categories".
    pub fn plural(self) -> &'static str {
        match self {
            TaxonomyKind::Status => "Statuses",
            TaxonomyKind::OperationType => "Operation Types",
            TaxonomyKind::Category => "Categories",
            TaxonomyKind::Subcategory => "Subcategories",
        }
    }

    /// Lower case name of a single item for use in sentences.
    pub fn noun(self) -> &'static str {
        match self {
            TaxonomyKind::Status => "status",
            TaxonomyKind::OperationType => "operation type",
            TaxonomyKind::Category => "category",
            TaxonomyKind::Subcategory => "subcategory",
        }
    }

    /// Fill in the `{kind}` parameter of `endpoint_path`, followed by the
    /// `{item_id}` parameter if `item_id` is given.
    pub fn format_endpoint(self, endpoint_path: &str, item_id: Option<TaxonomyId>) -> String {
        let path = format_endpoint(endpoint_path, self.path_segment());

        match item_id {
            Some(item_id) => format_endpoint(&path, item_id),
            None => path,
        }
    }

    /// The URL of the list page for this kind.
    pub fn list_url(self) -> String {
        self.format_endpoint(endpoints::TAXONOMY_VIEW, None)
    }
}

impl Display for TaxonomyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.noun())
    }
}

/// A validated, non-empty name of at most [MAX_NAME_LENGTH] characters.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TaxonomyName(String);

impl TaxonomyName {
    /// Create a name, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [Error::EmptyName] for blank names and [Error::NameTooLong]
    /// for names longer than [MAX_NAME_LENGTH] characters.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            Err(Error::EmptyName)
        } else if name.chars().count() > MAX_NAME_LENGTH {
            Err(Error::NameTooLong(MAX_NAME_LENGTH))
        } else {
            Ok(Self(name.to_owned()))
        }
    }

    /// Create a name without validation.
    ///
    /// The caller should ensure that the string is not empty.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_owned())
    }
}

impl AsRef<str> for TaxonomyName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for TaxonomyName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A stored status, operation type, category or subcategory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxonomyItem {
    pub id: TaxonomyId,
    pub kind: TaxonomyKind,
    pub name: TaxonomyName,
    /// Set for categories and subcategories only.
    pub parent_id: Option<TaxonomyId>,
    pub description: Option<String>,
}

/// The fields needed to create or update a taxonomy row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTaxonomyItem {
    pub name: TaxonomyName,
    pub parent_id: Option<TaxonomyId>,
    pub description: Option<String>,
}

impl NewTaxonomyItem {
    /// A row without a parent or description.
    pub fn new(name: TaxonomyName) -> Self {
        Self {
            name,
            parent_id: None,
            description: None,
        }
    }

    /// Set the parent row.
    pub fn parent(mut self, parent_id: TaxonomyId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Set the description, treating blank text as no description.
    pub fn description(mut self, description: &str) -> Self {
        let description = description.trim();
        self.description = (!description.is_empty()).then(|| description.to_owned());
        self
    }
}

/// An `{id, name}` pair used to fill select inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Choice {
    pub id: TaxonomyId,
    pub name: String,
}

/// Form data for taxonomy creation and editing.
///
/// `parent_id` is kept as text so that an empty select can be reported as
/// a missing parent instead of a rejected request.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TaxonomyFormData {
    pub name: String,
    #[serde(default)]
    pub parent_id: String,
    #[serde(default)]
    pub description: String,
}
