//! Statuses, operation types, categories and subcategories: the taxonomy
//! each user classifies their entries with.

mod create;
mod db;
mod delete;
mod domain;
mod edit;
mod form;
mod list;

pub use create::{create_taxonomy_item_endpoint, get_new_taxonomy_item_page};
pub use db::{
    count_entries_per_item, create_item, create_taxonomy_tables, delete_item, get_all_items,
    get_children, get_choices, get_item, get_parent_choices, update_item,
};
pub use delete::delete_taxonomy_item_endpoint;
pub use domain::{
    Choice, MAX_NAME_LENGTH, NewTaxonomyItem, TaxonomyFormData, TaxonomyId, TaxonomyItem,
    TaxonomyKind, TaxonomyName,
};
pub use edit::{get_edit_taxonomy_item_page, update_taxonomy_item_endpoint};
pub use list::get_taxonomy_page;
