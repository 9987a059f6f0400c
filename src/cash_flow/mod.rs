//! Cash-flow entries: storage, validation, the lookup endpoints that drive
//! the entry form, and the pages for listing, creating, editing and deleting
//! entries.

mod consistency;
mod core;
mod create;
mod delete;
mod edit;
mod form;
mod list;
mod lookup;
mod query;

pub use consistency::{
    DraftSelection, LinkField, ParentLink, Selection, check_links, link_mismatches,
    selection_errors, validate_selection,
};
pub use core::{
    Amount, CashFlowEntry, CashFlowEntryBuilder, EntryField, EntryId, count_entries,
    create_cash_flow_table, create_entry, delete_entry, get_entry, update_entry,
};
pub use create::{create_entry_endpoint, get_new_entry_page};
pub use delete::delete_entry_endpoint;
pub use edit::{get_edit_entry_page, update_entry_endpoint};
pub use list::get_cash_flow_page;
pub use lookup::{get_categories, get_subcategories, list_categories, list_subcategories};
pub use query::{EntryFilter, EntryPage, EntryRow, list_entries};
