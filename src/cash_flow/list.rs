//! The cash-flow page: a filterable, paged table of the user's entries.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error, UserID,
    alert::{Alert, Notice},
    cash_flow::{
        form::parse_date,
        query::{EntryFilter, EntryPage, EntryRow, list_entries},
    },
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_SECONDARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, LINK_STYLE,
        PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base,
        edit_delete_action_links, format_currency,
    },
    navigation::NavBar,
    pagination::{PaginationConfig, create_pagination_indicators, pagination_view},
    taxonomy::{Choice, TaxonomyId, TaxonomyKind, get_choices},
};

/// The state needed for the cash-flow page.
#[derive(Debug, Clone)]
pub struct CashFlowPageState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
    /// How many entries to show per page.
    pub pagination_config: PaginationConfig,
}

impl FromRef<AppState> for CashFlowPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            pagination_config: state.pagination_config.clone(),
        }
    }
}

/// The query string of the cash-flow page.
///
/// Values are kept as text so that a malformed value is ignored rather than
/// rejecting the request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntryListQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub status: Option<String>,
    pub operation_type: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub page: Option<String>,
    pub notice: Option<String>,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn parse_id(value: &Option<String>) -> Option<TaxonomyId> {
    non_blank(value).and_then(|value| value.parse().ok())
}

impl EntryListQuery {
    /// The filter described by the query. Values that cannot be parsed are
    /// treated as absent.
    pub fn filter(&self) -> EntryFilter {
        EntryFilter {
            date_from: non_blank(&self.start_date).and_then(|date| parse_date(date).ok()),
            date_to: non_blank(&self.end_date).and_then(|date| parse_date(date).ok()),
            status_id: parse_id(&self.status),
            operation_type_id: parse_id(&self.operation_type),
            category_id: parse_id(&self.category),
            subcategory_id: parse_id(&self.subcategory),
        }
    }

    /// The requested page number, or `default_page` if missing or malformed.
    pub fn page(&self, default_page: u64) -> u64 {
        non_blank(&self.page)
            .and_then(|page| page.parse().ok())
            .filter(|page| *page > 0)
            .unwrap_or(default_page)
    }

    /// The URL of `page` with the same filters, dropping any notice.
    fn page_url(&self, page: u64) -> String {
        let params = [
            ("start_date", &self.start_date),
            ("end_date", &self.end_date),
            ("status", &self.status),
            ("operation_type", &self.operation_type),
            ("category", &self.category),
            ("subcategory", &self.subcategory),
        ]
        .into_iter()
        .filter_map(|(key, value)| non_blank(value).map(|value| (key, value.to_owned())))
        .chain(std::iter::once(("page", page.to_string())))
        .collect::<Vec<_>>();

        match serde_urlencoded::to_string(&params) {
            Ok(query) => format!("{}?{query}", endpoints::CASH_FLOW_VIEW),
            Err(error) => {
                tracing::error!("Could not encode the cash-flow page query: {error}");
                format!("{}?page={page}", endpoints::CASH_FLOW_VIEW)
            }
        }
    }
}

/// The options for the filter selects.
struct FilterOptions {
    statuses: Vec<Choice>,
    operation_types: Vec<Choice>,
    categories: Vec<Choice>,
    subcategories: Vec<Choice>,
}

impl FilterOptions {
    fn load(owner: UserID, connection: &Connection) -> Result<Self, Error> {
        Ok(Self {
            statuses: get_choices(TaxonomyKind::Status, owner, connection)?,
            operation_types: get_choices(TaxonomyKind::OperationType, owner, connection)?,
            categories: get_choices(TaxonomyKind::Category, owner, connection)?,
            subcategories: get_choices(TaxonomyKind::Subcategory, owner, connection)?,
        })
    }
}

/// Render the cash-flow page.
pub async fn get_cash_flow_page(
    State(state): State<CashFlowPageState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<EntryListQuery>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let config = &state.pagination_config;
    let filter = query.filter();
    let page = query.page(config.default_page);

    let entries = list_entries(user_id, &filter, page, config.page_size, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve entries: {error}"))?;

    let options = FilterOptions::load(user_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to load the filter options: {error}"))?;

    let notice = Notice::from_query(query.notice.as_deref());

    Ok(cash_flow_view(&query, &filter, &entries, &options, config, notice).into_response())
}

fn filter_select(
    name: &str,
    label: &str,
    choices: &[Choice],
    selected: Option<TaxonomyId>,
) -> Markup {
    html! {
        div
        {
            label for=(name) class=(FORM_LABEL_STYLE) { (label) }

            select id=(name) name=(name) class=(FORM_TEXT_INPUT_STYLE)
            {
                option value="" { "All" }

                @for choice in choices {
                    option value=(choice.id) selected[selected == Some(choice.id)] { (choice.name) }
                }
            }
        }
    }
}

fn filter_form_view(filter: &EntryFilter, options: &FilterOptions) -> Markup {
    let date_value = |date: Option<time::Date>| date.map(|date| date.to_string()).unwrap_or_default();

    html! {
        form
            method="get"
            action=(endpoints::CASH_FLOW_VIEW)
            class="grid grid-cols-1 gap-4 md:grid-cols-3 lg:grid-cols-6 items-end"
        {
            div
            {
                label for="start_date" class=(FORM_LABEL_STYLE) { "From" }
                input
                    id="start_date"
                    type="date"
                    name="start_date"
                    value=(date_value(filter.date_from))
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="end_date" class=(FORM_LABEL_STYLE) { "To" }
                input
                    id="end_date"
                    type="date"
                    name="end_date"
                    value=(date_value(filter.date_to))
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            (filter_select("status", "Status", &options.statuses, filter.status_id))
            (filter_select("operation_type", "Operation Type", &options.operation_types, filter.operation_type_id))
            (filter_select("category", "Category", &options.categories, filter.category_id))
            (filter_select("subcategory", "Subcategory", &options.subcategories, filter.subcategory_id))

            div class="flex gap-4 md:col-span-3 lg:col-span-6"
            {
                button type="submit" class=(BUTTON_SECONDARY_STYLE) { "Filter" }

                @if !filter.is_empty() {
                    a href=(endpoints::CASH_FLOW_VIEW) class=(LINK_STYLE) { "Clear" }
                }
            }
        }
    }
}

fn entry_row_view(row: &EntryRow) -> Markup {
    let edit_url = format_endpoint(endpoints::EDIT_ENTRY_VIEW, row.id);
    let delete_url = format_endpoint(endpoints::CASH_FLOW_ENTRY, row.id);
    let confirm_message = format!(
        "Are you sure you want to delete the entry for {} on {}?",
        format_currency(row.amount.as_decimal()),
        row.date
    );

    html! {
        tr class=(TABLE_ROW_STYLE) data-entry-id=(row.id)
        {
            td class=(TABLE_CELL_STYLE) { (row.date) }
            td class=(TABLE_CELL_STYLE) { (row.status) }
            td class=(TABLE_CELL_STYLE) { (row.operation_type) }
            td class=(TABLE_CELL_STYLE) { (row.category) }
            td class=(TABLE_CELL_STYLE) { (row.subcategory) }
            td class="px-6 py-4 text-right" { (format_currency(row.amount.as_decimal())) }
            td class=(TABLE_CELL_STYLE) { (row.comment) }
            td class=(TABLE_CELL_STYLE)
            {
                div class="flex gap-4"
                {
                    (edit_delete_action_links(
                        &edit_url,
                        &delete_url,
                        &confirm_message,
                        "closest tr",
                        "delete",
                    ))
                }
            }
        }
    }
}

fn cash_flow_view(
    query: &EntryListQuery,
    filter: &EntryFilter,
    entries: &EntryPage,
    options: &FilterOptions,
    config: &PaginationConfig,
    notice: Option<Notice>,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::CASH_FLOW_VIEW).into_html();
    let indicators =
        create_pagination_indicators(entries.page, entries.page_count, config.max_pages);

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4"
            {
                @if let Some(notice) = notice {
                    (Alert::SuccessSimple { message: notice.message().to_owned() }.into_html())
                }

                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Cash Flow" }

                    a href=(endpoints::NEW_ENTRY_VIEW) class=(LINK_STYLE) { "New Entry" }
                }

                (filter_form_view(filter, options))

                p class="text-sm text-gray-600 dark:text-gray-400" data-total=(entries.total)
                {
                    (entries.total) " matching entries"
                }

                section class="overflow-x-auto dark:bg-gray-800"
                {
                    table class="w-full text-sm text-left rtl:text-right
                        text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Status" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Operation Type" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Subcategory" }
                                th scope="col" class="px-6 py-4 text-right" { "Amount" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Comment" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for row in &entries.rows {
                                (entry_row_view(row))
                            }

                            @if entries.rows.is_empty() {
                                tr
                                {
                                    td
                                        colspan="8"
                                        class="px-6 py-4 text-center text-gray-500 dark:text-gray-400"
                                    {
                                        @if filter.is_empty() {
                                            "No entries yet. "
                                            a href=(endpoints::NEW_ENTRY_VIEW) class=(LINK_STYLE)
                                            {
                                                "Record your first entry"
                                            }
                                        } @else {
                                            "No entries match the filter."
                                        }
                                    }
                                }
                            }
                        }
                    }
                }

                @if entries.page_count > 1 {
                    (pagination_view(&indicators, |page| query.page_url(page)))
                }
            }
        }
    };

    base("Cash Flow", &[], &content)
}
