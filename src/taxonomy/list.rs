//! Taxonomy listing pages.

use std::collections::HashMap;

use axum::{
    Extension,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use serde::Deserialize;

use crate::{
    Error, UserID,
    alert::{Alert, Notice},
    endpoints,
    html::{
        BADGE_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE,
        TABLE_ROW_STYLE, base, edit_delete_action_links,
    },
    navigation::NavBar,
    taxonomy::{
        TaxonomyItem, TaxonomyKind, count_entries_per_item, form::TaxonomyState, get_all_items,
        get_parent_choices,
    },
};

/// The query string of a taxonomy list page.
#[derive(Debug, Default, Deserialize)]
pub struct TaxonomyListQuery {
    pub notice: Option<String>,
}

/// A row with everything needed to render it.
struct ItemRow {
    item: TaxonomyItem,
    parent_name: Option<String>,
    entry_count: u32,
}

/// Render the list of the user's rows of `kind` with their entry counts.
pub async fn get_taxonomy_page(
    Path(kind): Path<TaxonomyKind>,
    State(state): State<TaxonomyState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<TaxonomyListQuery>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let items = get_all_items(kind, user_id, &connection).inspect_err(|error| {
        tracing::error!("Failed to retrieve {}: {error}", kind.plural())
    })?;

    let entries_per_item = count_entries_per_item(kind, user_id, &connection)
        .inspect_err(|error| tracing::error!("Could not count entries per {kind}: {error}"))?;

    let parent_names: HashMap<_, _> = get_parent_choices(kind, user_id, &connection)?
        .into_iter()
        .map(|choice| (choice.id, choice.name))
        .collect();

    let rows = items
        .into_iter()
        .map(|item| ItemRow {
            parent_name: item
                .parent_id
                .and_then(|parent_id| parent_names.get(&parent_id).cloned()),
            entry_count: entries_per_item.get(&item.id).copied().unwrap_or_default(),
            item,
        })
        .collect::<Vec<_>>();

    let notice = Notice::from_query(query.notice.as_deref());

    Ok(taxonomy_list_view(kind, &rows, notice).into_response())
}

fn item_row_view(kind: TaxonomyKind, row: &ItemRow) -> Markup {
    let item = &row.item;
    let edit_url = kind.format_endpoint(endpoints::EDIT_TAXONOMY_ITEM_VIEW, Some(item.id));
    let delete_url = kind.format_endpoint(endpoints::TAXONOMY_ITEM, Some(item.id));
    let confirm_message = match kind {
        TaxonomyKind::OperationType => format!(
            "Are you sure you want to delete '{}'? Its categories and subcategories will be deleted too.",
            item.name
        ),
        TaxonomyKind::Category => format!(
            "Are you sure you want to delete '{}'? Its subcategories will be deleted too.",
            item.name
        ),
        _ => format!("Are you sure you want to delete '{}'?", item.name),
    };

    html! {
        tr class=(TABLE_ROW_STYLE) data-item-id=(item.id)
        {
            td class=(TABLE_CELL_STYLE)
            {
                span class=(BADGE_STYLE) { (item.name) }
            }

            @if kind.parent().is_some() {
                td class=(TABLE_CELL_STYLE) { (row.parent_name.as_deref().unwrap_or_default()) }
            }

            td class=(TABLE_CELL_STYLE) { (item.description.as_deref().unwrap_or_default()) }

            td class=(TABLE_CELL_STYLE) data-entry-count { (row.entry_count) }

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

fn taxonomy_list_view(kind: TaxonomyKind, rows: &[ItemRow], notice: Option<Notice>) -> Markup {
    let list_url = kind.list_url();
    let new_item_url = kind.format_endpoint(endpoints::NEW_TAXONOMY_ITEM_VIEW, None);
    let nav_bar = NavBar::new(&list_url).into_html();
    let column_count = if kind.parent().is_some() { 5 } else { 4 };

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
                    h1 class="text-xl font-bold" { (kind.plural()) }

                    a href=(new_item_url) class=(LINK_STYLE) { "Create " (kind.singular()) }
                }

                section class="overflow-x-auto dark:bg-gray-800 lg:max-w-5xl lg:w-full lg:mx-auto"
                {
                    table class="w-full text-sm text-left rtl:text-right
                        text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Name" }

                                @if let Some(parent_kind) = kind.parent() {
                                    th scope="col" class=(TABLE_CELL_STYLE) { (parent_kind.singular()) }
                                }

                                th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Entries" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for row in rows {
                                (item_row_view(kind, row))
                            }

                            @if rows.is_empty() {
                                tr
                                {
                                    td
                                        colspan=(column_count)
                                        class="px-6 py-4 text-center text-gray-500 dark:text-gray-400"
                                    {
                                        "Nothing here yet. "
                                        a href=(new_item_url) class=(LINK_STYLE)
                                        {
                                            "Create your first " (kind.noun())
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    };

    base(kind.plural(), &[], &content)
}

#[cfg(test)]
mod taxonomy_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, Query, State},
    };
    use scraper::{Html, Selector};

    use crate::{
        taxonomy::{
            TaxonomyKind,
            form::TaxonomyState,
            list::{TaxonomyListQuery, get_taxonomy_page},
        },
        test_utils::{
            assert_content_type, assert_status_ok, assert_valid_html, create_test_entry,
            create_test_taxonomy, create_test_user, open_test_db, parse_html_document,
        },
    };

    fn cell_texts(document: &Html, selector: &str) -> Vec<String> {
        document
            .select(&Selector::parse(selector).unwrap())
            .map(|cell| cell.text().collect::<String>().trim().to_owned())
            .collect()
    }

    #[tokio::test]
    async fn lists_rows_with_parent_and_entry_count() {
        let connection = open_test_db();
        let owner = create_test_user(&connection, "test@example.com");
        let other = create_test_user(&connection, "other@example.com");
        let taxonomy = create_test_taxonomy(&connection, owner);
        create_test_taxonomy(&connection, other);
        create_test_entry(&connection, owner, &taxonomy, "1");
        create_test_entry(&connection, owner, &taxonomy, "2");
        let state = TaxonomyState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = get_taxonomy_page(
            Path(TaxonomyKind::Subcategory),
            State(state),
            Extension(owner),
            Query(TaxonomyListQuery::default()),
        )
        .await
        .unwrap();

        assert_status_ok(&response);
        assert_content_type(&response, "text/html; charset=utf-8");
        let document = parse_html_document(response).await;
        assert_valid_html(&document);
        assert_eq!(
            cell_texts(&document, "tr[data-item-id] td:first-child"),
            ["Supermarket"]
        );
        assert_eq!(
            cell_texts(&document, "tr[data-item-id] td:nth-child(2)"),
            ["Groceries (Expense)"]
        );
        assert_eq!(cell_texts(&document, "td[data-entry-count]"), ["2"]);
    }

    #[tokio::test]
    async fn shows_notice() {
        let connection = open_test_db();
        let owner = create_test_user(&connection, "test@example.com");
        let state = TaxonomyState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = get_taxonomy_page(
            Path(TaxonomyKind::Status),
            State(state),
            Extension(owner),
            Query(TaxonomyListQuery {
                notice: Some("item-updated".to_owned()),
            }),
        )
        .await
        .unwrap();

        let document = parse_html_document(response).await;
        assert_eq!(cell_texts(&document, "[role=alert] p"), ["Item updated"]);
    }
}
