//! Taxonomy creation page and endpoint.

use axum::{
    Extension, Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;

use crate::{
    Error, UserID,
    alert::Notice,
    endpoints,
    html::FieldErrors,
    taxonomy::{
        TaxonomyFormData, TaxonomyKind, create_item,
        form::{
            FormAction, TaxonomyState, invalid_form_response, parse_form, taxonomy_form_view,
            taxonomy_page_view,
        },
        get_parent_choices,
    },
};

/// Render the page for creating a row of `kind`.
pub async fn get_new_taxonomy_item_page(
    Path(kind): Path<TaxonomyKind>,
    State(state): State<TaxonomyState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let parent_choices = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        get_parent_choices(kind, user_id, &connection).inspect_err(|error| {
            tracing::error!("Failed to retrieve the {} parent options: {error}", kind.noun())
        })?
    };

    let form = taxonomy_form_view(
        kind,
        FormAction::Create,
        &kind.format_endpoint(endpoints::TAXONOMY_API, None),
        &TaxonomyFormData::default(),
        &parent_choices,
        &FieldErrors::new(),
    );

    Ok(taxonomy_page_view(
        &format!("New {}", kind.singular()),
        &kind.format_endpoint(endpoints::NEW_TAXONOMY_ITEM_VIEW, None),
        &form,
    )
    .into_response())
}

/// Handle the creation form for `kind`.
pub async fn create_taxonomy_item_endpoint(
    Path(kind): Path<TaxonomyKind>,
    State(state): State<TaxonomyState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<TaxonomyFormData>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let create_endpoint = kind.format_endpoint(endpoints::TAXONOMY_API, None);
    let invalid = |errors: &FieldErrors| {
        invalid_form_response(
            kind,
            FormAction::Create,
            &create_endpoint,
            &form,
            errors,
            user_id,
            &connection,
        )
    };

    let item = match parse_form(kind, &form) {
        Ok(item) => item,
        Err(errors) => return invalid(&errors),
    };

    match create_item(kind, item, user_id, &connection) {
        Ok(item) => {
            tracing::debug!("Created {} {} for user {user_id}", kind.noun(), item.id);

            (
                HxRedirect(Notice::ItemCreated.append_to(&kind.list_url())),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => match error.field() {
            Some(field) => invalid(&FieldErrors::from([(field, error.field_message())])),
            None => {
                tracing::error!(
                    "An unexpected error occurred while creating a {}: {error}",
                    kind.noun()
                );
                error.into_alert_response()
            }
        },
    }
}

#[cfg(test)]
mod new_taxonomy_item_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, State},
    };
    use scraper::Selector;

    use crate::{
        taxonomy::{TaxonomyKind, create::get_new_taxonomy_item_page, form::TaxonomyState},
        test_utils::{
            assert_form_input, assert_form_submit_button_with_text, assert_hx_endpoint,
            assert_status_ok, assert_valid_html, create_test_taxonomy, create_test_user,
            must_get_form, open_test_db, parse_html_document,
        },
    };

    #[tokio::test]
    async fn status_form_has_no_parent() {
        let connection = open_test_db();
        let owner = create_test_user(&connection, "test@example.com");
        let state = TaxonomyState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response =
            get_new_taxonomy_item_page(Path(TaxonomyKind::Status), State(state), Extension(owner))
                .await
                .unwrap();

        assert_status_ok(&response);
        let document = parse_html_document(response).await;
        assert_valid_html(&document);
        let form = must_get_form(&document);
        assert_hx_endpoint(&form, "/api/taxonomy/statuses", "hx-post");
        assert_form_input(&form, "name", "text");
        assert_form_submit_button_with_text(&form, "Create Status");
        assert!(
            form.select(&Selector::parse("select").unwrap())
                .next()
                .is_none()
        );
    }

    #[tokio::test]
    async fn subcategory_form_lists_categories_with_operation_type() {
        let connection = open_test_db();
        let owner = create_test_user(&connection, "test@example.com");
        create_test_taxonomy(&connection, owner);
        let state = TaxonomyState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = get_new_taxonomy_item_page(
            Path(TaxonomyKind::Subcategory),
            State(state),
            Extension(owner),
        )
        .await
        .unwrap();

        let document = parse_html_document(response).await;
        let form = must_get_form(&document);
        let options = form
            .select(&Selector::parse("select[name=parent_id] option").unwrap())
            .map(|option| option.text().collect::<String>())
            .collect::<Vec<_>>();
        assert_eq!(options, ["Select a category", "Groceries (Expense)"]);
    }
}
