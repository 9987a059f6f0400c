//! Taxonomy editing page and endpoint.

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
        TaxonomyFormData, TaxonomyId, TaxonomyKind,
        form::{
            FormAction, TaxonomyState, invalid_form_response, parse_form, taxonomy_form_view,
            taxonomy_page_view,
        },
        get_item, get_parent_choices, update_item,
    },
};

/// Render the edit page for one of the user's rows.
pub async fn get_edit_taxonomy_item_page(
    Path((kind, item_id)): Path<(TaxonomyKind, TaxonomyId)>,
    State(state): State<TaxonomyState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let item = get_item(kind, item_id, user_id, &connection).inspect_err(|error| {
        if *error != Error::NotFound {
            tracing::error!("Failed to retrieve {} {item_id}: {error}", kind.noun());
        }
    })?;

    let parent_choices = get_parent_choices(kind, user_id, &connection)?;
    let form = taxonomy_form_view(
        kind,
        FormAction::Update,
        &kind.format_endpoint(endpoints::TAXONOMY_ITEM, Some(item_id)),
        &TaxonomyFormData::from_item(&item),
        &parent_choices,
        &FieldErrors::new(),
    );

    Ok(taxonomy_page_view(
        &format!("Edit {}", kind.singular()),
        &kind.format_endpoint(endpoints::EDIT_TAXONOMY_ITEM_VIEW, Some(item_id)),
        &form,
    )
    .into_response())
}

/// Handle the edit form for one of the user's rows.
pub async fn update_taxonomy_item_endpoint(
    Path((kind, item_id)): Path<(TaxonomyKind, TaxonomyId)>,
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

    let update_endpoint = kind.format_endpoint(endpoints::TAXONOMY_ITEM, Some(item_id));
    let invalid = |errors: &FieldErrors| {
        invalid_form_response(
            kind,
            FormAction::Update,
            &update_endpoint,
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

    match update_item(kind, item_id, item, user_id, &connection) {
        Ok(()) => (
            HxRedirect(Notice::ItemUpdated.append_to(&kind.list_url())),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error @ (Error::UpdateMissingTaxonomyItem(_) | Error::ReparentInUse(_))) => {
            error.into_alert_response()
        }
        Err(error) => match error.field() {
            Some(field) => invalid(&FieldErrors::from([(field, error.field_message())])),
            None => {
                tracing::error!(
                    "An unexpected error occurred while updating {} {item_id}: {error}",
                    kind.noun()
                );
                error.into_alert_response()
            }
        },
    }
}
