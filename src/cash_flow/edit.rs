//! The page for editing an entry and the endpoint that saves the changes.

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
    cash_flow::{
        EntryId,
        core::{get_entry, update_entry},
        form::{
            CheckedForm, EntryFormData, EntryFormOptions, EntryFormState, FormAction, check_form,
            entry_form_view, entry_page_view, invalid_form_response,
        },
    },
    endpoints::{self, format_endpoint},
    html::FieldErrors,
};

/// Render the edit page for one of the user's entries.
///
/// Entries that belong to someone else are reported as not found.
pub async fn get_edit_entry_page(
    Path(entry_id): Path<EntryId>,
    State(state): State<EntryFormState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let entry = get_entry(entry_id, user_id, &connection).inspect_err(|error| {
        if *error != Error::NotFound {
            tracing::error!("Failed to retrieve entry {entry_id}: {error}");
        }
    })?;

    let values = EntryFormData::from_entry(&entry);
    let options = EntryFormOptions::load(&values, user_id, &connection)?;
    let form = entry_form_view(
        FormAction::Update,
        &format_endpoint(endpoints::CASH_FLOW_ENTRY, entry_id),
        &values,
        &options,
        &FieldErrors::new(),
    );

    Ok(entry_page_view(
        "Edit Entry",
        &format_endpoint(endpoints::EDIT_ENTRY_VIEW, entry_id),
        &form,
    )
    .into_response())
}

/// Save changes to an entry and redirect to the cash-flow page.
pub async fn update_entry_endpoint(
    Path(entry_id): Path<EntryId>,
    State(state): State<EntryFormState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<EntryFormData>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let update_endpoint = format_endpoint(endpoints::CASH_FLOW_ENTRY, entry_id);
    let invalid = |errors: &FieldErrors| {
        invalid_form_response(
            FormAction::Update,
            &update_endpoint,
            &form,
            errors,
            user_id,
            &connection,
        )
    };

    let builder = match check_form(&form, user_id, &connection) {
        Ok(CheckedForm::Valid(builder)) => builder,
        Ok(CheckedForm::Invalid(errors)) => return invalid(&errors),
        Err(error) => {
            tracing::error!("Could not check the changes to entry {entry_id}: {error}");
            return error.into_alert_response();
        }
    };

    match update_entry(entry_id, builder, user_id, &connection) {
        Ok(_) => (
            HxRedirect(Notice::EntryUpdated.append_to(endpoints::CASH_FLOW_VIEW)),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(Error::UpdateMissingEntry) => Error::UpdateMissingEntry.into_alert_response(),
        Err(error) => match error.field() {
            Some(field) => invalid(&FieldErrors::from([(field, error.field_message())])),
            None => {
                tracing::error!(
                    "An unexpected error occurred while updating entry {entry_id}: {error}"
                );
                error.into_alert_response()
            }
        },
    }
}
