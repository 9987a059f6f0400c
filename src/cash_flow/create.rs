//! The new entry page and the endpoint that stores a new entry.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use rusqlite::Connection;
use time::OffsetDateTime;

use crate::{
    AppState, Error, UserID,
    alert::Notice,
    cash_flow::{
        create_entry,
        form::{
            CheckedForm, EntryFormData, EntryFormOptions, EntryFormState, FormAction, check_form,
            entry_form_view, entry_page_view, invalid_form_response,
        },
    },
    endpoints,
    html::FieldErrors,
    timezone::get_local_offset,
};

/// The state needed for the new entry page.
#[derive(Debug, Clone)]
pub struct NewEntryPageState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for NewEntryPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the page for recording a new entry, dated today.
pub async fn get_new_entry_page(
    State(state): State<NewEntryPageState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let local_timezone = get_local_offset(&state.local_timezone).ok_or_else(|| {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        Error::InvalidTimezoneError(state.local_timezone.clone())
    })?;

    let today = OffsetDateTime::now_utc().to_offset(local_timezone).date();
    let values = EntryFormData::dated(today);

    let options = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        EntryFormOptions::load(&values, user_id, &connection).inspect_err(|error| {
            tracing::error!("Failed to load options for the new entry page: {error}")
        })?
    };

    let form = entry_form_view(
        FormAction::Create,
        endpoints::CASH_FLOW_API,
        &values,
        &options,
        &FieldErrors::new(),
    );

    Ok(entry_page_view("New Entry", endpoints::NEW_ENTRY_VIEW, &form).into_response())
}

/// Store a new entry and redirect to the cash-flow page.
///
/// Invalid input re-renders the form with an error next to each bad field.
pub async fn create_entry_endpoint(
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

    let invalid = |errors: &FieldErrors| {
        invalid_form_response(
            FormAction::Create,
            endpoints::CASH_FLOW_API,
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
            tracing::error!("Could not check the new entry: {error}");
            return error.into_alert_response();
        }
    };

    match create_entry(builder, user_id, &connection) {
        Ok(entry) => {
            tracing::debug!("Created entry {} for user {user_id}", entry.id);

            (
                HxRedirect(Notice::EntryCreated.append_to(endpoints::CASH_FLOW_VIEW)),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => match error.field() {
            Some(field) => invalid(&FieldErrors::from([(field, error.field_message())])),
            None => {
                tracing::error!("An unexpected error occurred while creating an entry: {error}");
                error.into_alert_response()
            }
        },
    }
}


#[cfg(test)]
mod create_entry_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, Form, extract::State, http::StatusCode};
    use scraper::Selector;

    use crate::{
        cash_flow::{
            count_entries,
            create::create_entry_endpoint,
            form::{EntryFormData, EntryFormState, FORM_ERROR_SUMMARY},
        },
        test_utils::{
            assert_form_error_message, assert_hx_redirect, assert_status_ok, assert_valid_html,
            create_test_taxonomy, create_test_user, must_get_form, open_test_db,
            parse_html_fragment,
        },
    };

    #[tokio::test]
    async fn valid_form_creates_entry_and_redirects() {
        let connection = open_test_db();
        let owner = create_test_user(&connection, "test@example.com");
        let taxonomy = create_test_taxonomy(&connection, owner);
        let state = EntryFormState {
            db_connection: Arc::new(Mutex::new(connection)),
        };
        let form = EntryFormData {
            date: "2025-03-14".to_owned(),
            status_id: taxonomy.status.to_string(),
            operation_type_id: taxonomy.operation_type.to_string(),
            category_id: taxonomy.category.to_string(),
            subcategory_id: taxonomy.subcategory.to_string(),
            amount: "42.50".to_owned(),
            comment: String::new(),
        };

        let response = create_entry_endpoint(State(state.clone()), Extension(owner), Form(form))
            .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, "/cash_flow?notice=entry-created");
        let connection = state.db_connection.lock().unwrap();
        assert_eq!(count_entries(owner, &connection), Ok(1));
    }

    #[tokio::test]
    async fn invalid_form_is_rendered_with_errors() {
        let connection = open_test_db();
        let owner = create_test_user(&connection, "test@example.com");
        let taxonomy = create_test_taxonomy(&connection, owner);
        let state = EntryFormState {
            db_connection: Arc::new(Mutex::new(connection)),
        };
        let form = EntryFormData {
            date: "2025-03-14".to_owned(),
            operation_type_id: taxonomy.operation_type.to_string(),
            amount: "1.234".to_owned(),
            ..Default::default()
        };

        let response = create_entry_endpoint(State(state.clone()), Extension(owner), Form(form))
            .await;

        assert_status_ok(&response);
        let html = parse_html_fragment(response).await;
        assert_valid_html(&html);
        let form = must_get_form(&html);
        assert_form_error_message(&form, FORM_ERROR_SUMMARY);

        let amount_error = form
            .select(&Selector::parse("p[data-field-error=amount]").unwrap())
            .next()
            .expect("No amount error")
            .text()
            .collect::<String>();
        assert_eq!(amount_error, "Amount cannot have more than 2 decimal places.");

        let category_options = form
            .select(&Selector::parse("select[name=category_id] option").unwrap())
            .count();
        assert_eq!(category_options, 2, "categories should follow the operation type");

        let connection = state.db_connection.lock().unwrap();
        assert_eq!(count_entries(owner, &connection), Ok(0));
    }
}
