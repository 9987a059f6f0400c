//! Entry deletion endpoint.

use axum::{
    Extension,
    extract::{Path, State},
    response::{IntoResponse, Response},
};

use crate::{
    Error, UserID,
    alert::Alert,
    cash_flow::{EntryId, core::delete_entry, form::EntryFormState},
};

/// Delete one of the user's entries. Returns a success alert or an error alert.
pub async fn delete_entry_endpoint(
    Path(entry_id): Path<EntryId>,
    State(state): State<EntryFormState>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_entry(entry_id, user_id, &connection) {
        Ok(_) => Alert::SuccessSimple {
            message: "Entry deleted successfully".to_owned(),
        }
        .into_response(),
        Err(Error::DeleteMissingEntry) => Error::DeleteMissingEntry.into_alert_response(),
        Err(error) => {
            tracing::error!("An unexpected error occurred while deleting entry {entry_id}: {error}");
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod delete_entry_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, State},
        http::StatusCode,
    };
    use scraper::{Html, Selector};

    use crate::{
        cash_flow::{count_entries, delete::delete_entry_endpoint, form::EntryFormState},
        test_utils::{
            assert_valid_html, create_test_entry, create_test_taxonomy, create_test_user,
            get_header, open_test_db, parse_html_fragment,
        },
    };

    #[tokio::test]
    async fn deletes_entry() {
        let connection = open_test_db();
        let owner = create_test_user(&connection, "test@example.com");
        let taxonomy = create_test_taxonomy(&connection, owner);
        let entry_id = create_test_entry(&connection, owner, &taxonomy, "3.00");
        let state = EntryFormState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response =
            delete_entry_endpoint(Path(entry_id), State(state.clone()), Extension(owner)).await;

        assert_eq!(response.status(), StatusCode::OK);
        let connection = state.db_connection.lock().unwrap();
        assert_eq!(count_entries(owner, &connection), Ok(0));
    }

    #[tokio::test]
    async fn other_users_entry_is_not_deleted() {
        let connection = open_test_db();
        let owner = create_test_user(&connection, "test@example.com");
        let other = create_test_user(&connection, "other@example.com");
        let taxonomy = create_test_taxonomy(&connection, owner);
        let entry_id = create_test_entry(&connection, owner, &taxonomy, "3.00");
        let state = EntryFormState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response =
            delete_entry_endpoint(Path(entry_id), State(state.clone()), Extension(other)).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            get_header(&response, "content-type"),
            "text/html; charset=utf-8"
        );
        let html = parse_html_fragment(response).await;
        assert_valid_html(&html);
        assert_error_content(&html, "Could not delete entry");
        let connection = state.db_connection.lock().unwrap();
        assert_eq!(count_entries(owner, &connection), Ok(1));
    }

    #[track_caller]
    fn assert_error_content(html: &Html, want_error_message: &str) {
        let p = Selector::parse("p").unwrap();
        let error_message = html
            .select(&p)
            .next()
            .expect("No error message found")
            .text()
            .collect::<Vec<_>>()
            .join("");

        assert_eq!(want_error_message, error_message.trim());
    }
}
