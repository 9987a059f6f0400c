//! Taxonomy deletion endpoint.

use axum::{
    Extension,
    extract::{Path, State},
    response::{IntoResponse, Response},
};

use crate::{
    Error, UserID,
    alert::Alert,
    taxonomy::{TaxonomyId, TaxonomyKind, delete_item, form::TaxonomyState},
};

/// Delete one of the user's rows along with its children.
///
/// Responds with 409 Conflict if any entry uses the row or one of its children.
pub async fn delete_taxonomy_item_endpoint(
    Path((kind, item_id)): Path<(TaxonomyKind, TaxonomyId)>,
    State(state): State<TaxonomyState>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_item(kind, item_id, user_id, &connection) {
        Ok(()) => Alert::SuccessSimple {
            message: format!("{} deleted successfully", kind.singular()),
        }
        .into_response(),
        Err(error @ (Error::DeleteMissingTaxonomyItem(_) | Error::ProtectedReference(_))) => {
            error.into_alert_response()
        }
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while deleting {} {item_id}: {error}",
                kind.noun()
            );
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod delete_taxonomy_item_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, State},
        http::StatusCode,
    };
    use scraper::{Html, Selector};

    use crate::{
        taxonomy::{
            TaxonomyKind, delete::delete_taxonomy_item_endpoint, form::TaxonomyState,
            get_all_items,
        },
        test_utils::{
            assert_valid_html, create_test_entry, create_test_taxonomy, create_test_user,
            open_test_db, parse_html_fragment,
        },
    };

    #[track_caller]
    fn assert_error_content(html: &Html, want_error_message: &str) {
        let error_message = html
            .select(&Selector::parse("p").unwrap())
            .next()
            .expect("No error message found")
            .text()
            .collect::<Vec<_>>()
            .join("");

        assert_eq!(want_error_message, error_message.trim());
    }

    #[tokio::test]
    async fn deletes_unused_operation_type_with_children() {
        let connection = open_test_db();
        let owner = create_test_user(&connection, "test@example.com");
        let taxonomy = create_test_taxonomy(&connection, owner);
        let state = TaxonomyState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = delete_taxonomy_item_endpoint(
            Path((TaxonomyKind::OperationType, taxonomy.operation_type)),
            State(state.clone()),
            Extension(owner),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let connection = state.db_connection.lock().unwrap();
        for kind in [
            TaxonomyKind::OperationType,
            TaxonomyKind::Category,
            TaxonomyKind::Subcategory,
        ] {
            assert!(
                get_all_items(kind, owner, &connection).unwrap().is_empty(),
                "want no {kind} rows left"
            );
        }
    }

    #[tokio::test]
    async fn used_category_is_a_conflict() {
        let connection = open_test_db();
        let owner = create_test_user(&connection, "test@example.com");
        let taxonomy = create_test_taxonomy(&connection, owner);
        create_test_entry(&connection, owner, &taxonomy, "4.20");
        let state = TaxonomyState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = delete_taxonomy_item_endpoint(
            Path((TaxonomyKind::Category, taxonomy.category)),
            State(state.clone()),
            Extension(owner),
        )
        .await;

        assert_eq!(response.status(), StatusCode::CONFLICT);
        let html = parse_html_fragment(response).await;
        assert_valid_html(&html);
        assert_error_content(&html, "Could not delete category");
        let connection = state.db_connection.lock().unwrap();
        assert_eq!(
            get_all_items(TaxonomyKind::Subcategory, owner, &connection)
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn other_users_row_is_not_found() {
        let connection = open_test_db();
        let owner = create_test_user(&connection, "test@example.com");
        let other = create_test_user(&connection, "other@example.com");
        let theirs = create_test_taxonomy(&connection, other);
        let state = TaxonomyState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = delete_taxonomy_item_endpoint(
            Path((TaxonomyKind::Status, theirs.status)),
            State(state),
            Extension(owner),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
