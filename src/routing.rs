//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router, middleware,
    response::Redirect,
    routing::{get, post, put},
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    auth::{
        auth_guard, auth_guard_hx, get_log_in_page, get_log_out, get_register_page, post_log_in,
        register_user,
    },
    cash_flow::{
        create_entry_endpoint, delete_entry_endpoint, get_cash_flow_page, get_categories,
        get_edit_entry_page, get_new_entry_page, get_subcategories, update_entry_endpoint,
    },
    endpoints,
    internal_server_error::get_internal_server_error_page,
    not_found::get_404_not_found,
    taxonomy::{
        create_taxonomy_item_endpoint, delete_taxonomy_item_endpoint, get_edit_taxonomy_item_page,
        get_new_taxonomy_item_page, get_taxonomy_page, update_taxonomy_item_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    // The lookup endpoints check the auth cookie themselves and answer
    // unauthenticated requests with an empty list instead of a redirect.
    let unprotected_routes = Router::new()
        .route(endpoints::LOG_IN_VIEW, get(get_log_in_page))
        .route(endpoints::LOG_IN_API, post(post_log_in))
        .route(endpoints::LOG_OUT, get(get_log_out))
        .route(endpoints::REGISTER_VIEW, get(get_register_page))
        .route(endpoints::USERS, post(register_user))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        )
        .route(endpoints::LOOKUP_CATEGORIES, get(get_categories))
        .route(endpoints::LOOKUP_SUBCATEGORIES, get(get_subcategories));

    let protected_routes = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::CASH_FLOW_VIEW, get(get_cash_flow_page))
        .route(endpoints::NEW_ENTRY_VIEW, get(get_new_entry_page))
        .route(endpoints::EDIT_ENTRY_VIEW, get(get_edit_entry_page))
        .route(endpoints::TAXONOMY_VIEW, get(get_taxonomy_page))
        .route(
            endpoints::NEW_TAXONOMY_ITEM_VIEW,
            get(get_new_taxonomy_item_page),
        )
        .route(
            endpoints::EDIT_TAXONOMY_ITEM_VIEW,
            get(get_edit_taxonomy_item_page),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    // These POST/PUT/DELETE routes need to use the HX-REDIRECT header for auth redirects to work properly for HTMX requests.
    let protected_routes = protected_routes.merge(
        Router::new()
            .route(endpoints::CASH_FLOW_API, post(create_entry_endpoint))
            .route(
                endpoints::CASH_FLOW_ENTRY,
                put(update_entry_endpoint).delete(delete_entry_endpoint),
            )
            .route(endpoints::TAXONOMY_API, post(create_taxonomy_item_endpoint))
            .route(
                endpoints::TAXONOMY_ITEM,
                put(update_taxonomy_item_endpoint)
                    .delete(delete_taxonomy_item_endpoint),
            )
            .layer(middleware::from_fn_with_state(state.clone(), auth_guard_hx)),
    );

    protected_routes
        .merge(unprotected_routes)
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The root path '/' redirects to the cash-flow page.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::CASH_FLOW_VIEW)
}

#[cfg(test)]
mod root_route_tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use crate::{endpoints, routing::get_index_page};

    #[tokio::test]
    async fn root_redirects_to_cash_flow() {
        let response = get_index_page().await.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let location = response.headers().get("location").unwrap();
        assert_eq!(location, endpoints::CASH_FLOW_VIEW);
    }
}

#[cfg(test)]
mod router_tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use rusqlite::Connection;

    use crate::{AppState, PaginationConfig, build_router, endpoints};

    fn get_test_server() -> TestServer {
        let state = AppState::new(
            Connection::open_in_memory().unwrap(),
            "router test secret",
            "Etc/UTC",
            PaginationConfig::default(),
        )
        .unwrap();

        TestServer::new(build_router(state))
    }

    #[tokio::test]
    async fn pages_redirect_to_log_in_without_cookie() {
        let server = get_test_server();

        let response = server.get(endpoints::CASH_FLOW_VIEW).await;

        response.assert_status(StatusCode::SEE_OTHER);
        let location = response.header("location");
        assert!(
            location.to_str().unwrap().starts_with(endpoints::LOG_IN_VIEW),
            "want redirect to log in page, got {location:?}"
        );
    }

    #[tokio::test]
    async fn api_routes_use_hx_redirect_without_cookie() {
        let server = get_test_server();

        let response = server.delete("/api/taxonomy/statuses/1").await;

        assert!(response.headers().get("hx-redirect").is_some());
    }

    #[tokio::test]
    async fn lookups_are_empty_without_cookie() {
        let server = get_test_server();

        let response = server
            .get(endpoints::LOOKUP_CATEGORIES)
            .add_query_param("operation_type_id", 1)
            .await;

        response.assert_status_ok();
        response.assert_json(&serde_json::json!([]));
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let server = get_test_server();

        let response = server.get("/does/not/exist").await;

        response.assert_status_not_found();
    }
}
