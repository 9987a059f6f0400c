//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/cash_flow/{entry_id}', use [format_endpoint].
//! Taxonomy endpoints additionally take the kind of item, see
//! [crate::taxonomy::TaxonomyKind::format_endpoint].

/// The root route which redirects to the cash-flow page or log in page.
pub const ROOT: &str = "/";
/// The page for displaying and filtering a user's cash-flow entries.
pub const CASH_FLOW_VIEW: &str = "/cash_flow";
/// The page for creating a new cash-flow entry.
pub const NEW_ENTRY_VIEW: &str = "/cash_flow/new";
/// The page for editing an existing cash-flow entry.
pub const EDIT_ENTRY_VIEW: &str = "/cash_flow/{entry_id}/edit";
/// The page for listing the items of one taxonomy kind.
pub const TAXONOMY_VIEW: &str = "/taxonomy/{kind}";
/// The page for creating a new taxonomy item.
pub const NEW_TAXONOMY_ITEM_VIEW: &str = "/taxonomy/{kind}/new";
/// The page for editing an existing taxonomy item.
pub const EDIT_TAXONOMY_ITEM_VIEW: &str = "/taxonomy/{kind}/{item_id}/edit";
/// The route for getting the registration page.
pub const REGISTER_VIEW: &str = "/register";
/// The route for getting the log in page.
pub const LOG_IN_VIEW: &str = "/log_in";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";
/// The route for static files.
pub const STATIC: &str = "/static";

/// The route for logging in a user.
pub const LOG_IN_API: &str = "/api/log_in";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/api/log_out";
/// The route to access users.
pub const USERS: &str = "/api/users";
/// The route to create cash-flow entries.
pub const CASH_FLOW_API: &str = "/api/cash_flow";
/// The route to update or delete a single cash-flow entry.
pub const CASH_FLOW_ENTRY: &str = "/api/cash_flow/{entry_id}";
/// The route to create taxonomy items.
pub const TAXONOMY_API: &str = "/api/taxonomy/{kind}";
/// The route to update or delete a single taxonomy item.
pub const TAXONOMY_ITEM: &str = "/api/taxonomy/{kind}/{item_id}";
/// The route listing the categories of an operation type.
pub const LOOKUP_CATEGORIES: &str = "/api/lookup/categories";
/// The route listing the subcategories of a category.
pub const LOOKUP_SUBCATEGORIES: &str = "/api/lookup/subcategories";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/users/{user_id}', '{user_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters.
/// Only the first parameter is replaced.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: impl std::fmt::Display) -> String {
    let mut param_start = None;
    let mut param_end = None;

    for (i, c) in endpoint_path.chars().enumerate() {
        if c == '{' {
            param_start = Some(i);
        } else if param_start.is_some() && c == '}' {
            param_end = Some(i + 1);
            break;
        }
    }

    let param_start = match param_start {
        Some(start) => start,
        None => return endpoint_path.to_string(),
    };

    let param_end = param_end.unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}

// These tests are here so that we know when we call `Uri::from_shared` it will not panic.
#[cfg(test)]
mod endpoints_tests {
    use axum::http::Uri;

    use crate::endpoints;

    use super::format_endpoint;

    fn assert_endpoint_is_valid_uri(uri: &str) {
        assert!(uri.parse::<Uri>().is_ok());
    }

    #[test]
    fn endpoints_are_valid_uris() {
        assert_endpoint_is_valid_uri(endpoints::ROOT);
        assert_endpoint_is_valid_uri(endpoints::CASH_FLOW_VIEW);
        assert_endpoint_is_valid_uri(endpoints::NEW_ENTRY_VIEW);
        assert_endpoint_is_valid_uri(endpoints::EDIT_ENTRY_VIEW);
        assert_endpoint_is_valid_uri(endpoints::TAXONOMY_VIEW);
        assert_endpoint_is_valid_uri(endpoints::NEW_TAXONOMY_ITEM_VIEW);
        assert_endpoint_is_valid_uri(endpoints::EDIT_TAXONOMY_ITEM_VIEW);
        assert_endpoint_is_valid_uri(endpoints::REGISTER_VIEW);
        assert_endpoint_is_valid_uri(endpoints::LOG_IN_VIEW);
        assert_endpoint_is_valid_uri(endpoints::INTERNAL_ERROR_VIEW);
        assert_endpoint_is_valid_uri(endpoints::STATIC);

        assert_endpoint_is_valid_uri(endpoints::LOG_IN_API);
        assert_endpoint_is_valid_uri(endpoints::LOG_OUT);
        assert_endpoint_is_valid_uri(endpoints::USERS);
        assert_endpoint_is_valid_uri(endpoints::CASH_FLOW_API);
        assert_endpoint_is_valid_uri(endpoints::CASH_FLOW_ENTRY);
        assert_endpoint_is_valid_uri(endpoints::TAXONOMY_API);
        assert_endpoint_is_valid_uri(endpoints::TAXONOMY_ITEM);
        assert_endpoint_is_valid_uri(endpoints::LOOKUP_CATEGORIES);
        assert_endpoint_is_valid_uri(endpoints::LOOKUP_SUBCATEGORIES);
    }

    #[test]
    fn produces_valid_uri() {
        let formatted_path = format_endpoint("/hello/{world_id}", 1);

        assert_eq!(formatted_path, "/hello/1");
        assert!(formatted_path.parse::<Uri>().is_ok());

        // Parameter with single word should also work.
        let formatted_path = format_endpoint("/hello/{world}", 1);

        assert_eq!(formatted_path, "/hello/1");
        assert!(formatted_path.parse::<Uri>().is_ok());
    }

    #[test]
    fn returns_original_path_with_no_parameter() {
        let formatted_path = format_endpoint("/hello/world", 1);

        assert_eq!(formatted_path, "/hello/world");
        assert!(formatted_path.parse::<Uri>().is_ok());
    }

    #[test]
    fn parameter_in_middle() {
        let formatted_path = format_endpoint("/hello/{world}/bye", 1);

        assert_eq!(formatted_path, "/hello/1/bye");
        assert!(formatted_path.parse::<Uri>().is_ok());
    }

    #[test]
    fn replaces_parameters_one_at_a_time() {
        let formatted_path = format_endpoint(endpoints::EDIT_TAXONOMY_ITEM_VIEW, "categories");
        let formatted_path = format_endpoint(&formatted_path, 7);

        assert_eq!(formatted_path, "/taxonomy/categories/7/edit");
        assert!(formatted_path.parse::<Uri>().is_ok());
    }
}
