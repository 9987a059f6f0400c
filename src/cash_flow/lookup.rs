//! JSON endpoints that fill the dependent category and subcategory selects.
//!
//! These endpoints never fail: anything other than a logged in user asking
//! about one of their own rows gets an empty list.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Query, State},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error, UserID,
    auth::get_token_from_cookies,
    taxonomy::{Choice, TaxonomyId, TaxonomyKind, get_children},
};

/// The categories that belong to `operation_type_id`, in the order they were created.
pub fn list_categories(
    operation_type_id: TaxonomyId,
    owner: UserID,
    connection: &Connection,
) -> Result<Vec<Choice>, Error> {
    get_children(TaxonomyKind::Category, operation_type_id, owner, connection)
}

/// The subcategories that belong to `category_id`, in the order they were created.
pub fn list_subcategories(
    category_id: TaxonomyId,
    owner: UserID,
    connection: &Connection,
) -> Result<Vec<Choice>, Error> {
    get_children(TaxonomyKind::Subcategory, category_id, owner, connection)
}

/// The state needed for the lookup endpoints.
#[derive(Debug, Clone)]
pub struct LookupState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LookupState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

impl FromRef<LookupState> for Key {
    fn from_ref(state: &LookupState) -> Self {
        state.cookie_key.clone()
    }
}

/// The query string for [get_categories].
#[derive(Debug, Default, Deserialize)]
pub struct CategoryLookupQuery {
    pub operation_type_id: Option<String>,
}

/// The query string for [get_subcategories].
#[derive(Debug, Default, Deserialize)]
pub struct SubcategoryLookupQuery {
    pub category_id: Option<String>,
}

/// `GET /api/lookup/categories?operation_type_id=N`
pub async fn get_categories(
    State(state): State<LookupState>,
    jar: PrivateCookieJar,
    Query(query): Query<CategoryLookupQuery>,
) -> Json<Vec<Choice>> {
    Json(lookup(
        &state,
        &jar,
        query.operation_type_id.as_deref(),
        list_categories,
    ))
}

/// `GET /api/lookup/subcategories?category_id=N`
pub async fn get_subcategories(
    State(state): State<LookupState>,
    jar: PrivateCookieJar,
    Query(query): Query<SubcategoryLookupQuery>,
) -> Json<Vec<Choice>> {
    Json(lookup(
        &state,
        &jar,
        query.category_id.as_deref(),
        list_subcategories,
    ))
}

fn lookup(
    state: &LookupState,
    jar: &PrivateCookieJar,
    raw_parent_id: Option<&str>,
    list: fn(TaxonomyId, UserID, &Connection) -> Result<Vec<Choice>, Error>,
) -> Vec<Choice> {
    let Ok(token) = get_token_from_cookies(jar) else {
        return Vec::new();
    };

    let Some(parent_id) = raw_parent_id.and_then(|raw| raw.trim().parse::<TaxonomyId>().ok())
    else {
        return Vec::new();
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Vec::new();
        }
    };

    list(parent_id, token.user_id, &connection).unwrap_or_else(|error| {
        tracing::error!("Could not look up the children of {parent_id}: {error}");
        Vec::new()
    })
}
