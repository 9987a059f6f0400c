//! Defines the app level error type and conversions to rendered HTML pages and alerts.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{
    alert::Alert,
    cash_flow::{EntryField, LinkField},
    internal_server_error::InternalServerError,
    not_found::NotFoundError,
    taxonomy::TaxonomyKind,
};

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The auth token cookie is missing from the cookie jar in the request.
    #[error("no cookies in the cookie jar :(")]
    CookieMissing,

    /// The auth token cookie could not be decoded.
    #[error("the auth token is malformed")]
    InvalidToken,

    /// The auth token has passed its expiry time.
    #[error("the auth token has expired")]
    TokenExpired,

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The string could not be parsed as an email address.
    #[error("invalid email address: {0}")]
    InvalidEmail(String),

    /// Another account already uses the email address.
    #[error("an account with this email address already exists")]
    DuplicateEmail,

    /// A phone number contained something other than digits or was too long.
    #[error("phone number must contain only digits (at most 15)")]
    InvalidPhoneNumber,

    /// An empty string was used to create a name for a status, operation
    /// type, category or subcategory.
    #[error("name cannot be empty")]
    EmptyName,

    /// A name was longer than the maximum number of characters.
    #[error("name cannot be longer than {0} characters")]
    NameTooLong(usize),

    /// The name is already used within its uniqueness scope, i.e. by the same
    /// owner (and the same parent for categories and subcategories).
    #[error("\"{0}\" already exists")]
    DuplicateName(String),

    /// A category or subcategory was submitted without a parent. Holds the
    /// kind of the missing parent.
    #[error("please select the {}", .0.noun())]
    MissingParent(TaxonomyKind),

    /// The parent does not exist, belongs to another user, or the kind does
    /// not take a parent. Holds the kind of the parent, or the item's own kind
    /// when it takes no parent.
    #[error("the selected {} is not valid", .0.noun())]
    InvalidParent(TaxonomyKind),

    /// An entry referenced a taxonomy row that does not exist or belongs to
    /// another user.
    #[error("the selected {0} is not valid")]
    InvalidReference(EntryField),

    /// An entry's category does not belong to its operation type, or its
    /// subcategory does not belong to its category.
    #[error("{}", .0.mismatch_message())]
    ReferentialMismatch(LinkField),

    /// Tried to delete a taxonomy row that at least one entry references.
    #[error("the {} is used by at least one entry and cannot be deleted", .0.noun())]
    ProtectedReference(TaxonomyKind),

    /// Tried to move a category or subcategory to a new parent while entries
    /// reference it under the old parent.
    #[error("the {} is used by entries under its current parent and cannot be moved", .0.noun())]
    ReparentInUse(TaxonomyKind),

    /// The amount was not a positive number with at most two decimal places.
    #[error("{0}")]
    InvalidAmount(String),

    /// A form field that must be filled in was left empty.
    #[error("the {0} field is required")]
    MissingField(EntryField),

    /// A date string did not match the `YYYY-MM-DD` format.
    #[error("\"{0}\" is not a valid date, use the format YYYY-MM-DD")]
    InvalidDate(String),

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Rows owned by another user are reported as not found.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// An error occurred while serializing a struct as JSON
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// Tried to update an entry that does not exist
    #[error("tried to update an entry that is not in the database")]
    UpdateMissingEntry,

    /// Tried to delete an entry that does not exist
    #[error("tried to delete an entry that is not in the database")]
    DeleteMissingEntry,

    /// Tried to update a taxonomy row that does not exist
    #[error("tried to update a {} that is not in the database", .0.noun())]
    UpdateMissingTaxonomyItem(TaxonomyKind),

    /// Tried to delete a taxonomy row that does not exist
    #[error("tried to delete a {} that is not in the database", .0.noun())]
    DeleteMissingTaxonomyItem(TaxonomyKind),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

/// Whether `error` is a SQLite UNIQUE constraint failure.
pub(crate) fn is_unique_violation(error: &rusqlite::Error) -> bool {
    matches!(
        error,
        rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error {
                code: _,
                extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
            },
            _,
        )
    )
}

/// Whether `error` is a SQLite FOREIGN KEY constraint failure.
pub(crate) fn is_foreign_key_violation(error: &rusqlite::Error) -> bool {
    matches!(
        error,
        rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error {
                code: _,
                extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
            },
            _,
        )
    )
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => NotFoundError.into_response(),
            Error::InvalidTimezoneError(timezone) => InternalServerError {
                description: "Invalid Timezone Settings",
                fix: &format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            }
            .into_response(),
            Error::DatabaseLockError => InternalServerError::default().into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                InternalServerError::default().into_response()
            }
        }
    }
}

impl Error {
    /// The name of the form field this error should be displayed next to, if any.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Error::EmptyName | Error::NameTooLong(_) | Error::DuplicateName(_) => Some("name"),
            Error::MissingParent(_) | Error::InvalidParent(_) | Error::ReparentInUse(_) => {
                Some("parent_id")
            }
            Error::InvalidReference(field) | Error::MissingField(field) => Some(field.form_name()),
            Error::ReferentialMismatch(field) => Some(EntryField::from(*field).form_name()),
            Error::InvalidAmount(_) => Some(EntryField::Amount.form_name()),
            Error::InvalidDate(_) => Some(EntryField::Date.form_name()),
            Error::InvalidEmail(_) | Error::DuplicateEmail => Some("email"),
            Error::TooWeak(_) => Some("password"),
            Error::InvalidPhoneNumber => Some("phone_number"),
            _ => None,
        }
    }

    /// Convert the error into an HTTP response with an HTML alert.
    pub fn into_alert_response(self) -> Response {
        let (status_code, alert) = match self {
            Error::InvalidTimezoneError(timezone) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::Error {
                    message: "Invalid Timezone Settings".to_owned(),
                    details: format!(
                        "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                    ),
                },
            ),
            Error::ProtectedReference(kind) => (
                StatusCode::CONFLICT,
                Alert::Error {
                    message: format!("Could not delete {}", kind.noun()),
                    details: format!(
                        "The {} is used by at least one entry. \
                        Change or delete those entries first.",
                        kind.noun()
                    ),
                },
            ),
            Error::ReparentInUse(kind) => (
                StatusCode::CONFLICT,
                Alert::Error {
                    message: format!("Could not move {}", kind.noun()),
                    details: format!(
                        "Entries use the {} under its current parent. \
                        Change those entries first.",
                        kind.noun()
                    ),
                },
            ),
            Error::UpdateMissingEntry => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not update entry".to_owned(),
                    details: "The entry could not be found.".to_owned(),
                },
            ),
            Error::DeleteMissingEntry => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not delete entry".to_owned(),
                    details: "The entry could not be found. \
                    Try refreshing the page to see if the entry has already been deleted."
                        .to_owned(),
                },
            ),
            Error::UpdateMissingTaxonomyItem(kind) => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: format!("Could not update {}", kind.noun()),
                    details: format!("The {} could not be found.", kind.noun()),
                },
            ),
            Error::DeleteMissingTaxonomyItem(kind) => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: format!("Could not delete {}", kind.noun()),
                    details: format!(
                        "The {} could not be found. \
                        Try refreshing the page to see if it has already been deleted.",
                        kind.noun()
                    ),
                },
            ),
            Error::NotFound => (
                StatusCode::NOT_FOUND,
                Alert::ErrorSimple {
                    message: "The requested item could not be found".to_owned(),
                },
            ),
            error if error.field().is_some() => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Invalid input".to_owned(),
                    details: capitalize(&error.to_string()),
                },
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::Error {
                    message: "Something went wrong".to_owned(),
                    details:
                        "An unexpected error occurred, check the server logs for more details."
                            .to_owned(),
                },
            ),
        };

        (status_code, alert.into_html()).into_response()
    }

    /// The error message formatted for display next to a form field.
    pub fn field_message(&self) -> String {
        let message = capitalize(&self.to_string());

        if message.ends_with('.') {
            message
        } else {
            format!("{message}.")
        }
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();

    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
