//! Alert system for displaying success and error messages to users.

use axum::response::{IntoResponse, Response};
use maud::{Markup, html};

/// An alert message shown at the bottom of the page.
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    /// A success message with extra details.
    #[allow(dead_code)]
    Success {
        /// The headline.
        message: String,
        /// A longer explanation.
        details: String,
    },
    /// A success message without details.
    SuccessSimple {
        /// The headline.
        message: String,
    },
    /// An error message with extra details.
    Error {
        /// The headline.
        message: String,
        /// A longer explanation, e.g. how to fix the error.
        details: String,
    },
    /// An error message without details.
    ErrorSimple {
        /// The headline.
        message: String,
    },
}

const SUCCESS_STYLE: &str = "p-4 mb-4 text-sm text-green-800 rounded-lg bg-green-50 \
    dark:bg-gray-800 dark:text-green-400 border border-green-300 dark:border-green-800";

const ERROR_STYLE: &str = "p-4 mb-4 text-sm text-red-800 rounded-lg bg-red-50 \
    dark:bg-gray-800 dark:text-red-400 border border-red-300 dark:border-red-800";

impl Alert {
    fn is_success(&self) -> bool {
        matches!(self, Alert::Success { .. } | Alert::SuccessSimple { .. })
    }

    /// Render the alert box.
    pub fn into_html(self) -> Markup {
        let style = if self.is_success() {
            SUCCESS_STYLE
        } else {
            ERROR_STYLE
        };

        let (message, details) = match self {
            Alert::Success { message, details } | Alert::Error { message, details } => {
                (message, Some(details))
            }
            Alert::SuccessSimple { message } | Alert::ErrorSimple { message } => (message, None),
        };

        html! {
            div class=(style) role="alert"
            {
                div class="flex items-start justify-between gap-4"
                {
                    div
                    {
                        p class="font-semibold" { (message) }

                        @if let Some(details) = details {
                            p class="mt-1" { (details) }
                        }
                    }

                    button
                        type="button"
                        aria-label="Dismiss"
                        class="font-bold"
                        onclick="this.closest('[role=alert]').remove()"
                    {
                        "×"
                    }
                }
            }
        }
    }
}

impl IntoResponse for Alert {
    fn into_response(self) -> Response {
        if self.is_success() {
            // The success alert replaces the alert container out of band so
            // that the triggering element can be swapped independently.
            html! {
                div
                    id="alert-container"
                    hx-swap-oob="true"
                    class="w-full max-w-md px-4"
                    style="position: fixed; bottom: 1rem; left: 50%; transform: translateX(-50%); z-index: 9999;"
                {
                    (self.into_html())
                }
            }
            .into_response()
        } else {
            self.into_html().into_response()
        }
    }
}

/// A message passed between pages through the `notice` query parameter after a redirect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    /// A cash-flow entry was created.
    EntryCreated,
    /// A cash-flow entry was updated.
    EntryUpdated,
    /// A status, operation type, category or subcategory was created.
    ItemCreated,
    /// A status, operation type, category or subcategory was updated.
    ItemUpdated,
}

impl Notice {
    /// Parse the value of a `notice` query parameter, ignoring unknown values.
    pub fn from_query(value: Option<&str>) -> Option<Self> {
        match value? {
            "entry-created" => Some(Notice::EntryCreated),
            "entry-updated" => Some(Notice::EntryUpdated),
            "item-created" => Some(Notice::ItemCreated),
            "item-updated" => Some(Notice::ItemUpdated),
            _ => None,
        }
    }

    /// The value to use for the `notice` query parameter.
    pub fn as_query(self) -> &'static str {
        match self {
            Notice::EntryCreated => "entry-created",
            Notice::EntryUpdated => "entry-updated",
            Notice::ItemCreated => "item-created",
            Notice::ItemUpdated => "item-updated",
        }
    }

    /// Append this notice to `url` as a query parameter.
    pub fn append_to(self, url: &str) -> String {
        let separator = if url.contains('?') { '&' } else { '?' };

        format!("{url}{separator}notice={}", self.as_query())
    }

    /// The message shown to the user.
    pub fn message(self) -> &'static str {
        match self {
            Notice::EntryCreated => "Entry saved",
            Notice::EntryUpdated => "Entry updated",
            Notice::ItemCreated => "Item saved",
            Notice::ItemUpdated => "Item updated",
        }
    }
}
