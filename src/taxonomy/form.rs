//! The form shared by the taxonomy create and edit pages.

use std::sync::{Arc, Mutex};

use axum::{
    extract::FromRef,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error, UserID,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_ERROR_STYLE, FORM_LABEL_STYLE,
        FORM_TEXT_INPUT_STYLE, FieldErrors, base, field_error_view,
    },
    navigation::NavBar,
    taxonomy::{
        Choice, MAX_NAME_LENGTH, NewTaxonomyItem, TaxonomyFormData, TaxonomyItem, TaxonomyKind,
        TaxonomyName, get_parent_choices,
    },
};

/// The state needed by the taxonomy handlers.
#[derive(Debug, Clone)]
pub struct TaxonomyState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TaxonomyState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Whether the form creates a new row or updates an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormAction {
    Create,
    Update,
}

impl TaxonomyFormData {
    /// The form values of a stored row.
    pub fn from_item(item: &TaxonomyItem) -> Self {
        Self {
            name: item.name.to_string(),
            parent_id: item.parent_id.map(|id| id.to_string()).unwrap_or_default(),
            description: item.description.clone().unwrap_or_default(),
        }
    }
}

fn record(errors: &mut FieldErrors, error: &Error) {
    if let Some(field) = error.field() {
        errors
            .entry(field)
            .or_insert_with(|| error.field_message());
    }
}

/// Check the name and parent of a submitted form.
///
/// Whether the parent exists and belongs to the user is checked when the row
/// is written.
pub fn parse_form(
    kind: TaxonomyKind,
    form: &TaxonomyFormData,
) -> Result<NewTaxonomyItem, FieldErrors> {
    let mut errors = FieldErrors::new();

    let name = TaxonomyName::new(&form.name)
        .inspect_err(|error| record(&mut errors, error))
        .ok();

    let parent_id = match kind.parent() {
        None => None,
        Some(parent_kind) => {
            let raw = form.parent_id.trim();

            let parsed = if raw.is_empty() {
                Err(Error::MissingParent(parent_kind))
            } else {
                raw.parse().map_err(|_| Error::InvalidParent(parent_kind))
            };

            parsed.inspect_err(|error| record(&mut errors, error)).ok()
        }
    };

    match name {
        Some(name) if errors.is_empty() => {
            let mut item = NewTaxonomyItem::new(name).description(&form.description);
            item.parent_id = parent_id;
            Ok(item)
        }
        _ => Err(errors),
    }
}

/// Render the create or edit form for `kind`.
pub fn taxonomy_form_view(
    kind: TaxonomyKind,
    action: FormAction,
    endpoint: &str,
    values: &TaxonomyFormData,
    parent_choices: &[Choice],
    errors: &FieldErrors,
) -> Markup {
    let (hx_post, hx_put, button_text) = match action {
        FormAction::Create => (Some(endpoint), None, format!("Create {}", kind.singular())),
        FormAction::Update => (None, Some(endpoint), format!("Update {}", kind.singular())),
    };
    let selected_parent = values.parent_id.trim();

    html! {
        form
            hx-post=[hx_post]
            hx-put=[hx_put]
            hx-target="this"
            hx-swap="outerHTML"
            hx-target-error="#alert-container"
            class="w-full space-y-4 md:space-y-6"
        {
            @if !errors.is_empty() {
                p class=(FORM_ERROR_STYLE) role="alert" { "Please fix the errors in the form." }
            }

            div
            {
                label for="name" class=(FORM_LABEL_STYLE) { "Name" }

                input
                    id="name"
                    type="text"
                    name="name"
                    placeholder=(kind.singular())
                    value=(values.name)
                    maxlength=(MAX_NAME_LENGTH)
                    required
                    autofocus
                    class=(FORM_TEXT_INPUT_STYLE);

                (field_error_view(errors, "name"))
            }

            @if let Some(parent_kind) = kind.parent() {
                div
                {
                    label for="parent_id" class=(FORM_LABEL_STYLE) { (parent_kind.singular()) }

                    select id="parent_id" name="parent_id" required class=(FORM_TEXT_INPUT_STYLE)
                    {
                        option value="" { "Select a " (parent_kind.noun()) }

                        @for choice in parent_choices {
                            @let value = choice.id.to_string();
                            option value=(value) selected[value == selected_parent] { (choice.name) }
                        }
                    }

                    (field_error_view(errors, "parent_id"))
                }
            }

            div
            {
                label for="description" class=(FORM_LABEL_STYLE) { "Description (optional)" }

                textarea
                    id="description"
                    name="description"
                    rows="2"
                    class=(FORM_TEXT_INPUT_STYLE)
                {
                    (values.description)
                }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { (button_text) }
        }
    }
}

/// Re-render the submitted form with `errors`, loading the parent options.
pub fn invalid_form_response(
    kind: TaxonomyKind,
    action: FormAction,
    endpoint: &str,
    form: &TaxonomyFormData,
    errors: &FieldErrors,
    owner: UserID,
    connection: &Connection,
) -> Response {
    match get_parent_choices(kind, owner, connection) {
        Ok(parent_choices) => {
            taxonomy_form_view(kind, action, endpoint, form, &parent_choices, errors)
                .into_response()
        }
        Err(error) => {
            tracing::error!("Could not load the {} parent options: {error}", kind.noun());
            error.into_alert_response()
        }
    }
}

pub fn taxonomy_page_view(title: &str, nav_endpoint: &str, form: &Markup) -> Markup {
    let nav_bar = NavBar::new(nav_endpoint).into_html();

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="mb-4 text-xl font-bold" { (title) }

            (form)
        }
    };

    base(title, &[], &content)
}
