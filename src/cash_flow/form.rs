//! The entry form shared by the create and edit pages.

use std::sync::{Arc, Mutex};

use axum::{
    extract::FromRef,
    response::{IntoResponse, Response},
};
use maud::{Markup, PreEscaped, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::{Date, macros::format_description};

use crate::{
    AppState, Error, UserID,
    cash_flow::{
        Amount, CashFlowEntry, CashFlowEntryBuilder, EntryField,
        consistency::{DraftSelection, selection_errors},
        lookup::{list_categories, list_subcategories},
    },
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_ERROR_STYLE, FORM_LABEL_STYLE,
        FORM_TEXT_INPUT_STYLE, FieldErrors, HeadElement, base, field_error_view,
    },
    navigation::NavBar,
    taxonomy::{Choice, TaxonomyId, TaxonomyKind, get_choices},
};

/// Shown above the form when any field has an error.
pub const FORM_ERROR_SUMMARY: &str = "Please fix the errors in the form.";

/// The state needed by the entry form handlers.
#[derive(Debug, Clone)]
pub struct EntryFormState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EntryFormState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The raw values submitted by the entry form.
///
/// Every field is text so that missing or malformed values can be reported
/// next to the field instead of rejecting the whole request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntryFormData {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub status_id: String,
    #[serde(default)]
    pub operation_type_id: String,
    #[serde(default)]
    pub category_id: String,
    #[serde(default)]
    pub subcategory_id: String,
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub comment: String,
}

impl EntryFormData {
    /// A blank form dated `date`.
    pub fn dated(date: Date) -> Self {
        Self {
            date: date.to_string(),
            ..Default::default()
        }
    }

    /// The form values of a stored entry.
    pub fn from_entry(entry: &CashFlowEntry) -> Self {
        Self {
            date: entry.date.to_string(),
            status_id: entry.status_id.to_string(),
            operation_type_id: entry.operation_type_id.to_string(),
            category_id: entry.category_id.to_string(),
            subcategory_id: entry.subcategory_id.to_string(),
            amount: entry.amount.to_string(),
            comment: entry.comment.clone(),
        }
    }
}

fn parse_required<T>(
    raw: &str,
    field: EntryField,
    parse: impl FnOnce(&str) -> Result<T, Error>,
    errors: &mut FieldErrors,
) -> Option<T> {
    let raw = raw.trim();

    let result = if raw.is_empty() {
        Err(Error::MissingField(field))
    } else {
        parse(raw)
    };

    match result {
        Ok(value) => Some(value),
        Err(error) => {
            errors
                .entry(field.form_name())
                .or_insert_with(|| error.field_message());
            None
        }
    }
}

fn parse_id(raw: &str, field: EntryField) -> Result<TaxonomyId, Error> {
    raw.parse().map_err(|_| Error::InvalidReference(field))
}

/// Parse a `YYYY-MM-DD` date.
pub(crate) fn parse_date(raw: &str) -> Result<Date, Error> {
    Date::parse(raw, format_description!("[year]-[month]-[day]"))
        .map_err(|_| Error::InvalidDate(raw.to_owned()))
}

/// The result of checking a submitted entry form.
#[derive(Debug)]
pub enum CheckedForm {
    /// Every field is valid and the taxonomy rows form a chain.
    Valid(CashFlowEntryBuilder),
    /// Error messages keyed by field name.
    Invalid(FieldErrors),
}

/// Parse every field of `form` and check the selected taxonomy rows.
///
/// All problems are collected so the user can fix them in one go. A broken
/// link between the operation type, category and subcategory is attached to
/// each field that does not match.
///
/// # Errors
///
/// Returns an error only if the database could not be read.
pub fn check_form(
    form: &EntryFormData,
    owner: UserID,
    connection: &Connection,
) -> Result<CheckedForm, Error> {
    let mut errors = FieldErrors::new();

    let date = parse_required(&form.date, EntryField::Date, parse_date, &mut errors);
    let status_id = parse_required(
        &form.status_id,
        EntryField::Status,
        |raw| parse_id(raw, EntryField::Status),
        &mut errors,
    );
    let operation_type_id = parse_required(
        &form.operation_type_id,
        EntryField::OperationType,
        |raw| parse_id(raw, EntryField::OperationType),
        &mut errors,
    );
    let category_id = parse_required(
        &form.category_id,
        EntryField::Category,
        |raw| parse_id(raw, EntryField::Category),
        &mut errors,
    );
    let subcategory_id = parse_required(
        &form.subcategory_id,
        EntryField::Subcategory,
        |raw| parse_id(raw, EntryField::Subcategory),
        &mut errors,
    );
    let amount = parse_required(
        &form.amount,
        EntryField::Amount,
        str::parse::<Amount>,
        &mut errors,
    );

    let selection = DraftSelection {
        status_id,
        operation_type_id,
        category_id,
        subcategory_id,
    };

    for error in selection_errors(&selection, owner, connection)? {
        if let Some(field) = error.field() {
            errors
                .entry(field)
                .or_insert_with(|| error.field_message());
        }
    }

    match (
        date,
        status_id,
        operation_type_id,
        category_id,
        subcategory_id,
        amount,
    ) {
        (
            Some(date),
            Some(status_id),
            Some(operation_type_id),
            Some(category_id),
            Some(subcategory_id),
            Some(amount),
        ) if errors.is_empty() => Ok(CheckedForm::Valid(
            CashFlowEntry::build(
                date,
                status_id,
                operation_type_id,
                category_id,
                subcategory_id,
                amount,
            )
            .comment(&form.comment),
        )),
        _ => Ok(CheckedForm::Invalid(errors)),
    }
}

/// The options for the select inputs of the entry form.
#[derive(Debug, Default)]
pub struct EntryFormOptions {
    pub statuses: Vec<Choice>,
    pub operation_types: Vec<Choice>,
    /// Only the categories of the selected operation type.
    pub categories: Vec<Choice>,
    /// Only the subcategories of the selected category.
    pub subcategories: Vec<Choice>,
}

impl EntryFormOptions {
    /// Load `owner`'s options, narrowing the categories and subcategories to
    /// the parents selected in `form`.
    pub fn load(
        form: &EntryFormData,
        owner: UserID,
        connection: &Connection,
    ) -> Result<Self, Error> {
        let categories = match form.operation_type_id.trim().parse() {
            Ok(operation_type_id) => list_categories(operation_type_id, owner, connection)?,
            Err(_) => Vec::new(),
        };

        let subcategories = match form.category_id.trim().parse() {
            Ok(category_id) => list_subcategories(category_id, owner, connection)?,
            Err(_) => Vec::new(),
        };

        Ok(Self {
            statuses: get_choices(TaxonomyKind::Status, owner, connection)?,
            operation_types: get_choices(TaxonomyKind::OperationType, owner, connection)?,
            categories,
            subcategories,
        })
    }
}

/// Whether the form creates a new entry or updates an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormAction {
    Create,
    Update,
}

const LOOKUP_SCRIPT: &str = r#"
document.addEventListener("change", async (event) => {
    const select = event.target;
    if (!(select instanceof HTMLSelectElement) || !select.dataset.lookupUrl) {
        return;
    }

    const target = document.getElementById(select.dataset.lookupTarget);
    if (!target) {
        return;
    }

    let choices = [];
    if (select.value) {
        const params = new URLSearchParams({ [select.dataset.lookupParam]: select.value });
        const response = await fetch(`${select.dataset.lookupUrl}?${params}`, {
            credentials: "same-origin",
        });
        if (response.ok) {
            choices = await response.json();
        }
    }

    target.replaceChildren(target.options[0]);
    for (const choice of choices) {
        target.add(new Option(choice.name, choice.id));
    }
    target.value = "";
    target.dispatchEvent(new Event("change", { bubbles: true }));
});
"#;

/// Where a select asks for the options of its dependent select.
struct Lookup {
    url: &'static str,
    param: &'static str,
    target: &'static str,
}

fn select_input(
    field: EntryField,
    label: &str,
    choices: &[Choice],
    selected: &str,
    lookup: Option<Lookup>,
    errors: &FieldErrors,
) -> Markup {
    let name = field.form_name();
    let selected = selected.trim();

    html! {
        div
        {
            label for=(name) class=(FORM_LABEL_STYLE) { (label) }

            select
                id=(name)
                name=(name)
                required
                data-lookup-url=[lookup.as_ref().map(|lookup| lookup.url)]
                data-lookup-param=[lookup.as_ref().map(|lookup| lookup.param)]
                data-lookup-target=[lookup.as_ref().map(|lookup| lookup.target)]
                class=(FORM_TEXT_INPUT_STYLE)
            {
                option value="" { "Select a " (field) }

                @for choice in choices {
                    @let value = choice.id.to_string();
                    option value=(value) selected[value == selected] { (choice.name) }
                }
            }

            (field_error_view(errors, name))
        }
    }
}

/// Render the entry form.
///
/// `endpoint` is where the form is submitted, with POST for
/// [FormAction::Create] and PUT for [FormAction::Update].
pub fn entry_form_view(
    action: FormAction,
    endpoint: &str,
    values: &EntryFormData,
    options: &EntryFormOptions,
    errors: &FieldErrors,
) -> Markup {
    let (hx_post, hx_put, button_text) = match action {
        FormAction::Create => (Some(endpoint), None, "Save Entry"),
        FormAction::Update => (None, Some(endpoint), "Update Entry"),
    };

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
                p class=(FORM_ERROR_STYLE) role="alert" { (FORM_ERROR_SUMMARY) }
            }

            div
            {
                label for="date" class=(FORM_LABEL_STYLE) { "Date" }

                input
                    id="date"
                    type="date"
                    name="date"
                    value=(values.date)
                    required
                    class=(FORM_TEXT_INPUT_STYLE);

                (field_error_view(errors, EntryField::Date.form_name()))
            }

            (select_input(EntryField::Status, "Status", &options.statuses, &values.status_id, None, errors))

            (select_input(
                EntryField::OperationType,
                "Operation Type",
                &options.operation_types,
                &values.operation_type_id,
                Some(Lookup {
                    url: endpoints::LOOKUP_CATEGORIES,
                    param: "operation_type_id",
                    target: "category_id",
                }),
                errors,
            ))

            (select_input(
                EntryField::Category,
                "Category",
                &options.categories,
                &values.category_id,
                Some(Lookup {
                    url: endpoints::LOOKUP_SUBCATEGORIES,
                    param: "category_id",
                    target: "subcategory_id",
                }),
                errors,
            ))

            (select_input(EntryField::Subcategory, "Subcategory", &options.subcategories, &values.subcategory_id, None, errors))

            div
            {
                label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }

                input
                    id="amount"
                    type="number"
                    name="amount"
                    step="0.01"
                    min="0.01"
                    placeholder="0.00"
                    value=(values.amount)
                    required
                    class=(FORM_TEXT_INPUT_STYLE);

                (field_error_view(errors, EntryField::Amount.form_name()))
            }

            div
            {
                label for="comment" class=(FORM_LABEL_STYLE) { "Comment (optional)" }

                textarea
                    id="comment"
                    name="comment"
                    rows="3"
                    class=(FORM_TEXT_INPUT_STYLE)
                {
                    (values.comment)
                }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { (button_text) }
        }
    }
}

/// Re-render the submitted form with `errors` next to its fields.
///
/// The response is 200 OK so that htmx swaps the form in place.
pub fn invalid_form_response(
    action: FormAction,
    endpoint: &str,
    form: &EntryFormData,
    errors: &FieldErrors,
    owner: UserID,
    connection: &Connection,
) -> Response {
    match EntryFormOptions::load(form, owner, connection) {
        Ok(options) => entry_form_view(action, endpoint, form, &options, errors).into_response(),
        Err(error) => {
            tracing::error!("Could not load the entry form options: {error}");
            error.into_alert_response()
        }
    }
}

/// Wrap the entry form in a full page with the script that keeps the
/// category and subcategory options in sync.
pub fn entry_page_view(title: &str, nav_endpoint: &str, form: &Markup) -> Markup {
    let nav_bar = NavBar::new(nav_endpoint).into_html();

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="mb-4 text-xl font-bold" { (title) }

            (form)
        }
    };

    base(
        title,
        &[HeadElement::ScriptSource(PreEscaped(LOOKUP_SCRIPT.to_owned()))],
        &content,
    )
}
