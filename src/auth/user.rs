//! Code for creating the user table and fetching users from the database.

use std::{fmt::Display, str::FromStr};

use email_address::EmailAddress;
use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    auth::PasswordHash,
    error::is_unique_violation,
};

/// The longest phone number accepted, in digits.
const MAX_PHONE_NUMBER_LENGTH: usize = 15;

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A syntactically valid, lower-cased email address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Email(String);

impl Email {
    /// Parse and normalise an email address.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidEmail] if `raw_email` is not a valid address.
    pub fn new(raw_email: &str) -> Result<Self, Error> {
        let raw_email = raw_email.trim();

        EmailAddress::from_str(raw_email)
            .map(|email| Self(email.as_str().to_lowercase()))
            .map_err(|error| Error::InvalidEmail(error.to_string()))
    }

    /// Wrap an email read back from the database.
    pub fn new_unchecked(raw_email: &str) -> Self {
        Self(raw_email.to_owned())
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Check an optional phone number from a form.
///
/// Blank input means no phone number. Spaces are ignored.
///
/// # Errors
///
/// Returns [Error::InvalidPhoneNumber] if anything other than digits remains
/// or there are more than 15 digits.
pub fn parse_phone_number(raw_phone_number: &str) -> Result<Option<String>, Error> {
    let digits: String = raw_phone_number
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    if digits.is_empty() {
        return Ok(None);
    }

    if digits.len() > MAX_PHONE_NUMBER_LENGTH || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(Error::InvalidPhoneNumber);
    }

    Ok(Some(digits))
}

/// A user of the application.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The address the user logs in with.
    pub email: Email,
    /// The user's password hash.
    pub password_hash: PasswordHash,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
}

/// The data needed to register a user.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub email: Email,
    pub password_hash: PasswordHash,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
}

impl NewUser {
    /// A user with only the required fields set.
    pub fn new(email: Email, password_hash: PasswordHash) -> Self {
        Self {
            email,
            password_hash,
            first_name: None,
            last_name: None,
            phone_number: None,
        }
    }
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                email TEXT NOT NULL UNIQUE COLLATE NOCASE,
                password TEXT NOT NULL,
                first_name TEXT,
                last_name TEXT,
                phone_number TEXT
                )",
        (),
    )?;

    Ok(())
}

/// Create and insert a new user into the database.
///
/// # Errors
///
/// Returns:
/// - [Error::DuplicateEmail] if another user has the same email,
/// - [Error::SqlError] if an SQL related error occurred.
pub fn create_user(new_user: NewUser, connection: &Connection) -> Result<User, Error> {
    let id = connection
        .prepare(
            "INSERT INTO user (email, password, first_name, last_name, phone_number)
             VALUES (?1, ?2, ?3, ?4, ?5)
             RETURNING id",
        )?
        .query_row(
            (
                new_user.email.as_ref(),
                new_user.password_hash.as_ref(),
                &new_user.first_name,
                &new_user.last_name,
                &new_user.phone_number,
            ),
            |row| row.get(0),
        )
        .map_err(|error| {
            if is_unique_violation(&error) {
                Error::DuplicateEmail
            } else {
                error.into()
            }
        })?;

    Ok(User {
        id: UserID::new(id),
        email: new_user.email,
        password_hash: new_user.password_hash,
        first_name: new_user.first_name,
        last_name: new_user.last_name,
        phone_number: new_user.phone_number,
    })
}

fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_email: String = row.get(1)?;
    let raw_password_hash: String = row.get(2)?;

    Ok(User {
        id: UserID::new(row.get(0)?),
        email: Email::new_unchecked(&raw_email),
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
        first_name: row.get(3)?,
        last_name: row.get(4)?,
        phone_number: row.get(5)?,
    })
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a registered user.
/// - there was an error trying to access the store.
pub fn get_user_by_id(user_id: UserID, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare(
            "SELECT id, email, password, first_name, last_name, phone_number
             FROM user WHERE id = :id",
        )?
        .query_row(&[(":id", &user_id.as_i64())], map_user_row)
        .map_err(|error| error.into())
}

/// Get the user registered with `email`, ignoring case.
///
/// # Errors
///
/// Returns [Error::NotFound] if no user has the email.
pub fn get_user_by_email(email: &Email, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare(
            "SELECT id, email, password, first_name, last_name, phone_number
             FROM user WHERE email = :email",
        )?
        .query_row(&[(":email", email.as_ref())], map_user_row)
        .map_err(|error| error.into())
}

/// Replace the password hash of `user_id`.
///
/// # Errors
///
/// Returns [Error::NotFound] if the user does not exist.
pub fn update_password(
    user_id: UserID,
    password_hash: &PasswordHash,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE user SET password = ?1 WHERE id = ?2",
        (password_hash.as_ref(), user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

#[cfg(test)]
mod user_tests {
    use rusqlite::Connection;

    use crate::{
        Error,
        auth::{
            Email, NewUser, PasswordHash, UserID, create_user, get_user_by_email, get_user_by_id,
            update_password,
        },
    };

    use super::{create_user_table, parse_phone_number};

    fn get_db_connection() -> Connection {
        let conn =
            Connection::open_in_memory().expect("Could not create in-memory SQLite database");
        create_user_table(&conn).expect("Could not create user table");

        conn
    }

    fn new_user(email: &str) -> NewUser {
        NewUser::new(
            Email::new(email).unwrap(),
            PasswordHash::new_unchecked("hunter2"),
        )
    }

    #[test]
    fn email_is_trimmed_and_lower_cased() {
        let email = Email::new("  Jane.Doe@Example.COM ").unwrap();

        assert_eq!(email.as_ref(), "jane.doe@example.com");
    }

    #[test]
    fn email_without_domain_is_rejected() {
        let result = Email::new("jane.doe");

        assert!(matches!(result, Err(Error::InvalidEmail(_))));
    }

    #[test]
    fn phone_number_accepts_digits() {
        assert_eq!(
            parse_phone_number("021 555 0199"),
            Ok(Some("0215550199".to_owned()))
        );
        assert_eq!(parse_phone_number("  "), Ok(None));
    }

    #[test]
    fn phone_number_rejects_letters_and_long_numbers() {
        assert_eq!(
            parse_phone_number("+64 21 555"),
            Err(Error::InvalidPhoneNumber)
        );
        assert_eq!(
            parse_phone_number("1234567890123456"),
            Err(Error::InvalidPhoneNumber)
        );
    }

    #[test]
    fn insert_user_succeeds() {
        let db_connection = get_db_connection();
        let mut user = new_user("test@example.com");
        user.first_name = Some("Jane".to_owned());
        user.phone_number = Some("0215550199".to_owned());

        let inserted_user = create_user(user.clone(), &db_connection).unwrap();

        assert!(inserted_user.id.as_i64() > 0);
        assert_eq!(inserted_user.email, user.email);
        assert_eq!(inserted_user.first_name, user.first_name);
        assert_eq!(inserted_user.phone_number, user.phone_number);
    }

    #[test]
    fn insert_user_fails_on_duplicate_email() {
        let db_connection = get_db_connection();
        create_user(new_user("test@example.com"), &db_connection).unwrap();

        let result = create_user(
            NewUser::new(
                Email::new_unchecked("TEST@example.com"),
                PasswordHash::new_unchecked("hunter3"),
            ),
            &db_connection,
        );

        assert_eq!(result, Err(Error::DuplicateEmail));
    }

    #[test]
    fn get_user_fails_with_non_existent_id() {
        let db_connection = get_db_connection();

        assert_eq!(
            get_user_by_id(UserID::new(42), &db_connection),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn get_user_succeeds_with_existing_id() {
        let db_connection = get_db_connection();
        let test_user = create_user(new_user("test@example.com"), &db_connection).unwrap();

        let retrieved_user = get_user_by_id(test_user.id, &db_connection).unwrap();

        assert_eq!(retrieved_user, test_user);
    }

    #[test]
    fn get_user_by_email_ignores_case() {
        let db_connection = get_db_connection();
        let test_user = create_user(new_user("test@example.com"), &db_connection).unwrap();

        let retrieved_user =
            get_user_by_email(&Email::new_unchecked("Test@Example.com"), &db_connection).unwrap();

        assert_eq!(retrieved_user, test_user);
    }

    #[test]
    fn get_user_by_unknown_email_is_not_found() {
        let db_connection = get_db_connection();

        let result = get_user_by_email(&Email::new("nobody@example.com").unwrap(), &db_connection);

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn update_password_replaces_hash() {
        let db_connection = get_db_connection();
        let test_user = create_user(new_user("test@example.com"), &db_connection).unwrap();
        let new_hash = PasswordHash::new_unchecked("correcthorsebatterystaple");

        update_password(test_user.id, &new_hash, &db_connection).unwrap();

        let retrieved_user = get_user_by_id(test_user.id, &db_connection).unwrap();
        assert_eq!(retrieved_user.password_hash, new_hash);
    }

    #[test]
    fn update_password_for_missing_user_is_not_found() {
        let db_connection = get_db_connection();

        let result = update_password(
            UserID::new(42),
            &PasswordHash::new_unchecked("hunter2"),
            &db_connection,
        );

        assert_eq!(result, Err(Error::NotFound));
    }
}
