use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::{Date, Duration, OffsetDateTime};

use cashflow_rs::{
    Amount, CashFlowEntry, Email, NewTaxonomyItem, NewUser, PasswordHash, TaxonomyKind,
    TaxonomyName, UserID, ValidatedPassword, create_entry, create_item, create_user,
    initialize_db,
};

/// A utility for creating a test database for the REST API server of cashflow_rs.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating test user...");

    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked("test"),
        PasswordHash::DEFAULT_COST,
    )?;
    let user = create_user(
        NewUser::new(Email::new_unchecked("test@example.com"), password_hash),
        &conn,
    )?;

    println!("Creating sample taxonomy...");
    let taxonomy = create_sample_taxonomy(user.id, &conn)?;

    println!("Creating sample entries...");
    create_sample_entries(user.id, &taxonomy, &conn)?;

    println!("Success!");

    Ok(())
}

/// The IDs of the sample rows, grouped by how the entries use them.
struct SampleTaxonomy {
    paid: i64,
    pending: i64,
    income: (i64, i64, i64),
    groceries: (i64, i64, i64),
    rent: (i64, i64, i64),
}

fn create_named(
    kind: TaxonomyKind,
    name: &str,
    parent_id: Option<i64>,
    owner: UserID,
    conn: &Connection,
) -> Result<i64, Box<dyn Error>> {
    let mut item = NewTaxonomyItem::new(TaxonomyName::new(name)?);

    if let Some(parent_id) = parent_id {
        item = item.parent(parent_id);
    }

    Ok(create_item(kind, item, owner, conn)?.id)
}

fn create_sample_taxonomy(
    owner: UserID,
    conn: &Connection,
) -> Result<SampleTaxonomy, Box<dyn Error>> {
    let paid = create_named(TaxonomyKind::Status, "Paid", None, owner, conn)?;
    let pending = create_named(TaxonomyKind::Status, "Pending", None, owner, conn)?;

    let income = create_named(TaxonomyKind::OperationType, "Income", None, owner, conn)?;
    let expense = create_named(TaxonomyKind::OperationType, "Expense", None, owner, conn)?;

    let salary = create_named(TaxonomyKind::Category, "Salary", Some(income), owner, conn)?;
    let wages = create_named(TaxonomyKind::Subcategory, "Wages", Some(salary), owner, conn)?;

    let food = create_named(TaxonomyKind::Category, "Food", Some(expense), owner, conn)?;
    let groceries = create_named(TaxonomyKind::Subcategory, "Groceries", Some(food), owner, conn)?;
    create_named(TaxonomyKind::Subcategory, "Takeaways", Some(food), owner, conn)?;

    let housing = create_named(TaxonomyKind::Category, "Housing", Some(expense), owner, conn)?;
    let rent = create_named(TaxonomyKind::Subcategory, "Rent", Some(housing), owner, conn)?;

    Ok(SampleTaxonomy {
        paid,
        pending,
        income: (income, salary, wages),
        groceries: (expense, food, groceries),
        rent: (expense, housing, rent),
    })
}

fn create_sample_entries(
    owner: UserID,
    taxonomy: &SampleTaxonomy,
    conn: &Connection,
) -> Result<(), Box<dyn Error>> {
    let today = OffsetDateTime::now_utc().date();

    let samples: [(Date, i64, (i64, i64, i64), &str, &str); 5] = [
        (today, taxonomy.pending, taxonomy.rent, "450.00", "Weekly rent"),
        (today - Duration::days(2), taxonomy.paid, taxonomy.groceries, "87.35", ""),
        (today - Duration::days(7), taxonomy.paid, taxonomy.rent, "450.00", "Weekly rent"),
        (today - Duration::days(9), taxonomy.paid, taxonomy.groceries, "112.60", ""),
        (today - Duration::days(14), taxonomy.paid, taxonomy.income, "2350.00", "Pay day"),
    ];

    for (date, status, (operation_type, category, subcategory), amount, comment) in samples {
        let builder = CashFlowEntry::build(
            date,
            status,
            operation_type,
            category,
            subcategory,
            amount.parse::<Amount>()?,
        )
        .comment(comment);

        create_entry(builder, owner, conn)?;
    }

    Ok(())
}
