use colored::Colorize;

use crate::cli::export::write_outputs;
use crate::cli::{load_users, open_store, paginate, screen_table, OutputArgs};
use crate::error::Result;
use crate::export::table::{users_table, USER_COLUMNS};
use crate::fmt::money;
use crate::models::{NewUser, User};
use crate::settings::load_settings;
use crate::store::{Page, Store};
use crate::users::{select, summarize, IncomeBand, UserQuery, UserSortKey};

pub struct ListUsers {
    pub income: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
    pub desc: bool,
    pub page: usize,
    pub size: usize,
    pub output: OutputArgs,
}

pub fn list(args: ListUsers) -> Result<()> {
    let query = UserQuery {
        income: args.income.as_deref().map(str::parse::<IncomeBand>).transpose()?,
        search: args.search,
        sort: args.sort.as_deref().map(str::parse::<UserSortKey>).transpose()?,
        descending: args.desc,
    };
    let settings = load_settings();
    let store = open_store(&settings)?;
    let users = load_users(&store)?;
    let selected = select(&users, &query);
    let summary = summarize(&selected);

    let (page_rows, pages) = paginate(&selected, args.page, args.size);
    if page_rows.is_empty() {
        println!("No users found.");
    } else {
        let table = users_table(page_rows).with_columns(&USER_COLUMNS.map(String::from))?;
        println!("Users\n{}", screen_table(&table));
        println!("Page {} of {pages}", args.page.max(1));
    }

    println!();
    println!("Users:            {}", summary.count);
    println!("Total assets:     {}", money(summary.total_assets));
    println!("Total debt:       {}", money(summary.total_debt));
    match summary.avg_credit_score {
        Some(avg) => println!("Avg credit score: {avg:.0}"),
        None => println!("Avg credit score: {}", "n/a".dimmed()),
    }

    // File exports carry every matching user, not just the current page.
    let full = users_table(&selected);
    let subtitle = format!("{} users", summary.count);
    write_outputs(&args.output, "Users", &subtitle, &[&full])
}

pub struct AddUser {
    pub id: Option<String>,
    pub age: Option<i64>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub yearly_income: Option<f64>,
    pub per_capita_income: Option<f64>,
    pub total_debt: Option<f64>,
    pub credit_score: Option<i64>,
    pub cards: Option<i64>,
}

/// Next id in the C-number sequence, e.g. C1021 after twenty users.
fn next_user_id(existing: &[User], total: usize) -> String {
    let mut n = 1000 + total + 1;
    while existing.iter().any(|u| u.id == format!("C{n}")) {
        n += 1;
    }
    format!("C{n}")
}

pub fn add(args: AddUser) -> Result<()> {
    let settings = load_settings();
    let store = open_store(&settings)?;
    let id = match args.id {
        Some(id) => id,
        None => {
            let fetched = store.fetch_users(Page::All)?;
            let users = crate::users::normalize_users(&fetched.rows);
            next_user_id(&users, fetched.total)
        }
    };
    let user = NewUser {
        id,
        current_age: args.age,
        gender: args.gender,
        address: args.address,
        yearly_income: args.yearly_income,
        per_capita_income: args.per_capita_income,
        total_debt: args.total_debt,
        credit_score: args.credit_score,
        num_credit_cards: args.cards,
    };
    store.insert_user(&user)?;
    println!("Added user {}", user.id.bold());
    Ok(())
}
