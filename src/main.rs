mod aggregator;
mod anomaly;
mod categorizer;
mod classifier;
mod cli;
mod dashboard;
mod demo;
mod error;
mod export;
mod fmt;
mod models;
mod normalizer;
mod prediction;
mod settings;
mod store;
mod users;
mod window;

use clap::Parser;
use env_logger::Env;

use cli::report::ReportKind;
use cli::{Cli, Commands, PredictCommands, ReportCommands, TransactionsCommands, UsersCommands};

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { data_dir } => cli::init::run(data_dir),
        Commands::Dashboard { range } => cli::dashboard::run(&range),
        Commands::Alerts { output } => cli::alerts::run(&output),
        Commands::Report { command } => match command {
            ReportCommands::Category { args } => cli::report::run(ReportKind::Category, &args),
            ReportCommands::Merchant { args } => cli::report::run(ReportKind::Merchant, &args),
            ReportCommands::Monthly { args } => cli::report::run(ReportKind::Monthly, &args),
            ReportCommands::Daily { args } => cli::report::run(ReportKind::Daily, &args),
            ReportCommands::Transactions { args } => {
                cli::report::run(ReportKind::Transactions, &args)
            }
        },
        Commands::Transactions { command } => match command {
            TransactionsCommands::List { page, size, search } => {
                cli::transactions::list(page, size, search.as_deref())
            }
            TransactionsCommands::Add {
                id,
                amount,
                date,
                client,
                card,
                method,
                merchant,
                city,
                state,
                zip,
                category,
                mcc,
                fraud,
            } => cli::transactions::add(cli::transactions::AddTransaction {
                id,
                amount,
                date,
                client,
                card,
                method,
                merchant,
                city,
                state,
                zip,
                category,
                mcc,
                fraud,
            }),
            TransactionsCommands::Delete { id } => cli::transactions::delete(&id),
            TransactionsCommands::Import { file } => cli::transactions::import(&file),
        },
        Commands::Users { command } => match command {
            UsersCommands::List {
                income,
                search,
                sort,
                desc,
                page,
                size,
                output,
            } => cli::users::list(cli::users::ListUsers {
                income,
                search,
                sort,
                desc,
                page,
                size,
                output,
            }),
            UsersCommands::Add {
                id,
                age,
                gender,
                address,
                yearly_income,
                per_capita_income,
                total_debt,
                credit_score,
                cards,
            } => cli::users::add(cli::users::AddUser {
                id,
                age,
                gender,
                address,
                yearly_income,
                per_capita_income,
                total_debt,
                credit_score,
                cards,
            }),
        },
        Commands::Predict { command } => match command {
            PredictCommands::Fraud {
                amount,
                hour,
                mcc,
                zip,
                method,
            } => cli::predict::fraud(amount, hour, mcc, zip, method),
            PredictCommands::Spend {
                age,
                income,
                avg_monthly_spend,
            } => cli::predict::spend(age, income, avg_monthly_spend),
        },
        Commands::Demo { seed } => cli::demo::run(seed),
        Commands::Status => cli::status::run(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
