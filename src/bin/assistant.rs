use std::{fs::OpenOptions, io::Write, sync::Arc};

use clap::Parser;
use time::{Duration, OffsetDateTime};
use tracing_subscriber::{Layer, filter, layer::SubscriberExt, util::SubscriberInitExt};

use bizsmart::{
    assistant::{ChatSession, GREETING},
    dashboard::{format_currency, summarize},
    insight::{ReportMonth, generate_financial_insights},
    prompt::{GeminiConfig, GeminiPromptService},
    transaction::{
        Entry, InMemoryTransactionStore, SortKey, TransactionFilter, TransactionStore, UserId,
        query_transactions, record_entry,
    },
};

/// An interactive finance assistant over a demo business ledger.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// The Gemini model that answers prompts.
    #[arg(long)]
    model: Option<String>,
}

#[tokio::main]
async fn main() {
    setup_logging();

    let args = Args::parse();

    let mut config =
        GeminiConfig::from_env().expect("The environment variable 'GEMINI_API_KEY' must be set");
    if let Some(model) = args.model {
        config = config.model(model);
    }
    let service =
        GeminiPromptService::new(config).expect("Could not create the Gemini prompt service");

    let store = InMemoryTransactionStore::new(UserId::new("demo-user"));
    seed_demo_ledger(&store);

    let mut session = ChatSession::new();
    println!("BizSmart assistant. Type 'help' for commands, 'quit' to leave.");
    println!("assistant> {GREETING}");

    let stdin = std::io::stdin();
    let mut input = String::new();

    loop {
        print!("you> ");
        std::io::stdout().flush().expect("Could not flush stdout");

        input.clear();
        let bytes_read = stdin
            .read_line(&mut input)
            .expect("Could not read from stdin");
        if bytes_read == 0 {
            break;
        }

        match input.trim() {
            "" => {}
            "quit" | "exit" => break,
            "help" => print_help(),
            "summary" => print_summary(&store),
            "transactions" => print_transactions(&store),
            "insights" => print_insights(&store, &service).await,
            line => {
                if let Some(reply) = session.send(line, &service, &store).await {
                    println!("assistant> {}", reply.content);
                }
            }
        }
    }

    println!("Bye!");
}

fn setup_logging() {
    // Chat output owns stdout, so logs go to stderr and the log file.
    let stderr_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_writer(std::io::stderr);

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open("assistant.log")
        .expect("Could not create log file");

    let debug_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_writer(Arc::new(log_file));

    tracing_subscriber::registry()
        .with(
            stderr_log
                .with_filter(filter::LevelFilter::WARN)
                .and_then(debug_log)
                .with_filter(filter::LevelFilter::DEBUG),
        )
        .init();
}

/// Record a plausible month of trading so the dashboard and assistant have
/// something to talk about.
fn seed_demo_ledger(store: &InMemoryTransactionStore) {
    let now = OffsetDateTime::now_utc();

    let entries = vec![
        Entry::Income {
            amount: 4800.0,
            date: now - Duration::days(24),
            description: "Invoice 1041, website build".to_owned(),
            category: "Sales".to_owned(),
            account: "Bank Transfer".to_owned(),
        },
        Entry::Expense {
            amount: 1500.0,
            date: now - Duration::days(20),
            description: "Office rent".to_owned(),
            category: "Rent".to_owned(),
            account: "Bank Transfer".to_owned(),
        },
        Entry::Income {
            amount: 1250.0,
            date: now - Duration::days(18),
            description: "Monthly retainer, Acme Corp".to_owned(),
            category: "Consulting".to_owned(),
            account: "Bank Transfer".to_owned(),
        },
        Entry::Expense {
            amount: 86.4,
            date: now - Duration::days(12),
            description: "Printer paper and toner".to_owned(),
            category: "Supplies".to_owned(),
            account: "Credit Card".to_owned(),
        },
        Entry::Expense {
            amount: 240.0,
            date: now - Duration::days(9),
            description: "Search ads".to_owned(),
            category: "Marketing".to_owned(),
            account: "Credit Card".to_owned(),
        },
        Entry::Expense {
            amount: 65.3,
            date: now - Duration::days(6),
            description: "Electricity bill".to_owned(),
            category: "Utilities".to_owned(),
            account: "Bank Transfer".to_owned(),
        },
        Entry::Income {
            amount: 320.0,
            date: now - Duration::days(4),
            description: "Workshop tickets".to_owned(),
            category: "Sales".to_owned(),
            account: "Cash".to_owned(),
        },
        Entry::Transfer {
            amount: 300.0,
            date: now - Duration::days(2),
            description: "Weekly cash deposit".to_owned(),
            from_account: "Cash".to_owned(),
            to_account: "Bank Transfer".to_owned(),
        },
    ];

    for entry in entries {
        record_entry(store, entry, now).expect("Could not seed the demo ledger");
    }
}

fn print_help() {
    println!("Commands:");
    println!("  summary        totals and burn rate for the whole ledger");
    println!("  transactions   list the ledger, newest first");
    println!("  insights       AI analysis of the current month");
    println!("  quit           leave");
    println!("Anything else is sent to the assistant.");
}

fn print_summary(store: &InMemoryTransactionStore) {
    let transactions = store.all().expect("Could not read the ledger");
    let summary = summarize(&transactions);

    println!("Income:     {}", format_currency(summary.total_income));
    println!("Expenses:   {}", format_currency(summary.total_expense));
    println!("Net profit: {}", format_currency(summary.net_profit));
    println!("Burn rate:  {}", format_currency(summary.burn_rate));
    match summary.top_expense_category {
        Some(category) => println!("Top expense category: {category}"),
        None => println!("Top expense category: none"),
    }
}

fn print_transactions(store: &InMemoryTransactionStore) {
    let transactions = store.all().expect("Could not read the ledger");
    let today = OffsetDateTime::now_utc().date();
    let rows = query_transactions(
        &transactions,
        &TransactionFilter::default(),
        SortKey::DateDesc,
        today,
    );

    for transaction in rows {
        println!(
            "{}  {:<7}  {:>12}  {:<12}  {} ({})",
            transaction.date.date(),
            transaction.kind.as_str(),
            format_currency(transaction.amount),
            transaction.category,
            transaction.description,
            transaction.payment_method
        );
    }
}

async fn print_insights(store: &InMemoryTransactionStore, service: &GeminiPromptService) {
    let now = OffsetDateTime::now_utc();
    let month = ReportMonth::containing(now);
    let transactions = store.all().expect("Could not read the ledger");
    let filter = TransactionFilter {
        date_range: Some(month.date_range()),
        ..TransactionFilter::default()
    };
    let month_rows = filter.apply(&transactions, now.date());

    println!("Analyzing {} transactions for {month}...", month_rows.len());

    match generate_financial_insights(store.user_id().clone(), &month_rows, month, service).await {
        Ok(insight) => {
            println!("{}", insight.summary);
            println!("Burn rate: {}", format_currency(insight.burn_rate));
            println!("Top expense category: {}", insight.top_expense_category);
            for suggestion in &insight.suggestions {
                println!("- {suggestion}");
            }
        }
        Err(error) => println!("Could not generate insights: {error}"),
    }
}
