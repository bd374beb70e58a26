//! Tallybook offline driver.
//!
//! Derives statements from a saved ledger and replays saved orchestrator
//! responses through the normalizer.
//!
//! Usage:
//!   tallybook report <ledger.json>
//!   tallybook normalize <response.json>...

use std::fs;
use std::path::Path;

use anyhow::{Context, bail};
use serde::Serialize;
use serde_json::Value;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tallybook_core::chart::ClassifierRules;
use tallybook_core::reports::{
    BalanceSheet, LedgerBook, ProfitAndLoss, ReportService, RowIssue, TrialBalance,
};
use tallybook_core::thread::{Normalizer, Session};
use tallybook_shared::AppConfig;

const USAGE: &str = "usage:
  tallybook report <ledger.json>
  tallybook normalize <response.json>...";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Reports {
    trial_balance: TrialBalance,
    profit_and_loss: ProfitAndLoss,
    balance_sheet: BalanceSheet,
    issues: Vec<RowIssue>,
}

impl Reports {
    fn of(book: &LedgerBook) -> Self {
        Self {
            trial_balance: book.trial_balance(),
            profit_and_loss: book.profit_and_loss(),
            balance_sheet: book.balance_sheet(),
            issues: book.issues(),
        }
    }
}

fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Logs go to stderr so stdout stays valid JSON
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tallybook=info,tallybook_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let output = match args.as_slice() {
        [command, ledger] if command == "report" => report(&config, Path::new(ledger))?,
        [command, responses @ ..] if command == "normalize" && !responses.is_empty() => {
            normalize(&config, responses)?
        }
        _ => bail!("{USAGE}"),
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn read_json(path: &Path) -> anyhow::Result<Value> {
    let text =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("{} is not valid JSON", path.display()))
}

fn load_book(config: &AppConfig, path: &Path) -> anyhow::Result<LedgerBook> {
    let rows = ReportService::rows_from_json(&read_json(path)?)?;
    info!(path = %path.display(), rows = rows.len(), "Loaded ledger");
    Ok(LedgerBook::new(rows, ClassifierRules::from_config(&config.chart)))
}

fn report(config: &AppConfig, ledger: &Path) -> anyhow::Result<Value> {
    let book = load_book(config, ledger)?;
    Ok(serde_json::to_value(Reports::of(&book))?)
}

fn normalize(config: &AppConfig, responses: &[String]) -> anyhow::Result<Value> {
    let normalizer = Normalizer::new(config.normalizer.clone());
    let mut session = Session::start();
    for path in responses {
        let raw = read_json(Path::new(path))?;
        let index = normalizer.normalize(&mut session, &raw);
        info!(path = %path, index, status = %session.status(), "Replayed response");
    }
    Ok(serde_json::json!({
        "sessionId": session.id(),
        "status": session.status(),
        "phase": session.phase(),
        "lastResponseType": session.last_response_type(),
        "activePreview": session.active_preview(),
        "timeline": session.timeline(),
    }))
}
