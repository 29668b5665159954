//! seed-runner: headless trigger for the client-portfolio generator.
//!
//! Usage:
//!   seed-runner --org demo-org --db nexus.db --count 8
//!   seed-runner --form firm.json --seed 12345 --json
//!   seed-runner --org demo-org --db nexus.db --wipe

use anyhow::{Context, Result};
use nexus_core::{
    config::GeneratorConfig,
    form::{ClientCount, GenerationForm},
    orchestrator::{GenerationResult, Orchestrator},
    store::{Repository, SqliteStore, TableCounts},
    types::NexusStatus,
};
use std::env;
use std::sync::Arc;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let config_path = arg_value(&args, "--config");
    let mut config = GeneratorConfig::load(config_path)?;
    if let Some(db) = arg_value(&args, "--db") {
        config.database_path = db.to_string();
    }
    if let Some(seed) = arg_value(&args, "--seed") {
        config.seed = Some(seed.parse().with_context(|| format!("--seed '{seed}'"))?);
    }
    let org = arg_value(&args, "--org").unwrap_or("demo-org").to_string();
    let print_json = args.iter().any(|a| a == "--json");
    let wipe = args.iter().any(|a| a == "--wipe");

    let mut form = match arg_value(&args, "--form") {
        Some(path) => {
            let content =
                std::fs::read_to_string(path).with_context(|| format!("cannot read {path}"))?;
            serde_json::from_str(&content).with_context(|| format!("invalid form {path}"))?
        }
        None => demo_form(),
    };
    if let Some(count) = arg_value(&args, "--count") {
        let count: u64 = count.parse().with_context(|| format!("--count '{count}'"))?;
        form.multi_state_client_count = Some(ClientCount::Number(count));
    }

    if !print_json {
        println!("Nexus portfolio seed-runner");
        println!("  org:       {org}");
        println!("  db:        {}", config.database_path);
        println!(
            "  seed:      {}",
            config
                .seed
                .map(|s| s.to_string())
                .unwrap_or_else(|| "clock".into())
        );
        println!(
            "  llm:       {}",
            if config.llm.api_key.is_some() {
                config.llm.model.as_str()
            } else {
                "disabled (fallback generation)"
            }
        );
        println!();
    }

    let store = SqliteStore::open_migrated(&config.database_path)?;
    let repo: Arc<dyn Repository> = Arc::new(store);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        if wipe {
            let removed = repo.delete_organization_data(&org).await?;
            if !print_json {
                println!("Wiped {removed} rows for {org}");
                println!();
            }
        }

        let orchestrator = Orchestrator::from_config(Arc::clone(&repo), config)?;
        let result = orchestrator.generate_and_persist(&form, &org).await?;
        let counts = repo.table_counts(&org).await?;

        if print_json {
            println!("{}", serde_json::to_string_pretty(&result)?);
        } else {
            print_summary(&result, &counts);
        }
        Ok::<(), anyhow::Error>(())
    })
}

fn print_summary(result: &GenerationResult, counts: &TableCounts) {
    let dist = &result.risk_distribution;
    println!("=== RUN SUMMARY ===");
    println!("  seed:             {}", result.seed);
    println!("  requested:        {}", result.requested_clients);
    println!("  created:          {}", result.total_clients);
    println!("  failed:           {}", result.failed_clients);
    println!("  from llm:         {}", result.llm_clients());
    println!(
        "  risk:             low {} | medium {} | high {} | critical {}",
        dist.low, dist.medium, dist.high, dist.critical
    );
    println!("  penalty exposure: ${:.2}", result.total_penalty_exposure);

    println!();
    println!("=== CLIENTS ===");
    for c in &result.clients {
        let breaches = c
            .nexus_data
            .iter()
            .filter(|s| s.status == NexusStatus::Critical)
            .count();
        println!(
            "  {:<36} {:<8} ${:>12.2}  {} state(s) breached  [{}]",
            c.client.name,
            c.risk_level.as_str(),
            c.penalty_exposure,
            breaches,
            c.source
        );
    }

    println!();
    println!("=== ROWS (organization) ===");
    for (table, n) in counts.as_pairs() {
        println!("  {table:<24} {n}");
    }
    println!("  {:<24} {}", "total", counts.total());
}

/// Firm used when no `--form` is given.
fn demo_form() -> GenerationForm {
    GenerationForm {
        client_name: "Summit Ridge Tax Advisors".into(),
        priority_states: ["CA", "TX", "NY", "FL", "WA", "IL"]
            .into_iter()
            .map(String::from)
            .collect(),
        pain_points: vec![
            "Untracked marketplace sales".into(),
            "Late registrations after threshold breaches".into(),
        ],
        multi_state_client_count: Some(ClientCount::Label("11-50".into())),
        primary_industry: Some("E-commerce".into()),
        qualification_strategy: Some("Annual nexus review with quarterly monitoring".into()),
        additional_notes: None,
    }
}

fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}
