//! CLI interface for icp-architect

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::path::PathBuf;

use crate::agent::OllamaClient;
use crate::config::{self, Config};
use crate::leads::{self, crm, Lead, LeadSourcer};
use crate::soul::{self, SoulEngine, SoulStore};

#[derive(Parser)]
#[command(name = "icp-architect")]
#[command(about = "Self-improving ideal customer profile engine that learns from sales outcomes", long_about = None)]
#[command(version)]
struct Cli {
    /// Soul file to use instead of the configured one
    #[arg(long, global = true, env = "ICP_SOUL_FILE")]
    soul_file: Option<PathBuf>,

    /// Configuration file to use instead of the default location
    #[arg(long, global = true, env = "ICP_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a sales outcome (JSON, single quotes allowed)
    Feedback {
        /// e.g. "{'outcome': 'won', 'revenue': 75000, 'lead_data': {'industry': 'SaaS'}}"
        outcome: String,
    },
    /// Run a reflection cycle over recent feedback
    Reflect {
        /// Window in days (default from config)
        #[arg(short, long)]
        days: Option<i64>,
    },
    /// Show current ICP recommendations
    Icp,
    /// Show soul statistics
    Stats,
    /// Generate leads from the current ICP
    Leads {
        /// Number of leads (default from config)
        #[arg(short, long)]
        count: Option<usize>,
    },
    /// Import closed deals from a CRM export (sample data when no file is given)
    ImportCrm {
        /// JSON array of closed deals
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Only deals closed within this many days
        #[arg(short, long, default_value = "30")]
        days: i64,
    },
    /// Score a lead with the local model
    AnalyzeLead {
        /// Lead JSON (single quotes allowed)
        lead: String,
    },
    /// Walk through one learning loop
    Demo,
    /// Start the dashboard server
    Serve {
        /// Host to bind (default from config)
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on (default from config)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Show configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
        /// Print the configuration file path
        #[arg(long)]
        path: bool,
    },
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    let config_path = match cli.config {
        Some(path) => path,
        None => config::config_path()?,
    };
    let mut config = Config::load_from(&config_path)?;
    if let Some(path) = cli.soul_file {
        config.soul.path = path;
    }

    match cli.command {
        Commands::Feedback { outcome } => {
            let data = parse_loose_json(&outcome)?;
            let mut engine = open_engine(&config)?;
            let before = engine.profile().current_knowledge.patterns_learned();
            let record = engine.add_feedback(&data)?;
            let knowledge = &engine.profile().current_knowledge;
            println!(
                "Feedback recorded: {} ({} new patterns, {} total examples)",
                record.outcome,
                knowledge.patterns_learned() - before,
                knowledge.total_learning_examples
            );
        }
        Commands::Reflect { days } => {
            let days = days.unwrap_or(config.soul.reflection_window_days);
            let mut engine = open_engine(&config)?;
            match engine.run_reflection_cycle(days)? {
                Some(analysis) => {
                    println!(
                        "Reflection complete: {:.1}% win rate over {} examples",
                        analysis.win_rate * 100.0,
                        analysis.examples_analyzed
                    );
                    println!("{}", serde_json::to_string_pretty(&analysis)?);
                }
                None => println!("No recent feedback in the last {} days.", days),
            }
        }
        Commands::Icp => {
            soul::show_recommendations(&open_engine(&config)?)?;
        }
        Commands::Stats => {
            soul::show_stats(&open_engine(&config)?)?;
        }
        Commands::Leads { count } => {
            let engine = open_engine(&config)?;
            let count = count.unwrap_or(config.leads.default_count);
            print_leads(&generate(&engine, count));
        }
        Commands::ImportCrm { file, days } => {
            let today = Local::now().date_naive();
            let outcomes = match file {
                Some(path) => crm::load_outcomes(&path)?,
                None => {
                    println!("No export file given, using sample CRM data.");
                    crm::sample_outcomes(today)
                }
            };
            let outcomes = crm::recent_outcomes(outcomes, days, today);
            let mut engine = open_engine(&config)?;
            let processed = leads::process_outcomes(&mut engine, &outcomes)?;
            println!("Processed {} CRM outcomes", processed);
        }
        Commands::AnalyzeLead { lead } => {
            let lead = parse_loose_json(&lead)?;
            let client = OllamaClient::new(&config.ollama)?;
            if !client.is_available().await {
                println!(
                    "Model server not reachable at {} (model {})",
                    config.ollama.base_url,
                    client.model()
                );
            }
            let analysis = client.analyze_lead(&lead).await;
            println!("{}", serde_json::to_string_pretty(&analysis)?);
        }
        Commands::Demo => {
            run_demo(&config)?;
        }
        Commands::Serve { host, port } => {
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            let engine = open_engine(&config)?;
            let state = crate::server::ServerState::new(config, engine)?;
            crate::server::start(&host, port, state).await?;
        }
        Commands::Config { show, path } => {
            if path {
                println!("{}", config_path.display());
            } else if show {
                config::show_config(&config, &config_path)?;
            } else {
                println!("Use --show to display configuration or --path for its location.");
            }
        }
    }

    Ok(())
}

fn open_engine(config: &Config) -> Result<SoulEngine> {
    let store = SoulStore::new(&config.soul.path).with_backup(config.soul.backup_corrupt);
    SoulEngine::with_store(store)
}

/// Parse JSON typed on a shell line, where single quotes are easier to type
fn parse_loose_json(raw: &str) -> Result<Value> {
    serde_json::from_str(&raw.replace('\'', "\"")).context("Invalid JSON input")
}

fn generate(engine: &SoulEngine, count: usize) -> Vec<Lead> {
    let sourcer = LeadSourcer::new();
    let leads = sourcer.generate_leads(count, &engine.current_recommendations());
    sourcer.score_leads(leads)
}

fn print_leads(leads: &[Lead]) {
    for lead in leads {
        println!(
            "  {} - {} ({}) | potential ${:.0} | {:.2} {}",
            lead.company_name,
            lead.industry,
            lead.company_size,
            lead.revenue_potential,
            lead.confidence_score,
            lead.recommendation
                .map(|r| r.to_string())
                .unwrap_or_default()
        );
    }
}

fn run_demo(config: &Config) -> Result<()> {
    let mut engine = open_engine(config)?;

    println!("Current system status:");
    soul::show_stats(&engine)?;

    println!("\nGenerating leads with the current ICP:");
    print_leads(&generate(&engine, 3));

    println!("\nSimulating a successful deal...");
    engine.add_feedback(&json!({
        "lead_data": {"company_size": "10-50", "industry": "SaaS", "response_time_hours": 1},
        "outcome": "won",
        "revenue": 85000,
        "intangible_signals": ["quick_response", "technical_buyer"]
    }))?;
    soul::show_recommendations(&engine)?;

    println!("\nRunning reflection cycle...");
    match engine.run_reflection_cycle(config.soul.reflection_window_days)? {
        Some(analysis) => println!("Win rate: {:.1}%", analysis.win_rate * 100.0),
        None => println!("No recent feedback to reflect on."),
    }

    println!("\nLeads after learning:");
    print_leads(&generate(&engine, 3));

    Ok(())
}
