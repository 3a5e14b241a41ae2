use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Datelike;
use clap::{Parser, Subcommand, ValueEnum};
use csr_dashboard::config::{Config, ConfigOverrides, StoreBackend};
use csr_dashboard::engine::filter::{ALL_AGES, ALL_DISTRICTS, ALL_EDUCATION_LEVELS, ALL_GENDERS};
use csr_dashboard::engine::{
    summarize, summarize_risk, DashboardState, DashboardView, FilterSpec,
};
use csr_dashboard::insights::heatmap::district_heatmap_seeded;
use csr_dashboard::insights::impact::{impact_report, report_filename};
use csr_dashboard::insights::{ContributionLedger, DonorProfile, InsightProviders};
use csr_dashboard::records::validate::{parse_insert_payload, validate_rows};
use csr_dashboard::records::{ChildRecord, Donation, DonationRequest, RecordSnapshot};
use csr_dashboard::report::csv::{
    children_to_csv, contributions_to_csv, risk_to_csv, CHILDREN_CSV_FILENAME,
};
use csr_dashboard::report::table::{
    render_aggregates_table, render_children_table, render_contributions_table,
    render_donations_table, render_forecast_table, render_heatmap_table, render_risk_table,
    render_stories_table, render_suggestions_table, render_summary_table,
};
use csr_dashboard::report::{render_json, ImpactDocument};
use csr_dashboard::server::run_server;
use csr_dashboard::store::{
    build_store, load_children, load_donations, load_success_stories, with_timeout, RecordStore,
};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const LATEST_STORIES: usize = 3;
const RETRY_HINT: &str =
    "failed to load data from the record store, check the connection and try again";

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ExportFormat {
    /// Filtered children as `children_data.csv`
    Csv,
    /// Contribution ledger as CSV
    Contributions,
    /// Paginated impact report
    Document,
}

#[derive(Debug, Parser)]
#[command(
    name = "csr-dashboard",
    about = "Child welfare analytics for CSR partners"
)]
struct Cli {
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[arg(short, long, value_enum)]
    store: Option<StoreBackend>,
    #[arg(long = "store-url")]
    store_url: Option<String>,
    #[arg(long = "sqlite-path")]
    sqlite_path: Option<String>,
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
    #[command(flatten)]
    filters: FilterArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, clap::Args, Clone, Default)]
struct FilterArgs {
    #[arg(long, global = true)]
    district: Option<String>,
    #[arg(long = "age-group", global = true)]
    age_group: Option<String>,
    #[arg(long, global = true)]
    gender: Option<String>,
    #[arg(long = "education", global = true)]
    education: Option<String>,
    #[arg(long, global = true)]
    search: Option<String>,
}

impl From<FilterArgs> for FilterSpec {
    fn from(value: FilterArgs) -> Self {
        Self {
            district: value.district.unwrap_or_else(|| ALL_DISTRICTS.to_string()),
            age_group: value.age_group.unwrap_or_else(|| ALL_AGES.to_string()),
            gender: value.gender.unwrap_or_else(|| ALL_GENDERS.to_string()),
            education_status: value
                .education
                .unwrap_or_else(|| ALL_EDUCATION_LEVELS.to_string()),
            search: value.search.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Verified children matching the filters
    Children,
    /// Headline numbers over all verified children
    Stats,
    /// Distributions by district, education, gender and age
    Charts,
    /// Children ranked by risk score
    Risk {
        #[arg(long)]
        top: Option<usize>,
    },
    /// Latest verified success stories
    Stories,
    /// Children, funding need and simulated gap per district
    Heatmap,
    /// Twelve-month funding forecast and regional needs (simulated)
    Forecast,
    /// CSR recommendations for an organisation
    Suggestions {
        #[arg(long)]
        organization: Option<String>,
    },
    /// Contribution ledger and impact figures
    Impact {
        #[arg(long)]
        organization: Option<String>,
        #[arg(long)]
        year: Option<i32>,
    },
    /// Write children CSV, contributions CSV or the impact document to a file
    Export {
        #[arg(long, value_enum, default_value_t = ExportFormat::Csv)]
        format: ExportFormat,
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long)]
        organization: Option<String>,
    },
    /// Record a donation for a donor
    Donate {
        #[arg(long)]
        donor: String,
        #[arg(long)]
        amount: f64,
        #[arg(long)]
        purpose: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Donations made by one donor, newest first
    Donations {
        #[arg(long)]
        donor: String,
    },
    /// Bulk insert children from a JSON file holding one object or an array
    Import { path: PathBuf },
    /// Run the HTTP proxy in front of the record store
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Write a config template or print the effective config
    Config {
        #[arg(long)]
        init: bool,
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load(Some(&config_path))?;
    config.apply_env();
    let (host, port) = match &cli.command {
        Commands::Serve { host, port } => (host.clone(), *port),
        _ => (None, None),
    };
    let top_n = match &cli.command {
        Commands::Risk { top } => *top,
        _ => None,
    };
    config.apply_overrides(ConfigOverrides {
        backend: cli.store,
        store_url: cli.store_url.clone(),
        sqlite_path: cli.sqlite_path.clone(),
        host,
        port,
        top_n,
    });

    if let Commands::Config { init, show } = &cli.command {
        return handle_config_command(*init, *show, &config, &config_path);
    }

    let store = build_store(&config.store)?;
    if matches!(cli.command, Commands::Serve { .. }) {
        return run_server(&config, store).await;
    }

    let timeout = config.store.timeout();
    let filters: FilterSpec = cli.filters.clone().into();
    let providers = InsightProviders::from_config(&config);

    match &cli.command {
        Commands::Children => {
            let view = load_view(store.as_ref(), &config, filters, timeout).await?;
            print_children(&view.filtered, cli.output)?;
        }
        Commands::Stats => {
            let view = load_view(store.as_ref(), &config, filters, timeout).await?;
            match cli.output {
                OutputFormat::Table => println!("{}", render_summary_table(&view.summary)),
                OutputFormat::Json => println!("{}", render_json(&view.summary)?),
                OutputFormat::Csv => {
                    warn!("CSV output for stats not implemented, using JSON");
                    println!("{}", render_json(&view.summary)?);
                }
            }
        }
        Commands::Charts => {
            let view = load_view(store.as_ref(), &config, filters, timeout).await?;
            match cli.output {
                OutputFormat::Table => println!("{}", render_aggregates_table(&view.aggregates)),
                OutputFormat::Json => println!("{}", render_json(&view.aggregates)?),
                OutputFormat::Csv => {
                    warn!("CSV output for charts not implemented, using JSON");
                    println!("{}", render_json(&view.aggregates)?);
                }
            }
        }
        Commands::Risk { .. } => {
            let view = load_view(store.as_ref(), &config, filters, timeout).await?;
            let summary = summarize_risk(&view.ranked);
            let mut ranked = view.ranked;
            ranked.truncate(config.risk.top_n);
            match cli.output {
                OutputFormat::Table => println!("{}", render_risk_table(&ranked, &summary)),
                OutputFormat::Json => println!(
                    "{}",
                    render_json(&serde_json::json!({ "summary": summary, "ranked": ranked }))?
                ),
                OutputFormat::Csv => print!("{}", risk_to_csv(&ranked)?),
            }
        }
        Commands::Stories => {
            let mut stories = load_success_stories(store.as_ref(), timeout)
                .await
                .context(RETRY_HINT)?;
            stories.truncate(LATEST_STORIES);
            match cli.output {
                OutputFormat::Table => println!("{}", render_stories_table(&stories)),
                _ => print_as_json("stories", &stories, cli.output)?,
            }
        }
        Commands::Heatmap => {
            let view = load_view(store.as_ref(), &config, filters, timeout).await?;
            let rows = district_heatmap_seeded(&view.filtered, config.forecast.seed);
            match cli.output {
                OutputFormat::Table => println!("{}", render_heatmap_table(&rows)),
                _ => print_as_json("heatmap", &rows, cli.output)?,
            }
        }
        Commands::Forecast => {
            let view = load_view(store.as_ref(), &config, filters, timeout).await?;
            let forecast = providers.forecast().forecast(&view.filtered);
            info!("forecast produced by {} provider", providers.forecast().name());
            match cli.output {
                OutputFormat::Table => println!("{}", render_forecast_table(&forecast)),
                _ => print_as_json("forecast", &forecast, cli.output)?,
            }
        }
        Commands::Suggestions { organization } => {
            let view = load_view(store.as_ref(), &config, filters, timeout).await?;
            let organization = organization
                .clone()
                .unwrap_or_else(|| config.export.organization.clone());
            let profile = DonorProfile::new("local", organization.as_str());
            let items = providers.suggestions().suggest(&profile, &view.filtered);
            match cli.output {
                OutputFormat::Table => {
                    println!("{}", render_suggestions_table(&organization, &items))
                }
                _ => print_as_json("suggestions", &items, cli.output)?,
            }
        }
        Commands::Impact { organization, year } => {
            let organization = organization
                .clone()
                .unwrap_or_else(|| config.export.organization.clone());
            let year = year.unwrap_or_else(|| chrono::Utc::now().year());
            let report = impact_report(&ContributionLedger::sample(), &organization, year);
            match cli.output {
                OutputFormat::Table => println!("{}", render_contributions_table(&report)),
                OutputFormat::Json => println!("{}", render_json(&report)?),
                OutputFormat::Csv => print!("{}", contributions_to_csv(&report)?),
            }
        }
        Commands::Export {
            format,
            out,
            organization,
        } => {
            let organization = organization
                .clone()
                .unwrap_or_else(|| config.export.organization.clone());
            run_export(
                store.as_ref(),
                &config,
                filters,
                *format,
                out.as_deref(),
                &organization,
            )
            .await?;
        }
        Commands::Donate {
            donor,
            amount,
            purpose,
            description,
        } => {
            let request = DonationRequest {
                donor_id: donor.clone(),
                amount: *amount,
                purpose: purpose.clone(),
                description: description.clone(),
            };
            let donation = record_donation(store.as_ref(), &request, timeout).await?;
            match cli.output {
                OutputFormat::Table => println!("{}", render_donations_table(&[donation])),
                _ => print_as_json("donate", &donation, cli.output)?,
            }
        }
        Commands::Donations { donor } => {
            let donations = load_donations(store.as_ref(), donor, timeout)
                .await
                .context(RETRY_HINT)?;
            match cli.output {
                OutputFormat::Table => println!("{}", render_donations_table(&donations)),
                _ => print_as_json("donations", &donations, cli.output)?,
            }
        }
        Commands::Import { path } => {
            let inserted = import_children(store.as_ref(), path, timeout).await?;
            println!("Inserted {inserted} children from {}", path.display());
        }
        Commands::Config { .. } => {}
        Commands::Serve { .. } => unreachable!("serve command handled before dispatch"),
    }

    Ok(())
}

fn handle_config_command(init: bool, show: bool, config: &Config, config_path: &Path) -> Result<()> {
    if init {
        Config::write_template(config_path)?;
        println!("Wrote config template to {}", config_path.display());
    }
    if show || !init {
        println!("{}", render_json(&config.redacted())?);
    }
    Ok(())
}

async fn load_view(
    store: &dyn RecordStore,
    config: &Config,
    filters: FilterSpec,
    timeout: Duration,
) -> Result<DashboardView> {
    let snapshot: RecordSnapshot = load_children(store, Some(true), timeout)
        .await
        .context(RETRY_HINT)?;
    if snapshot.rejected() > 0 {
        warn!("{} rows were skipped as invalid", snapshot.rejected());
    }
    let state = DashboardState::new(snapshot, config.risk_model()).with_filters(filters);
    Ok(state.view())
}

async fn run_export(
    store: &dyn RecordStore,
    config: &Config,
    filters: FilterSpec,
    format: ExportFormat,
    out: Option<&Path>,
    organization: &str,
) -> Result<()> {
    let year = chrono::Utc::now().year();
    let (default_name, body) = match format {
        ExportFormat::Csv => {
            let view = load_view(store, config, filters, config.store.timeout()).await?;
            (CHILDREN_CSV_FILENAME.to_string(), children_to_csv(&view.filtered))
        }
        ExportFormat::Contributions => {
            let report = impact_report(&ContributionLedger::sample(), organization, year);
            (
                report_filename(organization, year, "csv"),
                contributions_to_csv(&report)?,
            )
        }
        ExportFormat::Document => {
            let view = load_view(store, config, filters, config.store.timeout()).await?;
            let report = impact_report(&ContributionLedger::sample(), organization, year);
            let document = ImpactDocument::compose(
                &report,
                &summarize(&view.filtered),
                &view.aggregates,
                config.export.lines_per_page,
            );
            (report_filename(organization, year, "txt"), document.render())
        }
    };

    let path = out
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(default_name));
    tokio::fs::write(&path, body)
        .await
        .with_context(|| format!("failed writing export: {}", path.display()))?;
    println!("Exported {}", path.display());
    Ok(())
}

async fn record_donation(
    store: &dyn RecordStore,
    request: &DonationRequest,
    timeout: Duration,
) -> Result<Donation> {
    let donation = request.validate()?;
    let row = with_timeout(timeout, store.insert_donation(&donation))
        .await
        .context("failed recording donation")?;
    validate_rows::<Donation>(vec![row], "donation")
        .accepted
        .pop()
        .context("store returned an unreadable donation row")
}

async fn import_children(store: &dyn RecordStore, path: &Path, timeout: Duration) -> Result<usize> {
    let data = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed reading import file: {}", path.display()))?;
    let payload: serde_json::Value = serde_json::from_str(&data)
        .with_context(|| format!("failed parsing JSON: {}", path.display()))?;
    let batch = parse_insert_payload(payload)?;
    let inserted = with_timeout(timeout, store.insert_children(&batch))
        .await
        .context("failed inserting children")?;
    info!("imported {} children into {}", inserted.len(), store.name());
    Ok(inserted.len())
}

fn print_children(records: &[ChildRecord], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", render_children_table(records)),
        OutputFormat::Json => println!("{}", render_json(records)?),
        OutputFormat::Csv => println!("{}", children_to_csv(records)),
    }
    Ok(())
}

fn print_as_json<T: Serialize + ?Sized>(command: &str, value: &T, format: OutputFormat) -> Result<()> {
    if matches!(format, OutputFormat::Csv) {
        warn!("CSV output for {command} not implemented, using JSON");
    }
    println!("{}", render_json(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::Cli;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn every_subcommand_has_help_text() {
        let command = Cli::command();
        let undocumented = command
            .get_subcommands()
            .filter(|sub| sub.get_about().is_none())
            .map(|sub| sub.get_name().to_string())
            .collect::<Vec<_>>();
        assert!(undocumented.is_empty(), "missing help: {undocumented:?}");
    }
}
