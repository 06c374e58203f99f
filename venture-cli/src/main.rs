use clap::{Parser, Subcommand};
use colored::{ColoredString, Colorize};
use tracing_subscriber::EnvFilter;

use venture::client::{ClientError, SimulationClient};
use venture::report::{
    average_metrics, format_currency, growth_rate, overall_score, revenue_growth, StatusTier,
};
use venture::session::{SessionStatus, SimulationSession};
use venture::stream::DecodeEvent;
use venture::{StartupConfiguration, YearlyProgress, SIMULATION_YEARS};

const WRAP_WIDTH: usize = 88;
/// Used when `RUST_LOG` is unset. Logs go to stderr, results to stdout.
const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Parser)]
#[command(name = "venture")]
#[command(version)]
#[command(about = "Simulate a five-year startup trajectory against a venture gateway")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Simulate(SimulateArgs),
}

#[derive(Parser)]
struct SimulateArgs {
    #[arg(long, env = "VENTURE_SERVER", default_value = "http://127.0.0.1:8787")]
    server: String,

    #[arg(long)]
    sector: String,

    #[arg(long)]
    nation: String,

    #[arg(long = "pattern")]
    ai_disruption_pattern: String,

    #[arg(long)]
    business_model: String,

    #[arg(long = "team")]
    team_archetype: String,

    #[arg(long = "pitch")]
    startup_pitch: String,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Simulate(args) => simulate(args).await,
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn simulate(args: SimulateArgs) -> anyhow::Result<()> {
    let configuration = StartupConfiguration {
        sector: args.sector,
        nation: args.nation,
        ai_disruption_pattern: args.ai_disruption_pattern,
        business_model: args.business_model,
        team_archetype: args.team_archetype,
        startup_pitch: args.startup_pitch,
    };

    let client = SimulationClient::new(args.server);
    println!(
        "{} {} startup in {}",
        "Simulating".bold(),
        configuration.sector,
        configuration.nation
    );

    let session = match client
        .simulate(&configuration, |event, session| {
            if let DecodeEvent::Year(progress) = event {
                print_year(progress, session);
            }
        })
        .await
    {
        Ok(session) => session,
        Err(ClientError::Validation(details)) | Err(ClientError::Rejected { details, .. })
            if !details.is_empty() =>
        {
            for detail in &details {
                eprintln!("  {} {}: {}", "-".red(), detail.field, detail.message);
            }
            anyhow::bail!("configuration rejected");
        }
        Err(e) => return Err(e.into()),
    };

    print_summary(&session);
    match session.status() {
        SessionStatus::Completed => Ok(()),
        _ => anyhow::bail!(
            "simulation stopped after {} of {} years: {}",
            session.results().len(),
            SIMULATION_YEARS,
            session.error().unwrap_or("unknown error")
        ),
    }
}

fn tinted(value: u8) -> ColoredString {
    let text = value.to_string();
    match StatusTier::for_value(value) {
        StatusTier::Strong => text.green(),
        StatusTier::Moderate => text.yellow(),
        StatusTier::Weak => text.red(),
    }
}

fn print_list(title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    println!("  {}", title.bold());
    for item in items {
        let wrapped = textwrap::fill(
            item,
            textwrap::Options::new(WRAP_WIDTH)
                .initial_indent("    - ")
                .subsequent_indent("      "),
        );
        println!("{}", wrapped);
    }
}

fn print_year(progress: &YearlyProgress, session: &SimulationSession) {
    let m = &progress.metrics;
    let a = &progress.analysis;
    println!();
    println!(
        "{}",
        format!("Year {} / {}", progress.year, SIMULATION_YEARS)
            .bold()
            .underline()
    );
    println!(
        "  feasibility {}  desirability {}  viability {}",
        tinted(m.feasibility),
        tinted(m.desirability),
        tinted(m.viability)
    );
    println!(
        "  revenue {}  market share {:.1}%  customers {}",
        format_currency(a.revenue).cyan(),
        a.market_share,
        a.customer_base
    );
    let results = session.results();
    if results.len() > 1 {
        let previous = &results[results.len() - 2];
        println!(
            "  revenue growth vs year {} {:+.1}%",
            previous.year,
            growth_rate(a.revenue, previous.analysis.revenue)
        );
    }
    print_list("Milestones", &a.milestones);
    print_list("Challenges", &a.challenges);
    print_list("Recommendations", &a.recommendations);

    if session.results().len() < usize::from(SIMULATION_YEARS) {
        println!("{}", "  ...generating next year".dimmed());
    }
}

fn print_summary(session: &SimulationSession) {
    let (Some(average), Some(overall)) = (
        average_metrics(session.results()),
        overall_score(session.results()),
    ) else {
        return;
    };
    println!();
    println!("{}", "Summary".bold().underline());
    println!(
        "  average feasibility {}  desirability {}  viability {}",
        tinted(average.feasibility),
        tinted(average.desirability),
        tinted(average.viability)
    );
    println!(
        "  overall score {} ({})",
        tinted(overall),
        StatusTier::for_value(overall).label()
    );
    if let Some(growth) = revenue_growth(session.results()) {
        println!("  revenue growth over the run {:+.1}%", growth);
    }
    for warning in session.decode_warnings() {
        println!("  {} {}", "skipped frame:".yellow(), warning);
    }
}
