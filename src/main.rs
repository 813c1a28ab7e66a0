mod api;
mod config;
mod criteria;
mod debounce;
mod error;
mod filter;
mod logging;
mod models;
mod normalize;
mod paginate;
mod retrieval;
mod session;
mod sort;
mod tui;

#[cfg(test)]
mod fixtures;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use api::{HttpJobSource, JobSource};
use config::Config;
use criteria::{PageSize, SortKey};
use logging::LogTarget;
use models::JobType;
use session::{SearchSession, NO_JOBS_MESSAGE};

#[derive(Parser)]
#[command(name = "jobscout")]
#[command(about = "Find jobs by resume match or live search, then filter, sort and page through them")]
struct Cli {
    /// Config file (default: platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List saved profiles (resumes)
    Profiles,

    /// Fetch jobs once and print a page
    Search {
        #[command(flatten)]
        acquire: AcquireArgs,

        #[command(flatten)]
        refine: RefineArgs,

        /// Page to show (clamped to the available range)
        #[arg(long, default_value = "1", allow_negative_numbers = true)]
        page: i64,

        /// Print a short description under each job
        #[arg(short, long)]
        details: bool,
    },

    /// Browse jobs interactively
    Browse,
}

#[derive(Args)]
struct AcquireArgs {
    /// Use live search even when profiles exist
    #[arg(long, conflicts_with = "profile")]
    live: bool,

    /// Match against this profile ID instead of the first one
    #[arg(long)]
    profile: Option<i64>,

    /// Minimum match threshold (0.0 - 1.0)
    #[arg(long)]
    threshold: Option<f64>,
}

#[derive(Args)]
struct RefineArgs {
    /// Text to look for in title, company or description
    #[arg(short, long)]
    query: Option<String>,

    /// Location substring
    #[arg(short, long)]
    location: Option<String>,

    /// Job type (full_time, part_time, contract, internship, remote)
    #[arg(short = 't', long)]
    job_type: Option<JobType>,

    /// Minimum salary
    #[arg(long)]
    min_salary: Option<String>,

    /// Only show these sources (repeatable)
    #[arg(short, long)]
    source: Vec<String>,

    /// Sort by (match, newest, salary)
    #[arg(long, default_value = "match")]
    sort: SortKey,

    /// Results per page (6, 12, 24)
    #[arg(long)]
    page_size: Option<PageSize>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let target = match cli.command {
        Commands::Browse => LogTarget::File(logging::default_log_file()),
        _ => LogTarget::Stderr,
    };
    logging::init(cli.verbose, target)?;

    let config = Config::load(cli.config.as_deref())?;
    let source = HttpJobSource::new(&config)?;

    match cli.command {
        Commands::Profiles => {
            let profiles = source
                .list_profiles()
                .map_err(|e| anyhow::anyhow!("Failed to load profiles: {}", e))?;
            if profiles.is_empty() {
                println!("No profiles found.");
            } else {
                println!("{:<6} {:<30} {:<8} {:<10}", "ID", "TITLE", "ACTIVE", "CREATED");
                println!("{}", "-".repeat(58));
                for profile in profiles {
                    println!(
                        "{:<6} {:<30} {:<8} {:<10}",
                        profile.id,
                        truncate(&profile.title, 28),
                        if profile.is_active { "yes" } else { "no" },
                        profile
                            .created_at
                            .map(|at| at.format("%Y-%m-%d").to_string())
                            .unwrap_or_else(|| "-".to_string())
                    );
                }
            }
        }

        Commands::Search {
            acquire,
            refine,
            page,
            details,
        } => {
            let mut session = SearchSession::new(config.session_settings());
            apply_refinements(&mut session, refine);

            if let Some(threshold) = acquire.threshold {
                session.set_threshold(threshold);
            }
            let mut ticket = session.mount(&source);
            if let Some(id) = acquire.profile {
                session.select_profile(id);
                ticket = session.set_use_profile(true);
            } else if acquire.live {
                ticket = session.set_use_profile(false);
            }

            session.resolve(&source, ticket);
            ensure_fetched(&session)?;
            session.set_page(page);
            print_page(&session, details);
        }

        Commands::Browse => {
            let session = SearchSession::new(config.session_settings());
            let source: Arc<dyn JobSource> = Arc::new(source);
            tui::run_browse(source, session)?;
        }
    }

    Ok(())
}

fn apply_refinements(session: &mut SearchSession, refine: RefineArgs) {
    let mut draft = session.draft().clone();
    if let Some(query) = refine.query {
        draft.query = query;
    }
    if let Some(location) = refine.location {
        draft.location = location;
    }
    if let Some(min_salary) = refine.min_salary {
        draft.min_salary = min_salary;
    }
    session.commit_text(draft);
    session.set_job_type(refine.job_type);
    session.set_sources(refine.source);
    session.set_sort(refine.sort);
    if let Some(size) = refine.page_size {
        session.set_page_size(size);
    }
}

/// A one-shot search has no retry loop, so a failed fetch ends the run.
fn ensure_fetched(session: &SearchSession) -> Result<()> {
    match session.error_message() {
        Some(message) => Err(anyhow::anyhow!("{}", message)),
        None => Ok(()),
    }
}

fn print_page(session: &SearchSession, details: bool) {
    if session.dropped() > 0 {
        eprintln!("Skipped {} postings without an id or link.", session.dropped());
    }
    if let Some(mode) = session.mode() {
        println!("Mode: {}", mode.label());
    }
    if session.records().is_empty() {
        println!("{}.", NO_JOBS_MESSAGE);
        return;
    }
    let sources = session.source_options();
    if !sources.is_empty() {
        println!("Sources: {}", sources.join(", "));
    }

    let view = session.page();
    println!(
        "{:<6} {:<28} {:<18} {:<18} {:<10} {:>18} {:>6}",
        "ID", "TITLE", "COMPANY", "LOCATION", "TYPE", "PAY RANGE", "MATCH"
    );
    println!("{}", "-".repeat(110));
    for job in &view.items {
        let id = job
            .id()
            .map(|id| id.to_string())
            .unwrap_or_else(|| "ext".to_string());
        let score = job
            .match_score
            .filter(|s| *s > 0.0)
            .map(|s| format!("{}%", s.round() as i64))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<6} {:<28} {:<18} {:<18} {:<10} {:>18} {:>6}",
            id,
            truncate(&job.title, 26),
            truncate(&job.company_name, 16),
            truncate(&job.location, 16),
            job.job_type.badge(),
            job.salary_range().unwrap_or_else(|| "-".to_string()),
            score
        );
        if details && !job.description.is_empty() {
            println!("       {}", job.description_preview());
        }
    }

    let mut hints = Vec::new();
    if view.has_prev {
        hints.push(format!("--page {} for previous", view.page - 1));
    }
    if view.has_next {
        hints.push(format!("--page {} for next", view.page + 1));
    }
    println!(
        "\nPage {} of {} - {} jobs",
        view.page, view.total_pages, view.total_matches
    );
    if !hints.is_empty() {
        println!("({})", hints.join(", "));
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
