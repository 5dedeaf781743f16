//! Gronckle command line front end.
//!
//! Logs go to stderr (set `RUST_LOG=debug` to see intents and scores);
//! replies and listings go to stdout.

use clap::{Parser, Subcommand};
use colored::Colorize;
use gronckle::browse::{category_counts, filter_and_sort, BrowseFilters, CategoryFilter, SortBy, TypeFilter};
use gronckle::catalog::{Category, NewSubmission, Submission, SubmissionStatus};
use gronckle::chat::{Assistant, ChatSession, CLEARED, EXAMPLE_PROMPTS};
use gronckle::community::{
    filter_submissions, submit, top_contenders, Actor, ReviewDesk, Role, StatusFilter, Vote,
    REVIEW_THRESHOLD, TOP_CONTENDERS,
};
use gronckle::config::Config;
use gronckle::error::GronckleError;
use gronckle::store::{import_entries, CatalogStore, CozoStore};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::{debug, error, info};

#[derive(Parser, Debug)]
#[command(name = "gronckle", version, about = "Discover, rank and curate developer tools")]
struct Cli {
    /// Catalog database path (overrides the config file)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Config file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ask the gem finder a single question
    Ask {
        #[arg(required = true)]
        query: Vec<String>,
    },

    /// Interactive gem finder (/clear resets, /quit exits)
    Chat,

    /// List gems with the browse page filters
    Browse {
        #[arg(long, short, default_value = "")]
        query: String,
        #[arg(long, short, default_value = "all")]
        category: CategoryFilter,
        #[arg(long = "type", default_value = "all")]
        type_filter: TypeFilter,
        #[arg(long, short, default_value = "popular")]
        sort: SortBy,
    },

    /// Load gems from a JSON array
    Import { file: PathBuf },

    /// Gem counts per category
    Stats,

    /// Propose a new gem
    Submit {
        #[arg(long)]
        name: String,
        #[arg(long)]
        url: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        category: Category,
        #[arg(long = "tag")]
        tags: Vec<String>,
        #[arg(long)]
        github_url: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long = "by")]
        submitted_by: String,
    },

    /// List community submissions
    Submissions {
        #[arg(long, default_value = "all")]
        status: StatusFilter,
        /// Show the most-voted contenders and their progress to review
        #[arg(long)]
        top: bool,
    },

    /// Vote on a submission
    Vote { id: u64, direction: Vote },

    /// Admin review of pending submissions
    Review {
        /// Reviewer name
        #[arg(long = "as", default_value = "admin")]
        reviewer: String,
        /// Assert the admin role
        #[arg(long)]
        admin: bool,
        #[command(subcommand)]
        action: ReviewAction,
    },
}

#[derive(Subcommand, Debug)]
enum ReviewAction {
    /// Show the pending queue
    List,
    /// Publish a submission as a gem
    Approve { id: u64 },
    /// Reject a submission
    Reject { id: u64 },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(Cli::parse()) {
        error!("Error: {}", e);
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), GronckleError> {
    let config = Config::load(cli.config.as_deref())?;
    let db_path = match cli.db {
        Some(path) => path,
        None => config.database_path()?,
    };
    debug!("Using catalog at {:?}", db_path);
    let store = CozoStore::open(&db_path)?;

    match cli.command {
        Command::Ask { query } => {
            let assistant = Assistant::with_config(store, config.category_table(), config.ranking.clone());
            println!("{}", assistant.respond(&query.join(" ")));
        }
        Command::Chat => {
            let assistant = Assistant::with_config(store, config.category_table(), config.ranking.clone());
            chat_loop(&assistant)?;
        }
        Command::Browse {
            query,
            category,
            type_filter,
            sort,
        } => {
            let filters = BrowseFilters {
                query,
                category,
                type_filter,
                sort_by: sort,
            };
            let gems = filter_and_sort(&store.fetch_all()?, &filters);
            println!("Showing {} gems", gems.len());
            for gem in &gems {
                let star = if gem.featured { "★ ".yellow().to_string() } else { String::new() };
                println!(
                    "\n{}{} [{}]  {} views · {} likes",
                    star,
                    gem.name.bold(),
                    gem.category,
                    gem.views,
                    gem.likes
                );
                if !gem.description.is_empty() {
                    println!("  {}", gem.description);
                }
                println!("  {}", gem.url.underline());
                if let Some(github) = gem.github_url.as_deref().filter(|u| !u.is_empty()) {
                    println!("  {}", github.dimmed());
                }
            }
        }
        Command::Import { file } => {
            let imported = import_entries(&store, &file)?;
            println!("Imported {} gems", imported.len());
        }
        Command::Stats => {
            let counts = category_counts(&store.fetch_all()?);
            println!("{} gems", counts.total.to_string().bold());
            for (category, count) in counts.per_category {
                println!("  {} {:<18} {}", category.icon(), category.name(), count);
            }
        }
        Command::Submit {
            name,
            url,
            description,
            category,
            tags,
            github_url,
            email,
            submitted_by,
        } => {
            let created = submit(
                &store,
                NewSubmission {
                    tool_name: name,
                    url,
                    description,
                    category,
                    tags,
                    github_url,
                    email,
                    submitted_by,
                },
            )?;
            println!("Submitted {} (#{}) for community review", created.tool_name, created.id);
        }
        Command::Submissions { status, top } => {
            let all = filter_submissions(&store.submissions()?, status);
            if top {
                println!("Top {} contenders ({} votes gets a review)", TOP_CONTENDERS, REVIEW_THRESHOLD);
                for (rank, contender) in top_contenders(&all, TOP_CONTENDERS).iter().enumerate() {
                    let filled = usize::from(contender.progress / 5);
                    println!(
                        "  #{} {:<24} {}/{} votes  [{}{}] {}%",
                        rank + 1,
                        contender.submission.tool_name.bold(),
                        contender.submission.votes,
                        REVIEW_THRESHOLD,
                        "#".repeat(filled).green(),
                        "-".repeat(20 - filled).dimmed(),
                        contender.progress
                    );
                }
            } else {
                for submission in &all {
                    print_submission(submission);
                }
            }
        }
        Command::Vote { id, direction } => {
            let tally = store.record_vote(id, direction)?;
            println!("{} Submission #{} now has {} votes", if direction == Vote::Up { "▲" } else { "▼" }, id, tally);
        }
        Command::Review {
            reviewer,
            admin,
            action,
        } => {
            let actor = Actor {
                name: reviewer,
                role: if admin { Role::Admin } else { Role::Member },
            };
            let desk = ReviewDesk::open(&store, actor)?;
            match action {
                ReviewAction::List => {
                    let queue = desk.queue()?;
                    if queue.is_empty() {
                        println!("No submissions waiting for review");
                    }
                    for submission in &queue {
                        print_submission(submission);
                    }
                }
                ReviewAction::Approve { id } => {
                    let gem = desk.approve(id)?;
                    println!("{} {} approved and published live as gem #{}", "✓".green(), gem.name, gem.id);
                }
                ReviewAction::Reject { id } => {
                    desk.reject(id)?;
                    println!("{} Submission #{} rejected", "✗".red(), id);
                }
            }
        }
    }

    Ok(())
}

fn chat_loop<S: CatalogStore>(assistant: &Assistant<S>) -> Result<(), GronckleError> {
    let mut session = ChatSession::new();
    session.open();
    println!("{}", session.messages()[0].content);
    for prompt in EXAMPLE_PROMPTS {
        println!("  {} {}", "•".dimmed(), prompt.dimmed());
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        print!("{} ", ">".cyan().bold());
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        match line.trim() {
            "/quit" | "/exit" => break,
            "/clear" => {
                session.clear();
                println!("{}", CLEARED);
            }
            input => {
                if let Some(reply) = session.ask(assistant, input) {
                    println!("\n{}\n", reply);
                }
            }
        }
    }

    session.close();
    info!("Chat ended after {} messages", session.messages().len());
    Ok(())
}

fn print_submission(submission: &Submission) {
    let status = match submission.status {
        SubmissionStatus::Pending => submission.status.label().yellow(),
        SubmissionStatus::Approved => submission.status.label().green(),
        SubmissionStatus::Rejected => submission.status.label().red(),
    };
    println!(
        "\n#{} {} [{}] {}  ▲{}",
        submission.id,
        submission.tool_name.bold(),
        submission.category,
        status,
        submission.votes
    );
    println!("  {}", submission.description);
    println!(
        "  {} · by {} · {}",
        submission.url.underline(),
        submission.submitted_by,
        submission.created_at.format("%Y-%m-%d %H:%M")
    );
}
