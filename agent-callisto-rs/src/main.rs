//! agent-callisto: notifications for streamed terminal output.

use std::path::PathBuf;
use std::sync::Arc;

use agent_callisto::announce::announce_now;
use agent_callisto::config::Config;
use agent_callisto::history::History;
use agent_callisto::pipeline::{summary, Announcement, Category, CategoryMatcher};
use agent_callisto::service::StreamMonitor;
use agent_callisto::sounds::SoundBank;
use clap::{Parser, Subcommand};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "agent-callisto", about = "Audio and haptic notifications for terminal output")]
#[command(version)]
struct Args {
    /// Path to config.yaml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Echo stdin to stdout and announce notable output (default)
    Watch,

    /// Run a command, tee its output and announce notable output
    Run {
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },

    /// Print the category and summary for a piece of text
    Classify { text: String },

    /// Announce text immediately, ignoring the cooldown
    Speak {
        text: String,

        /// CRITICAL, COMPLETION or APPROVAL (default: classified from text)
        #[arg(long)]
        category: Option<Category>,
    },

    /// Print the effective configuration as YAML
    Config,

    /// Inspect announcement history
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
}

#[derive(Subcommand, Debug)]
enum HistoryAction {
    /// List days with recorded announcements
    Dates,

    /// Markdown report for a day (default: today)
    Report { date: Option<String> },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    agent_callisto::init_logging(args.verbose);

    let config = Config::load(args.config.as_deref());

    match args.command.unwrap_or(Commands::Watch) {
        Commands::Watch => {
            info!("agent-callisto watching stdin");
            let mut monitor = StreamMonitor::new(&config);
            monitor.watch(tokio::io::stdin(), tokio::io::stdout()).await?;
        }
        Commands::Run { command } => {
            let (program, rest) = command
                .split_first()
                .ok_or("run requires a command")?;
            let mut monitor = StreamMonitor::new(&config);
            let code = monitor.run(program, rest).await?;
            std::process::exit(code);
        }
        Commands::Classify { text } => {
            let matcher = CategoryMatcher::with_overrides(&config.category_patterns);
            let category = matcher.classify(&text);
            let label = category.map_or("NONE", Category::as_str);
            println!("{label}\t{}", summary::extract(&text, category));
        }
        Commands::Speak { text, category } => {
            let category = category
                .or_else(|| CategoryMatcher::with_overrides(&config.category_patterns).classify(&text))
                .unwrap_or(Category::Completion);
            let bank = Arc::new(SoundBank::load(&config.sounds.resolved_dir()));
            if let Some(handle) = announce_now(&config, bank, Announcement::new(category, text)) {
                handle.await?;
            }
        }
        Commands::Config => {
            print!("{}", serde_yml::to_string(&config)?);
        }
        Commands::History { action } => {
            let history = History::at(config.history.dir.clone());
            match action {
                HistoryAction::Dates => {
                    for date in history.dates() {
                        println!("{date}");
                    }
                }
                HistoryAction::Report { date } => {
                    let date =
                        date.unwrap_or_else(|| chrono::Local::now().format("%Y-%m-%d").to_string());
                    println!("{}", history.report(&date));
                }
            }
        }
    }

    Ok(())
}
