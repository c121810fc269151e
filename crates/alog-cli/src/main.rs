#![forbid(unsafe_code)]

mod cmd;
mod output;
mod user;

use alog_core::config;
use clap::{CommandFactory, Parser, Subcommand};
use output::{CliError, OutputMode, render_error};
use std::env;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    name = "alog",
    author,
    version,
    about = "alog: Adventurers League log tracker",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Output format.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Act as this user (id or email); overrides ALOG_USER.
    #[arg(long, global = true)]
    user: Option<String>,

    /// Suppress non-essential output.
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Setup",
        about = "Initialize an alog project",
        long_about = "Create .alog/ with the store and a default config in the current directory.",
        after_help = "EXAMPLES:\n    # Initialize a project in the current directory\n    alog init"
    )]
    Init(cmd::init::InitArgs),

    #[command(
        next_help_heading = "Setup",
        about = "Manage users",
        after_help = "EXAMPLES:\n    # Register yourself\n    alog user add --name \"Avery\" --email avery@example.com\n\n    # Show the acting user\n    alog user show"
    )]
    User {
        #[command(subcommand)]
        command: cmd::user::UserCommand,
    },

    #[command(
        next_help_heading = "Records",
        about = "Manage characters",
        after_help = "EXAMPLES:\n    # Create a character\n    alog character create \"Brisk Underbough\" --race Halfling --class Rogue\n\n    # Show totals, holdings and logs\n    alog character show Brisk"
    )]
    Character {
        #[command(subcommand)]
        command: cmd::character::CharacterCommand,
    },

    #[command(
        next_help_heading = "Records",
        about = "Record and inspect logs",
        after_help = "EXAMPLES:\n    # Record a session\n    alog log add --character Brisk --name \"DDAL05-01\" --date 2024-03-01 --xp 450 --gold 120 --magic-item \"Cloak of Elvenkind\"\n\n    # Lose an item\n    alog log add --character Brisk --name \"Sold the cloak\" --lose \"Cloak of Elvenkind\"\n\n    # Record a session you ran\n    alog log add --dm-log --name \"Ran DDAL05-02\" --acp 4"
    )]
    Log {
        #[command(subcommand)]
        command: cmd::log::LogCommand,
    },

    #[command(
        next_help_heading = "Records",
        about = "Manage dungeon masters",
        after_help = "EXAMPLES:\n    # Add a DM\n    alog dm add \"Rowan Ashford\" --dci 8675309\n\n    # List DMs with log counts\n    alog dm list"
    )]
    Dm {
        #[command(subcommand)]
        command: cmd::dm::DmCommand,
    },

    #[command(
        next_help_heading = "Read",
        about = "List a character's magic items or story awards",
        long_about = "List the items a character holds, optionally as of a log in its history.",
        after_help = "EXAMPLES:\n    # Current magic items\n    alog items Brisk\n\n    # Story awards held right after a log\n    alog items Brisk --awards --through lg-abc123"
    )]
    Items(cmd::items::ItemsArgs),

    #[command(
        next_help_heading = "Read",
        about = "Show a character's totals, level and tier",
        after_help = "EXAMPLES:\n    # Current totals\n    alog summary Brisk\n\n    # Totals before a log\n    alog summary Brisk --before lg-abc123"
    )]
    Summary(cmd::summary::SummaryArgs),

    #[command(
        next_help_heading = "Read",
        about = "Search characters, logs and dungeon masters",
        after_help = "EXAMPLES:\n    # Find anything mentioning a ring\n    alog search ring\n\n    # Phrase search\n    alog search '\"bag of holding\"'"
    )]
    Search(cmd::search::SearchArgs),

    #[command(
        next_help_heading = "Read",
        about = "Export everything you own as JSON",
        after_help = "EXAMPLES:\n    # Export to a file\n    alog export --output alog-export.json"
    )]
    Export(cmd::export::ExportArgs),

    #[command(
        next_help_heading = "Setup",
        about = "Generate shell completion scripts",
        after_help = "EXAMPLES:\n    # Generate bash completions\n    alog completions bash"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("ALOG_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "alog=debug,info"
        } else {
            "alog=info,warn"
        })
    });

    let format = env::var("ALOG_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn dispatch(cli: &Cli, ctx: &cmd::Context) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Init(args) => cmd::init::run_init(args, &ctx.project_root, ctx.output, ctx.quiet),
        Commands::User { command } => cmd::user::run_user(command, ctx),
        Commands::Character { command } => cmd::character::run_character(command, ctx),
        Commands::Log { command } => cmd::log::run_log(command, ctx),
        Commands::Dm { command } => cmd::dm::run_dm(command, ctx),
        Commands::Items(args) => cmd::items::run_items(args, ctx),
        Commands::Summary(args) => cmd::summary::run_summary(args, ctx),
        Commands::Search(args) => cmd::search::run_search(args, ctx),
        Commands::Export(args) => cmd::export::run_export(args, ctx),
        Commands::Completions(args) => {
            let mut command = Cli::command();
            cmd::completions::run_completions(args, &mut command)
        }
    }
}

fn build_context(cli: &Cli) -> anyhow::Result<cmd::Context> {
    let project_root = env::current_dir()?;
    let effective = config::resolve_config(&project_root, cli.format.map(OutputMode::as_str), cli.json)?;
    Ok(cmd::Context {
        output: OutputMode::from_resolved(&effective.resolved_output),
        quiet: cli.quiet,
        user_flag: cli.user.clone(),
        config: effective,
        project_root,
    })
}

fn fail(mode: OutputMode, err: &anyhow::Error) -> ExitCode {
    if render_error(mode, &CliError::from_anyhow(err)).is_err() {
        eprintln!("error: {err:#}");
    }
    tracing::debug!(error = %format!("{err:#}"), "command failed");
    ExitCode::FAILURE
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.verbose {
        info!("verbose mode enabled");
    }

    let ctx = match build_context(&cli) {
        Ok(ctx) => ctx,
        Err(e) => {
            let mode = cli
                .format
                .unwrap_or(if cli.json { OutputMode::Json } else { OutputMode::Text });
            return fail(mode, &e);
        }
    };

    match dispatch(&cli, &ctx) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => fail(ctx.output, &e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_flag_parses_before_and_after_subcommand() {
        let cli = Cli::parse_from(["alog", "--json", "dm", "list"]);
        assert!(cli.json);
        let cli = Cli::parse_from(["alog", "dm", "list", "--json"]);
        assert!(cli.json);
    }

    #[test]
    fn format_flag_parses() {
        let cli = Cli::parse_from(["alog", "character", "list", "--format", "text"]);
        assert_eq!(cli.format, Some(OutputMode::Text));
        assert!(Cli::try_parse_from(["alog", "character", "list", "--format", "yaml"]).is_err());
    }

    #[test]
    fn user_flag_is_global() {
        let cli = Cli::parse_from(["alog", "items", "Brisk", "--user", "avery@example.com"]);
        assert_eq!(cli.user.as_deref(), Some("avery@example.com"));
    }

    #[test]
    fn quiet_flag_parsed() {
        let cli = Cli::parse_from(["alog", "-q", "init"]);
        assert!(cli.quiet);
    }

    #[test]
    fn log_add_collects_repeated_items() {
        let cli = Cli::parse_from([
            "alog",
            "log",
            "add",
            "--name",
            "DDAL05-01",
            "--character",
            "Brisk",
            "--magic-item",
            "Cloak of Elvenkind",
            "--magic-item",
            "Potion of Healing",
            "--story-award",
            "Friend of Chult",
            "--lose",
            "it-abc",
            "--gold",
            "-12.5",
        ]);
        let Commands::Log {
            command: cmd::log::LogCommand::Add(args),
        } = cli.command
        else {
            panic!("expected log add");
        };
        assert_eq!(args.fields.magic_items.len(), 2);
        assert_eq!(args.fields.story_awards, ["Friend of Chult"]);
        assert_eq!(args.fields.lose, ["it-abc"]);
        assert_eq!(args.fields.gold, Some(-12.5));
    }

    #[test]
    fn log_list_needs_a_scope() {
        assert!(Cli::try_parse_from(["alog", "log", "list"]).is_err());
        assert!(Cli::try_parse_from(["alog", "log", "list", "--dm"]).is_ok());
        assert!(Cli::try_parse_from(["alog", "log", "list", "--character", "Brisk"]).is_ok());
    }

    #[test]
    fn log_edit_detach_conflicts_with_character() {
        assert!(
            Cli::try_parse_from(["alog", "log", "edit", "lg-1", "--detach", "--character", "Brisk"])
                .is_err()
        );
    }

    #[test]
    fn completions_subcommand_parses() {
        let cli = Cli::parse_from(["alog", "completions", "bash"]);
        assert!(matches!(
            cli.command,
            Commands::Completions(cmd::completions::CompletionsArgs {
                shell: clap_complete::Shell::Bash,
            })
        ));
    }

    #[test]
    fn completions_cover_every_subcommand() {
        let mut script = Vec::new();
        cmd::completions::write_completions(clap_complete::Shell::Bash, &mut Cli::command(), &mut script)
            .expect("generate");
        let script = String::from_utf8(script).expect("utf8");
        assert!(script.contains("_alog()"));
        for sub in ["character", "log", "dm", "items", "summary", "search", "export"] {
            assert!(script.contains(sub), "missing {sub}");
        }
        assert!(script.contains("--magic-item"));
    }

    #[test]
    fn all_subcommands_parse() {
        let subcommands = [
            vec!["alog", "init"],
            vec!["alog", "user", "add", "--name", "A", "--email", "a@example.com"],
            vec!["alog", "user", "list"],
            vec!["alog", "user", "show"],
            vec!["alog", "character", "create", "Brisk"],
            vec!["alog", "character", "list"],
            vec!["alog", "character", "show", "Brisk"],
            vec!["alog", "character", "update", "Brisk", "--clear", "race,class"],
            vec!["alog", "character", "delete", "Brisk"],
            vec!["alog", "log", "add", "--name", "x", "--dm-log"],
            vec!["alog", "log", "edit", "lg-1", "--xp", "100"],
            vec!["alog", "log", "delete", "lg-1"],
            vec!["alog", "log", "show", "lg-1"],
            vec!["alog", "dm", "add", "Rowan"],
            vec!["alog", "dm", "list"],
            vec!["alog", "dm", "update", "Rowan", "--clear-dci"],
            vec!["alog", "dm", "delete", "Rowan"],
            vec!["alog", "items", "Brisk", "--before", "lg-1"],
            vec!["alog", "summary", "Brisk", "--through", "lg-1"],
            vec!["alog", "search", "bag", "of", "holding", "--limit", "5"],
            vec!["alog", "export", "--output", "out.json"],
            vec!["alog", "completions", "zsh"],
        ];
        for args in &subcommands {
            let result = Cli::try_parse_from(args.iter());
            assert!(result.is_ok(), "failed to parse {args:?}: {:?}", result.err());
        }
    }

    #[test]
    fn clap_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
