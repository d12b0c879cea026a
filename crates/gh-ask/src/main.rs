use std::io::{self, IsTerminal, Write};

use clap::Parser;
use tracing_subscriber::EnvFilter;

use gh_ask::{
    AppError, Collaborators, Console, ErrorKind, OutputMode, RuntimeConfig, SystemCollaborators,
    config::LOG_ENV, pipeline,
};

#[derive(Debug, Parser)]
#[command(
    name = "gh-ask",
    author,
    version,
    about = "Search a repository's GitHub Discussions"
)]
struct Cli {
    /// Repository to search as [HOST/]OWNER/REPO. Defaults to the current repository.
    #[arg(short = 'R', long, value_name = "OWNER/REPO")]
    repo: Option<String>,
    /// Output JSON.
    #[arg(long)]
    json: bool,
    /// Process JSON output with a jq expression (requires --json).
    #[arg(long, value_name = "EXPRESSION")]
    jq: Option<String>,
    /// Open the first matching result in a web browser.
    #[arg(long)]
    lucky: bool,
    /// Search phrase; words are joined with single spaces.
    #[arg(value_name = "PHRASE", trailing_var_arg = true)]
    terms: Vec<String>,
}

impl Cli {
    fn output_mode(&self) -> OutputMode {
        OutputMode::from_flags(self.json, self.jq.as_deref(), self.lucky)
    }
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let stdout = io::stdout();
    let is_terminal = stdout.is_terminal();
    let mut stdout = stdout.lock();
    let mut stderr = io::stderr().lock();

    if let Err(error) = run(cli, &mut stdout, &mut stderr, is_terminal) {
        let _ = stdout.flush();
        let _ = writeln!(stderr, "{}", error.diagnostic());
        std::process::exit(error.exit_code());
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_target(false)
        .try_init();
}

fn run(
    cli: Cli,
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
    is_terminal: bool,
) -> Result<(), AppError> {
    let config = RuntimeConfig::from_env()?;
    let cwd = std::env::current_dir().map_err(|error| {
        AppError::new(
            ErrorKind::Resolution,
            format!("could not determine what repo to use: {error}"),
        )
    })?;
    let table_width = config.table_width;
    let collaborators = SystemCollaborators::new(config, cwd);

    let mut console = Console {
        stdout,
        stderr,
        is_terminal,
        table_width,
    };
    run_with(cli, &collaborators, &mut console)
}

fn run_with<C>(cli: Cli, collaborators: &C, console: &mut Console<'_>) -> Result<(), AppError>
where
    C: Collaborators + ?Sized,
{
    let mode = cli.output_mode();
    let request = pipeline::build_request(collaborators, cli.repo.as_deref(), &cli.terms, mode)?;
    pipeline::execute(&request, collaborators, console)
}
