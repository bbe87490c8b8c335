use std::io;
use std::process;

use advisor::commands::analyze::{self, AnalyzeArgs};
use advisor::commands::config::{self, ConfigArgs};
use advisor::commands::models::{self, ModelsArgs};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, shells};

const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("ADVISOR_GIT_SHA"),
    ", built ",
    env!("ADVISOR_BUILD_TS"),
    ")"
);

const ROOT_HELP_EXAMPLES: &str = "Examples:\n  advisor analyze \"O cliente disse que a taxa está alta\"\n  advisor analyze --image print.png\n  advisor analyze --record nota.wav\n  advisor models\n  advisor config check\n  advisor completion bash > ~/.local/share/bash-completion/completions/advisor";

const ANALYZE_HELP_EXAMPLES: &str = "Examples:\n  advisor analyze \"Vou pensar e te retorno\"\n  echo \"Prefiro deixar na poupança\" | advisor analyze --json\n  advisor analyze --audio cliente.ogg --library biblioteca.json\n  advisor analyze --image print.jpg --dry-run";

#[derive(Debug, Parser)]
#[command(
    name = "advisor",
    version = VERSION,
    about = "Reply scripts for sales objections, powered by Gemini",
    after_help = ROOT_HELP_EXAMPLES
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(
        about = "Analyze an objection and generate reply scripts",
        after_help = ANALYZE_HELP_EXAMPLES
    )]
    Analyze(AnalyzeArgs),
    #[command(about = "List the models available to the API key")]
    Models(ModelsArgs),
    #[command(about = "Manage local config")]
    Config(ConfigArgs),
    #[command(about = "Generate shell completion script")]
    Completion {
        #[arg(value_enum)]
        shell: CompletionShell,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

fn print_completion(shell: CompletionShell) {
    let mut cmd = Cli::command();
    match shell {
        CompletionShell::Bash => generate(shells::Bash, &mut cmd, "advisor", &mut io::stdout()),
        CompletionShell::Zsh => generate(shells::Zsh, &mut cmd, "advisor", &mut io::stdout()),
        CompletionShell::Fish => generate(shells::Fish, &mut cmd, "advisor", &mut io::stdout()),
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Analyze(args) => analyze::run(args).await,
        Commands::Models(args) => models::run(args).await,
        Commands::Config(args) => config::run(args),
        Commands::Completion { shell } => {
            print_completion(shell);
            Ok(())
        }
    };

    if let Err(err) = result {
        eprintln!("{err}");
        process::exit(1);
    }
}
