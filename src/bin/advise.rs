use std::process;

use advisor::commands::analyze::{self, AnalyzeArgs};
use clap::Parser;

#[derive(Debug, Parser)]
#[command(
    name = "advise",
    about = "Analyze a sales objection and generate reply scripts",
    disable_version_flag = true
)]
struct Cli {
    #[command(flatten)]
    analyze: AnalyzeArgs,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    if let Err(err) = analyze::run(cli.analyze).await {
        eprintln!("{err}");
        process::exit(1);
    }
}
