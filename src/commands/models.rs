use clap::Args;
use tracing::info;

use crate::config;
use crate::gemini::GeminiClient;
use crate::logging;

#[derive(Debug, Args, Clone)]
pub struct ModelsArgs {
    /// Include models that cannot generate content.
    #[arg(long)]
    all: bool,
    #[arg(long)]
    json: bool,
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,
    #[arg(short, long)]
    quiet: bool,
}

/// Prints the models visible to the configured API key.
pub async fn run(args: ModelsArgs) -> Result<(), String> {
    logging::init(args.verbose, args.quiet);

    let api_key = config::require_api_key()?;
    let client = GeminiClient::new(api_key, config::gemini_base_url());

    let models = client
        .list_models()
        .await
        .map_err(|err| format!("Failed to list models: {err}"))?;
    let total = models.len();
    let models: Vec<_> = models
        .into_iter()
        .filter(|model| args.all || model.supports_generate_content())
        .collect();
    info!(total, shown = models.len(), "listed models");

    if args.json {
        let body = serde_json::to_string(&models)
            .map_err(|err| format!("Failed to encode model list: {err}"))?;
        println!("{body}");
    } else {
        for model in &models {
            println!("{}", model.name);
        }
    }

    Ok(())
}
