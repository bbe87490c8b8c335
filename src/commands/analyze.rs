use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use clap::Args;
use serde_json::json;
use tracing::{debug, info};

use crate::config::{self, ProfileConfig};
use crate::gemini::types::GenerateContentRequest;
use crate::gemini::{DEFAULT_MODEL, GeminiClient, normalize_model};
use crate::logging;
use crate::objection::library::DEFAULT_LIBRARY_PATH;
use crate::objection::{InputSources, PromptTemplate, assemble};
use crate::render::{self, OutputMode};

#[derive(Debug, Args, Clone)]
pub struct AnalyzeArgs {
    /// Objection text. Read from stdin when omitted and stdin is not a terminal.
    #[arg(value_name = "OBJECTION")]
    objection: Option<String>,
    /// Screenshot of the conversation (jpg, jpeg, png).
    #[arg(long, value_name = "FILE")]
    image: Option<PathBuf>,
    /// Recorded audio clip, always sent as audio/wav.
    #[arg(long, value_name = "FILE")]
    record: Option<PathBuf>,
    /// Uploaded audio file (wav, mp3, m4a, ogg).
    #[arg(long, value_name = "FILE")]
    audio: Option<PathBuf>,
    /// Declared mime type of --audio.
    #[arg(long, value_name = "MIME", requires = "audio")]
    audio_mime: Option<String>,
    #[arg(long)]
    model: Option<String>,
    #[arg(long)]
    profile: Option<String>,
    /// Instruction template; `{biblioteca}` marks where the library goes.
    #[arg(long, value_name = "FILE")]
    template: Option<PathBuf>,
    /// Reference library JSON.
    #[arg(long, value_name = "FILE")]
    library: Option<PathBuf>,
    /// Request timeout in seconds. Unbounded by default.
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,
    #[arg(long, value_name = "FORMAT")]
    output: Option<String>,
    #[arg(long)]
    json: bool,
    /// Print the request instead of sending it.
    #[arg(long)]
    dry_run: bool,
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Debug)]
struct Settings {
    model: String,
    template: PromptTemplate,
    library: PathBuf,
    timeout: Option<u64>,
    output: OutputMode,
}

pub async fn run(args: AnalyzeArgs) -> Result<(), String> {
    logging::init(args.verbose, args.quiet);

    let settings = resolve_settings(&args)?;
    let has_file_input = args.image.is_some() || args.record.is_some() || args.audio.is_some();
    let sources = InputSources {
        text: read_text(args.objection.clone(), has_file_input)?,
        image: args.image.clone(),
        recording: args.record.clone(),
        audio: args.audio.clone(),
        audio_mime: args.audio_mime.clone(),
    };

    let input = sources.select().map_err(|err| err.to_string())?;
    if !args.quiet {
        eprintln!("{}", input.preview());
    }
    let modality = input.modality();

    let api_key = if args.dry_run {
        None
    } else {
        Some(config::require_api_key()?)
    };

    let instruction = settings.template.instruction(&settings.library);
    let bundle = assemble(instruction, input);
    let client = GeminiClient::new(api_key.unwrap_or_default(), config::gemini_base_url())
        .with_timeout(settings.timeout);

    if args.dry_run {
        let body = json!({
            "dry_run": true,
            "model": normalize_model(&settings.model),
            "endpoint": client.generate_content_url(&settings.model),
            "modality": modality,
            "output": settings.output.as_str(),
            "timeout": settings.timeout,
            "request": GenerateContentRequest::from(&bundle),
        });
        println!("{body}");
        return Ok(());
    }

    info!(model = %settings.model, modality = modality.as_str(), "analyzing objection");
    let text = client
        .generate_content(&settings.model, &bundle)
        .await
        .map_err(|err| format!("Error: {err}"))?;

    match settings.output {
        OutputMode::Text => {
            println!(
                "{}",
                render::render_markdown(&text, io::stdout().is_terminal())
            );
        }
        OutputMode::Json => {
            println!(
                "{}",
                render::render_json(normalize_model(&settings.model), modality, &text)
            );
        }
    }

    Ok(())
}

fn resolve_settings(args: &AnalyzeArgs) -> Result<Settings, String> {
    let profile = match &args.profile {
        Some(name) => config::load_profile(name)?,
        None => ProfileConfig::default(),
    };

    let model = args
        .model
        .clone()
        .or_else(|| config::env_value("ADVISOR_MODEL"))
        .or(profile.model)
        .map(|model| model.trim().to_string())
        .filter(|model| !model.is_empty())
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());

    let timeout = match args.timeout {
        Some(secs) => Some(secs),
        None => match config::env_value("ADVISOR_TIMEOUT") {
            Some(raw) => Some(raw.parse::<u64>().map_err(|_| {
                format!("Invalid ADVISOR_TIMEOUT '{raw}'. Expected a number of seconds.")
            })?),
            None => profile.timeout,
        },
    };
    if timeout == Some(0) {
        return Err("Timeout must be greater than 0.".to_string());
    }

    let output = if args.json {
        OutputMode::Json
    } else {
        match args
            .output
            .clone()
            .or_else(|| config::env_value("ADVISOR_OUTPUT"))
            .or(profile.output)
        {
            Some(raw) => OutputMode::parse(&raw)?,
            None => OutputMode::Text,
        }
    };

    let template = match args
        .template
        .clone()
        .or_else(|| config::env_value("ADVISOR_TEMPLATE").map(PathBuf::from))
        .or(profile.template)
    {
        Some(path) => PromptTemplate::load(&path)?,
        None => PromptTemplate::builtin(),
    };

    let library = args
        .library
        .clone()
        .or_else(|| config::env_value("ADVISOR_LIBRARY").map(PathBuf::from))
        .or(profile.library)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LIBRARY_PATH));

    debug!(
        %model,
        ?timeout,
        output = output.as_str(),
        library = %library.display(),
        "resolved settings"
    );

    Ok(Settings {
        model,
        template,
        library,
        timeout,
        output,
    })
}

/// The positional argument wins over stdin.
///
/// Stdin is only consulted when no file input was given, so a parent that
/// keeps the pipe open cannot block an image or audio run.
fn read_text(argument: Option<String>, has_file_input: bool) -> Result<Option<String>, String> {
    if argument.is_some() {
        return Ok(argument);
    }

    let stdin = io::stdin();
    if has_file_input || stdin.is_terminal() {
        return Ok(None);
    }

    let mut buffer = String::new();
    stdin
        .lock()
        .read_to_string(&mut buffer)
        .map_err(|err| format!("Failed to read objection from stdin: {err}"))?;
    Ok(Some(strip_line_ending(buffer)))
}

/// Drops the newline a shell pipe appends; the rest of the text is kept as typed.
fn strip_line_ending(mut text: String) -> String {
    if text.ends_with('\n') {
        text.pop();
        if text.ends_with('\r') {
            text.pop();
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::{read_text, strip_line_ending};

    #[test]
    fn argument_is_returned_without_touching_stdin() {
        assert_eq!(
            read_text(Some("  Vou pensar.  ".to_string()), false).unwrap(),
            Some("  Vou pensar.  ".to_string())
        );
    }

    #[test]
    fn file_input_skips_stdin() {
        assert_eq!(read_text(None, true).unwrap(), None);
    }

    #[test]
    fn only_one_trailing_line_ending_is_dropped() {
        assert_eq!(strip_line_ending("Está caro.\r\n".to_string()), "Está caro.");
        assert_eq!(strip_line_ending("linha 1\nlinha 2\n\n".to_string()), "linha 1\nlinha 2\n");
        assert_eq!(strip_line_ending("  sem quebra  ".to_string()), "  sem quebra  ");
    }
}
