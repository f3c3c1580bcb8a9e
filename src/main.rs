//! quizfolio - Main CLI Entry Point

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use quizfolio::{
    agent::Agent,
    chat::{Chain, ChatHistory, ChatMessage, ChatSession, HistoryStore, PromptTemplate, Role},
    cli::{parse_vars, Args, Commands, Config, Secrets, Verbosity},
    display::DisplayManager,
    gemini::GeminiClient,
    model::TextModel,
    pipeline::run_portfolio,
    retrieval::{self, VectorStore},
    server,
    telemetry::{init_logging, TelemetryCollector, TelemetryDisplay},
    tools::ToolRegistry,
};
use std::collections::HashMap;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::AsyncReadExt;

/// Characters of a search hit shown in the listing
const SNIPPET_CHARS: usize = 200;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::load(args.config.as_deref())?;
    let secrets = Secrets::from_env();

    let verbosity = args.verbosity();
    init_logging(verbosity.log_level().unwrap_or(&config.telemetry.log_level));
    if !config.telemetry.color_output {
        colored::control::set_override(false);
    }

    let mut display =
        DisplayManager::new(verbosity.show_progress() && config.telemetry.show_progress_bars);

    if let Err(e) = run(args, config, secrets, verbosity, &mut display).await {
        display.finish_current();
        display.show_error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}

async fn run(
    args: Args,
    config: Config,
    mut secrets: Secrets,
    verbosity: Verbosity,
    display: &mut DisplayManager,
) -> Result<()> {
    match args.command {
        Commands::Report {
            text,
            input,
            output,
            no_enhance,
            no_pdf,
        } => {
            let mut config = config;
            if let Some(dir) = output {
                config.report.output_dir = dir.display().to_string();
            }
            if no_enhance {
                config.report.enhance = false;
            }
            if no_pdf {
                config.report.pdf_converter = None;
            }

            let quiz = read_quiz(text, input).await?;
            if secrets.paasa_bearer_token.is_none() {
                secrets.paasa_bearer_token = prompt_token()?;
            }

            run_report(&quiz, &config, &secrets, verbosity, display).await
        }
        Commands::Ask { prompt, system } => {
            let model = gemini(&config, &secrets)?;
            let mut messages = Vec::new();
            if let Some(system) = system {
                messages.push(ChatMessage::system(system));
            }
            messages.push(ChatMessage::human(prompt));

            model
                .stream(&messages, &mut |chunk| display.stream_token(chunk))
                .await?;
            println!();
            Ok(())
        }
        Commands::Chat {
            session,
            stream,
            reset,
        } => {
            let model = gemini(&config, &secrets)?;
            let history = ChatHistory::with_capacity(config.chat.max_messages)
                .with_system(config.chat.system_prompt.clone());
            let mut chat = ChatSession::new(model, history).with_streaming(stream);

            if let Some(session_id) = session {
                let store = HistoryStore::new(config.history_dir(), &config.chat.collection, &session_id)?;
                if reset {
                    store.clear()?;
                    display.show_info(&format!("Cleared session '{}'", session_id));
                }
                chat = chat.with_store(store)?;
            }

            chat.run_interactive().await?;
            Ok(())
        }
        Commands::Chain { system, human, vars } => {
            let mut messages = Vec::new();
            if let Some(system) = system {
                messages.push((Role::System, system));
            }
            messages.push((Role::Human, human));

            let template = PromptTemplate::from_messages(&messages)?;
            let vars: HashMap<String, String> = parse_vars(&vars)
                .map_err(anyhow::Error::msg)?
                .into_iter()
                .collect();

            let chain = Chain::new(template, gemini(&config, &secrets)?);
            println!("{}", chain.invoke(&vars).await?);
            Ok(())
        }
        Commands::Agent {
            question,
            max_iterations,
        } => {
            let tools = ToolRegistry::with_defaults(&config.tools, secrets.serper_api_key.clone());
            let agent = Agent::new(gemini(&config, &secrets)?, tools)
                .with_max_iterations(max_iterations.unwrap_or(config.agent.max_iterations));

            let show_steps = verbosity.show_events();
            let outcome = agent
                .run_with(&question, &mut |step| {
                    if show_steps {
                        display.show_agent_step(step);
                    }
                })
                .await?;

            display.show_section("Answer");
            println!("{}", outcome.answer);
            display.show_info(&format!(
                "{} iterations, {} tool calls",
                outcome.iterations, outcome.tool_calls
            ));
            Ok(())
        }
        Commands::Ingest { paths, collection } => {
            let embedder = gemini(&config, &secrets)?;
            let store = vector_store(&config, collection)?;

            display.start_stage(&format!("Ingesting {} file(s)", paths.len()));
            let started = std::time::Instant::now();
            let report = retrieval::ingest(&embedder, &store, &paths, config.vector.chunk_size).await?;
            display.finish_with_success(
                &format!(
                    "{} file(s), {} chunk(s) into '{}'",
                    report.files,
                    report.chunks,
                    store.collection()
                ),
                started.elapsed(),
            );

            for (source, reason) in &report.skipped {
                display.show_warning(&format!("skipped {}: {}", source, reason));
            }
            Ok(())
        }
        Commands::Search {
            query,
            top_k,
            collection,
        } => {
            let embedder = gemini(&config, &secrets)?;
            let store = vector_store(&config, collection)?;
            let hits = retrieval::search(&embedder, &store, &query, top_k).await?;

            if hits.is_empty() {
                println!("No matching documents.");
                return Ok(());
            }

            display.show_section(&format!("Results for \"{}\"", query));
            for hit in hits {
                let snippet: String = hit.document.chars().take(SNIPPET_CHARS).collect();
                println!(
                    "{} {}",
                    format!("[{:.3}]", hit.score).cyan(),
                    hit.source.bold()
                );
                println!("  {}\n", snippet.replace('\n', " "));
            }
            Ok(())
        }
        Commands::Serve { bind } => {
            let model: Arc<dyn TextModel> = Arc::new(gemini(&config, &secrets)?);
            let bind = bind.unwrap_or_else(|| config.server.bind.clone());
            display.show_info(&format!("Listening on http://{}", bind));
            server::serve(&bind, model).await?;
            Ok(())
        }
        Commands::Config => show_config(&config, &secrets, args.config.as_deref()),
    }
}

async fn run_report(
    quiz: &str,
    config: &Config,
    secrets: &Secrets,
    verbosity: Verbosity,
    display: &mut DisplayManager,
) -> Result<()> {
    // Banner, profile, summary and warnings are shown as the pipeline runs
    let telemetry = TelemetryCollector::new();
    let outcome = run_portfolio(quiz, config, secrets, telemetry.clone(), display).await?;
    display.show_outputs(outcome.number, &outcome.output, outcome.pdf.as_deref());

    TelemetryDisplay::new(telemetry, verbosity).display_summary();
    Ok(())
}

/// Quiz text from the argument, `--input` file, or stdin
async fn read_quiz(text: Option<String>, input: Option<PathBuf>) -> Result<String> {
    if let Some(text) = text {
        return Ok(text);
    }

    if let Some(path) = input {
        return tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("failed to read quiz input {}", path.display()));
    }

    if std::io::stdin().is_terminal() {
        eprintln!("Paste the quiz answers, then press Ctrl-D:");
    }
    let mut buffer = String::new();
    tokio::io::stdin()
        .read_to_string(&mut buffer)
        .await
        .context("failed to read quiz input from stdin")?;
    Ok(buffer)
}

/// Ask for the bearer token when running interactively
fn prompt_token() -> Result<Option<String>> {
    if !std::io::stdin().is_terminal() {
        return Ok(None);
    }

    let mut editor = rustyline::DefaultEditor::new()?;
    let token = editor.readline("PAASA bearer token: ")?;
    let token = token.trim();
    Ok((!token.is_empty()).then(|| token.to_string()))
}

fn gemini(config: &Config, secrets: &Secrets) -> Result<GeminiClient> {
    let key = secrets.require_gemini_key()?;
    Ok(GeminiClient::from_config(&config.gemini, key)?)
}

fn vector_store(config: &Config, collection: Option<String>) -> Result<VectorStore> {
    let collection = collection.unwrap_or_else(|| config.vector.collection.clone());
    Ok(VectorStore::new(
        &config.vector.qdrant_url,
        &collection,
        config.vector.dimension,
        config.vector.score_threshold,
    )?)
}

fn show_config(config: &Config, secrets: &Secrets, path: Option<&std::path::Path>) -> Result<()> {
    let source = path
        .map(|p| p.display().to_string())
        .or_else(|| Config::default_path().map(|p| p.display().to_string()))
        .unwrap_or_else(|| "(built-in defaults)".to_string());

    println!("{} {}\n", "Configuration:".bold(), source);
    println!("{}", toml::to_string_pretty(config).context("failed to serialize config")?);

    println!("{}", "Secrets:".bold());
    println!("  GEMINI_API_KEY:     {}", Secrets::masked(&secrets.gemini_api_key));
    println!("  PAASA_BEARER_TOKEN: {}", Secrets::masked(&secrets.paasa_bearer_token));
    println!(
        "  PAASA_API_BASE:     {}",
        secrets.paasa_api_base.as_deref().unwrap_or("(not set)")
    );
    println!("  SERPER_API_KEY:     {}", Secrets::masked(&secrets.serper_api_key));
    Ok(())
}
