mod args;
mod render;

use anyhow::{Context, Result};
use ava::capabilities::ActionDescriptor;
use ava::prompts::WELCOME_MESSAGE;
use ava::{
    ActionDispatcher, AvaConfig, InboundEvent, IntentHint, LlmProvider, MediaType, MockProvider,
    OpenAiProvider, Reply, Session, SessionManager, UploadedFile,
};
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use args::CliArgs;
use render::{print_reply, TerminalEmitter};

const HELP: &str = "Type a message, or:
  <number>        run an action from the last reply
  /upload <path>  upload a file
  /news <topic>   latest news on a topic
  /help           show this help
  /quit           leave";

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();

    // Logs go to stderr so chat output on stdout stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = Arc::new(load_config(&args)?);
    let llm: Arc<dyn LlmProvider> = if args.offline {
        tracing::info!("Running offline with the scripted provider");
        Arc::new(MockProvider::new())
    } else {
        Arc::new(OpenAiProvider::from_settings(&config.llm)?)
    };

    let dispatcher = ActionDispatcher::new(config.clone(), llm)?;
    let sessions = SessionManager::new();
    let session_id = sessions.open(Session::from_config(&config));
    let emitter = TerminalEmitter::default();

    println!("{}\n\n{}\n___", WELCOME_MESSAGE, HELP);

    let mut last_actions: Vec<ActionDescriptor> = Vec::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let event = match parse_line(line, &last_actions).await {
            Ok(Command::Quit) => break,
            Ok(Command::Help) => {
                println!("{}", HELP);
                continue;
            }
            Ok(Command::Event(event)) => event,
            Err(e) => {
                println!("{:#}", e);
                continue;
            }
        };

        let Some(session) = sessions.get(&session_id) else {
            break;
        };
        let mut session = session.lock().await;

        emitter.reset();
        match dispatcher.handle(&mut session, event, &emitter).await {
            Ok(reply) => {
                print_reply(&reply, emitter.streamed());
                last_actions = reply.actions;
            }
            Err(e) => {
                tracing::error!(error = %e, "Handler failed");
                print_reply(&Reply::text(format!("Something went wrong: {:#}", e)), false);
            }
        }
    }

    sessions.close(&session_id);
    Ok(())
}

enum Command {
    Event(InboundEvent),
    Help,
    Quit,
}

async fn parse_line(line: &str, last_actions: &[ActionDescriptor]) -> Result<Command> {
    if let Ok(number) = line.parse::<usize>() {
        let action = number
            .checked_sub(1)
            .and_then(|idx| last_actions.get(idx))
            .with_context(|| format!("There's no action [{}] on the last reply.", number))?;
        return Ok(Command::Event(InboundEvent::action(
            action.capability,
            action.value.clone(),
        )));
    }

    let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
    let command = match command {
        "/quit" | "/exit" => Command::Quit,
        "/help" => Command::Help,
        "/upload" => Command::Event(InboundEvent::Upload(read_upload(rest.trim()).await?)),
        "/news" => Command::Event(InboundEvent::Message {
            text: rest.trim().to_string(),
            intent: Some(IntentHint::LatestNews),
        }),
        _ => Command::Event(InboundEvent::message(line)),
    };
    Ok(command)
}

async fn read_upload(path: &str) -> Result<UploadedFile> {
    let path = Path::new(path);
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Could not read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());
    let mime = path
        .extension()
        .and_then(|ext| MediaType::from_extension(&ext.to_string_lossy()))
        .map(|media| media.mime().to_string())
        .unwrap_or_else(|| "application/octet-stream".to_string());

    Ok(UploadedFile { name, mime, bytes })
}

fn load_config(args: &CliArgs) -> Result<AvaConfig> {
    let mut config = match &args.config {
        Some(path) => AvaConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => AvaConfig::default(),
    };

    if let Some(model) = &args.chat_model {
        config.llm.chat_model = model.clone();
    }
    if let Some(model) = &args.action_model {
        config.llm.action_model = model.clone();
    }
    config.validate()?;
    Ok(config)
}
