use anyhow::{bail, Context, Result};
use clap::Parser;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use summary_port::api::CompletionClient;
use summary_port::{
    Catalog, ChannelPort, CompletionWorker, Config, ControllerPolicy, ExtensionContext,
    ProviderScope, StateChange, SubmitEvent, SummaryObserver, SummaryProvider, SummarySnapshot,
};
use tokio::sync::{mpsc, watch};
use tracing_subscriber::EnvFilter;

/// Stream a summary of a page or transcript from an LLM endpoint.
#[derive(Debug, Parser)]
#[command(name = "summarize", version)]
struct Cli {
    /// Catalog index of the model to use
    #[arg(short, long, default_value_t = 0)]
    model: usize,

    /// Catalog index of the prompt to use
    #[arg(short, long, default_value_t = 0)]
    prompt: usize,

    /// Print the model and prompt catalogs and exit
    #[arg(long)]
    list: bool,

    /// Context file (.json is parsed, anything else is text); `-` or nothing reads stdin
    input: Option<PathBuf>,
}

impl Cli {
    fn context_path(&self) -> Option<&Path> {
        self.input
            .as_deref()
            .filter(|path| path.as_os_str() != "-")
    }
}

/// Forwards every store change so none are lost to watch coalescing.
struct ChangeForwarder(mpsc::UnboundedSender<(StateChange, SummarySnapshot)>);

impl SummaryObserver for ChangeForwarder {
    fn on_change(&self, change: StateChange, snapshot: &SummarySnapshot) {
        let _ = self.0.send((change, snapshot.clone()));
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("SUMMARY_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_context(input: Option<&Path>) -> Result<ExtensionContext> {
    match input {
        Some(path) => Ok(ExtensionContext::from_file(path)?),
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("failed to read context from stdin")?;
            Ok(ExtensionContext::ready(text))
        }
    }
}

/// Text to write so stdout shows `content`: only the new suffix when the
/// content extends what was printed, otherwise a fresh line with all of it.
fn content_update(printed: &str, content: &str) -> String {
    match content.strip_prefix(printed) {
        Some(suffix) => suffix.to_string(),
        None => format!("\n{content}"),
    }
}

fn print_catalog(catalog: &Catalog) {
    println!("models:");
    for (index, model) in catalog.models().iter().enumerate() {
        println!("  {index}: {} ({})", model.name, model.content);
    }
    println!("prompts:");
    for (index, prompt) in catalog.prompts().iter().enumerate() {
        println!("  {index}: {}", prompt.name);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = Cli::parse();
    let catalog = Catalog::builtin();
    if args.list {
        print_catalog(&catalog);
        return Ok(());
    }

    let model = catalog
        .model(args.model)
        .cloned()
        .with_context(|| format!("no model at index {}", args.model))?;
    let prompt = catalog
        .prompt(args.prompt)
        .cloned()
        .with_context(|| format!("no prompt at index {}", args.prompt))?;

    let config = Config::load()?;
    config.validate()?;
    let extension = read_context(args.context_path())?;

    let client = CompletionClient::new(&config)?;
    let (port, endpoint, inbound) = ChannelPort::open();
    tokio::spawn(CompletionWorker::new(client).run(endpoint));

    let (_extension_tx, extension_rx) = watch::channel(extension);
    let policy = ControllerPolicy {
        end_generation_on_error: config.end_generation_on_error,
    };
    let (mut provider, handle) =
        SummaryProvider::new(&catalog, port, inbound, extension_rx, policy);
    let (change_tx, mut changes) = mpsc::unbounded_channel();
    provider.add_observer(Arc::new(ChangeForwarder(change_tx)));
    tokio::spawn(provider.run());

    let scope = ProviderScope::with_summary(handle);
    let summary = scope.use_summary()?;
    summary.set_model(model)?;
    summary.set_prompt(prompt)?;
    summary.generate_summary(&mut SubmitEvent::default())?;

    let mut stdout = std::io::stdout();
    let mut printed = String::new();
    while let Some((change, snapshot)) = changes.recv().await {
        match change {
            StateChange::Content => {
                if let Some(content) = snapshot.content {
                    write!(stdout, "{}", content_update(&printed, &content))?;
                    stdout.flush()?;
                    printed = content;
                }
            }
            StateChange::Error if snapshot.is_error => {
                writeln!(stdout)?;
                bail!("summary generation failed");
            }
            StateChange::Generating if !snapshot.is_generating => {
                writeln!(stdout)?;
                return Ok(());
            }
            _ => {}
        }
    }

    bail!("summary provider stopped before the summary finished")
}
