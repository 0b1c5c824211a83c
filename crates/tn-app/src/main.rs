//! Taxon navigator driver
//!
//! Wires a navigator to a hierarchy channel and a taxonomy file, then replays
//! a command script (from `--script` or stdin). Every selection the
//! navigator emits is printed to stdout as one JSON line; logs go to stderr.

mod script;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use serde::Serialize;
use tn_core::{
    ChildLoader, HierarchyChannel, NavigationStart, Navigator, NavigatorPhase, RankSequence, SelectionResult,
    SelectionSubscriber,
};
use tn_data::{CachedLoader, MemoryTaxonomy, NavigatorConfig};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use script::{parse_line, Command};

/// Command-line options
#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    taxonomy: Option<PathBuf>,
    script: Option<PathBuf>,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args> {
    let mut parsed = Args::default();
    while let Some(arg) = args.next() {
        let slot = match arg.as_str() {
            "--config" => &mut parsed.config,
            "--taxonomy" => &mut parsed.taxonomy,
            "--script" => &mut parsed.script,
            other => bail!("unknown argument '{}' (expected --config, --taxonomy or --script)", other),
        };
        let value = args.next().with_context(|| format!("{} needs a path", arg))?;
        *slot = Some(PathBuf::from(value));
    }
    Ok(parsed)
}

/// Forwards every emitted selection to the driver loop
struct Forwarder {
    tx: mpsc::UnboundedSender<SelectionResult>,
}

impl SelectionSubscriber for Forwarder {
    fn on_selection_change(&self, selection: &SelectionResult) {
        // The driver may already be shutting down
        let _ = self.tx.send(selection.clone());
    }
}

struct Session {
    navigator: Arc<Navigator>,
    channel: HierarchyChannel,
    emitted: mpsc::UnboundedReceiver<SelectionResult>,
    _forwarder: Arc<Forwarder>,
}

impl Session {
    /// Build a navigator listening on a fresh channel
    fn spawn(
        ranks: RankSequence,
        loader: Arc<dyn ChildLoader>,
        channel_capacity: usize,
    ) -> (Self, JoinHandle<()>) {
        let navigator = Arc::new(Navigator::new(ranks, loader));
        let (tx, emitted) = mpsc::unbounded_channel();
        let forwarder = Arc::new(Forwarder { tx });
        navigator.add_subscriber(forwarder.clone());

        let channel = HierarchyChannel::new(channel_capacity);
        let listener = tokio::spawn(navigator.clone().listen(channel.subscribe()));

        let session = Self {
            navigator,
            channel,
            emitted,
            _forwarder: forwarder,
        };
        (session, listener)
    }

    async fn run(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Start { level, value, label } => {
                let start = match label {
                    Some(label) => NavigationStart::new(level, value, label),
                    None => NavigationStart::unlabelled(level, value),
                };
                if self.channel.announce(start) == 0 {
                    bail!("no navigator is listening");
                }
                // The reset selection is reported before the first level loads
                if let Some(selection) = self.emitted.recv().await {
                    print_json(&selection)?;
                }
                let mut phase = self.navigator.watch_phase();
                phase.wait_for(|p| *p != NavigatorPhase::Loading).await?;
            }
            Command::Forward(value) => {
                if !self.navigator.forward(&value).await? {
                    info!("'{}' is on the last rank", value);
                }
            }
            Command::Back => {
                if !self.navigator.back() {
                    info!("Already on the first level");
                }
            }
            Command::Toggle(value) => {
                self.navigator.toggle(&value)?;
            }
            Command::Remove { level, value } => {
                if !self.navigator.remove_selected(level, &value) {
                    info!("'{}' was not selected on level {}", value, level);
                }
            }
            Command::Show => {
                print_json(&serde_json::json!({
                    "snapshot": self.navigator.snapshot(),
                    "summary": self.navigator.summary(),
                }))?;
            }
        }
        Ok(())
    }

    /// Print whatever the navigator emitted since the last call
    fn flush(&mut self) -> Result<()> {
        while let Ok(selection) = self.emitted.try_recv() {
            print_json(&selection)?;
        }
        Ok(())
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args(std::env::args().skip(1))?;

    let config = match &args.config {
        Some(path) => NavigatorConfig::load(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => NavigatorConfig::default(),
    };
    let ranks = config.rank_sequence()?;

    let taxonomy = match &args.taxonomy {
        Some(path) => MemoryTaxonomy::load(path)
            .with_context(|| format!("reading taxonomy {}", path.display()))?,
        None => {
            warn!("No --taxonomy given, every taxon will have no children");
            MemoryTaxonomy::new("empty")
        }
    };
    let loader = Arc::new(CachedLoader::new(taxonomy, config.cache_entries));

    info!("Starting taxon navigator over {} ranks", ranks.len());

    let (mut session, listener) = Session::spawn(ranks, loader, config.channel_capacity);

    let reader: Box<dyn AsyncBufRead + Unpin + Send> = match &args.script {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("opening script {}", path.display()))?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(BufReader::new(tokio::io::stdin())),
    };

    let mut lines = reader.lines();
    let mut line_no = 0;
    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        match parse_line(&line) {
            Ok(Some(command)) => {
                if let Err(e) = session.run(command).await {
                    warn!("line {}: {:#}", line_no, e);
                }
            }
            Ok(None) => {}
            Err(e) => warn!("line {}: {:#}", line_no, e),
        }
        session.flush()?;
    }

    // Closing the channel ends the listener
    drop(session);
    listener.await?;
    info!("Script finished after {} lines", line_no);
    Ok(())
}
