//! Command-line interface for the DDx co-pilot.
//!
//! Rank a set of findings against the bundled knowledge base:
//!
//! ```bash
//! $ ddx-copilot rank --positive cough --positive fever --negated "runny nose"
//! ```
//!
//! Replay a scripted consultation, streaming each update:
//!
//! ```bash
//! $ ddx-copilot replay consultation.json --config copilot.yaml
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use ddx_copilot::logging::init_tracing;
use ddx_copilot::{
    Copilot, CopilotConfig, CopilotUpdate, RunSummary, ScriptedSource, TemplateElaborator,
};
use ddx_core::{EvidenceInput, KnowledgeBase, Leaderboard, PendingQuestion, RankMovement, SharedSession};

#[derive(Parser, Debug)]
#[command(name = "ddx-copilot", version, about = "Incremental differential-diagnosis co-pilot")]
struct Cli {
    /// Configuration file (YAML or JSON)
    #[arg(short, long, global = true, env = "DDX_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand, Debug)]
enum Action {
    /// Rank conditions for a fixed set of findings
    Rank {
        /// Symptom confirmed present (repeatable)
        #[arg(short, long = "positive")]
        positive: Vec<String>,

        /// Symptom ruled out (repeatable)
        #[arg(short, long = "negated")]
        negated: Vec<String>,

        /// Knowledge base file, overriding the configuration
        #[arg(long)]
        kb: Option<PathBuf>,

        /// Number of conditions to show
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },

    /// Load and validate a knowledge base file
    ValidateKb {
        path: PathBuf,
    },

    /// Replay a scripted consultation, printing every update
    Replay {
        script: PathBuf,

        /// Print updates as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Replay a scripted consultation and export the resulting session
    Export {
        script: PathBuf,

        /// Output file; stdout when omitted
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    init_tracing(&config.log_filter);

    match cli.action {
        Action::Rank {
            positive,
            negated,
            kb,
            limit,
        } => {
            let config = CopilotConfig {
                knowledge_base: kb.or(config.knowledge_base),
                ..config
            };
            let mut session = config.build_session()?;

            let inputs: Vec<EvidenceInput> = positive
                .into_iter()
                .map(EvidenceInput::positive)
                .chain(negated.into_iter().map(EvidenceInput::negated))
                .collect();
            session
                .record_batch(&inputs)
                .context("Findings rejected; nothing was recorded")?;

            print_leaderboard(session.leaderboard(), limit);
            print_question(session.pending_question());
            Ok(())
        }

        Action::ValidateKb { path } => {
            let kb = KnowledgeBase::from_path(&path)
                .with_context(|| format!("Invalid knowledge base: {}", path.display()))?;
            println!(
                "{}: {} conditions, {} symptoms",
                path.display(),
                kb.len(),
                kb.vocabulary().count()
            );
            Ok(())
        }

        Action::Replay { script, json } => {
            let output = if json { Output::Json } else { Output::Text };
            let (session, summary) = replay(&config, &script, output).await?;
            let view = session.view()?;
            println!(
                "Replayed {} events ({} rejected), leaderboard revision {}",
                summary.steps,
                summary.rejected,
                view.leaderboard.revision()
            );
            Ok(())
        }

        Action::Export { script, out } => {
            let (session, _) = replay(&config, &script, Output::Silent).await?;
            let export = session.export()?;
            match out {
                Some(path) => {
                    export
                        .write_to(&path)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("Exported session {} to {}", export.session_id, path.display());
                }
                None => println!("{}", export.to_json()?),
            }
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<CopilotConfig> {
    match path {
        Some(path) => CopilotConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(CopilotConfig::default()),
    }
}

#[derive(Clone, Copy, Debug)]
enum Output {
    Silent,
    Text,
    Json,
}

/// Drive a scripted consultation while a printer task streams the updates.
async fn replay(
    config: &CopilotConfig,
    script: &Path,
    output: Output,
) -> anyhow::Result<(SharedSession, RunSummary)> {
    let mut source = ScriptedSource::from_path(script)
        .with_context(|| format!("Failed to read script {}", script.display()))?;
    let session = SharedSession::new(config.build_session()?);
    let mut copilot = Copilot::new(
        session,
        Arc::new(TemplateElaborator),
        config.elaboration_timeout(),
    );

    let mut updates = copilot.subscribe(config.channel_capacity);
    let printer = tokio::spawn(async move {
        while let Some(update) = updates.recv().await {
            match output {
                Output::Silent => {}
                Output::Text => print_update(&update),
                Output::Json => match serde_json::to_string(&update) {
                    Ok(line) => println!("{}", line),
                    Err(e) => tracing::warn!(error = %e, "Failed to serialise update"),
                },
            }
        }
    });

    let summary = copilot.run(&mut source).await?;

    // Closing the copilot's senders ends the printer.
    let session = copilot.session().clone();
    drop(copilot);
    printer.await.context("Update printer panicked")?;

    Ok((session, summary))
}

fn print_update(update: &CopilotUpdate) {
    match update {
        CopilotUpdate::Updated { step, .. } => println!("== step {} ==", step),
        CopilotUpdate::Rejected { step, reason, .. } => {
            println!("== step {} rejected: {} ==", step, reason)
        }
    }
    print_leaderboard(update.leaderboard(), 5);
    print_question(update.question());
}

fn print_leaderboard(leaderboard: &Leaderboard, limit: usize) {
    println!(
        "{:>3}  {:<28} {:>6} {:>6} {:>5}  {:<6}  move",
        "#", "condition", "score", "prob", "conf", "susp"
    );
    for entry in leaderboard.top(limit) {
        println!(
            "{:>3}  {:<28} {:>6.3} {:>6.3} {:>5.2}  {:<6}  {}{}",
            entry.current_rank,
            entry.name,
            entry.score,
            entry.probability,
            entry.confidence,
            entry.suspicion.to_string(),
            movement_label(entry.movement()),
            if entry.needs_more_evidence { "  (needs evidence)" } else { "" }
        );
    }
}

fn print_question(question: Option<&PendingQuestion>) {
    match question {
        Some(q) => println!("Next question: {} [{}]", q.question_text, q.rationale),
        None => println!("No further questions"),
    }
}

fn movement_label(movement: RankMovement) -> String {
    match movement {
        RankMovement::New => "new".to_string(),
        RankMovement::Up(n) => format!("+{}", n),
        RankMovement::Down(n) => format!("-{}", n),
        RankMovement::Unchanged => "=".to_string(),
    }
}
