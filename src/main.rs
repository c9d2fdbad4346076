//! Persona Interviewer - adaptive, persona-driven interview orchestrator
//!
//! Reads candidate answers from stdin, one line per turn, and persists the
//! conversation snapshot after every turn so a session can be resumed.

mod adaptive;
mod assessment;
mod llm;
mod profiling;
mod prompts;
mod report;
mod state_machine;
mod store;

use llm::{LlmConfig, ModelClient};
use state_machine::{ConversationStateMachine, Role};
use store::{FileSnapshotStore, SnapshotStore};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "persona_interviewer=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let snapshot_dir = std::env::var("INTERVIEW_SNAPSHOT_DIR").unwrap_or_else(|_| {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
        format!("{home}/.persona-interviewer/snapshots")
    });
    let conv_id = std::env::var("INTERVIEW_CONVERSATION_ID")
        .ok()
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let llm_config = LlmConfig::from_env();
    let client = ModelClient::new(llm_config.build_service());
    tracing::info!(
        backend = llm_config.selected_backend().display_name(),
        model = %client.model_id(),
        "LLM backend initialized"
    );

    let store = FileSnapshotStore::new(&snapshot_dir);
    tracing::info!(conv_id = %conv_id, dir = %snapshot_dir, "Conversation store ready");

    match store.load(&conv_id).await? {
        Some(snapshot) => {
            if snapshot.state.is_terminal() {
                println!("{}", state_machine::machine::ENDED_MESSAGE);
                return Ok(());
            }
            tracing::info!(conv_id = %conv_id, state = %snapshot.state, "Resuming conversation");
            if let Some(last) = snapshot.history.iter().rev().find(|t| t.role == Role::System) {
                println!("{}\n", last.content);
            }
        }
        None => {
            let mut machine = ConversationStateMachine::new(client.clone());
            let opening = machine.start()?;
            println!("Conversation id: {conv_id}\n\n{opening}\n");
            store.save(&conv_id, &machine.into_snapshot()).await?;
        }
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let snapshot = store.load_existing(&conv_id).await?;
        let mut machine = ConversationStateMachine::from_snapshot(snapshot, client.clone());

        let reply = machine.handle_turn(&line).await;
        println!("{}\n", reply.message);

        let snapshot = machine.into_snapshot();
        store.save(&conv_id, &snapshot).await?;
        if snapshot.state.is_terminal() {
            break;
        }
    }

    Ok(())
}
