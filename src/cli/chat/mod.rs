//! Chat command - interactive terminal conversation
//!
//! The session lives for the lifetime of the process.

use clap::Args;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::info;

use crate::domain::ConversationSession;
use crate::infrastructure::services::ChatService;

#[derive(Args, Clone, Debug)]
pub struct ChatArgs {
    /// Product the conversation is about
    #[arg(long)]
    pub product_details: Option<String>,
}

const PROMPT: &str = "> ";

pub async fn run(args: ChatArgs) -> anyhow::Result<()> {
    let config = super::bootstrap();
    let state = crate::create_app_state_with_config(&config)?;

    let mut session = ConversationSession::new();
    info!(session = %session.id(), "Chat session started");

    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();

    run_session(
        &state.chat_service,
        &mut session,
        args.product_details.as_deref(),
        stdin,
        stdout,
    )
    .await?;

    info!(session = %session.id(), turns = session.len(), "Chat session ended");
    Ok(())
}

/// Read queries line by line until EOF or `/exit`.
/// `/history` prints the transcript as the model sees it.
pub async fn run_session<R, W>(
    service: &ChatService,
    session: &mut ConversationSession,
    product_details: Option<&str>,
    input: R,
    mut output: W,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();

    loop {
        output.write_all(PROMPT.as_bytes()).await?;
        output.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        let query = line.trim();
        match query {
            "" => continue,
            "/exit" | "/quit" => break,
            "/history" => {
                output
                    .write_all(format!("{}\n", session.history_text()).as_bytes())
                    .await?;
                continue;
            }
            _ => {}
        }

        // The session records either the reply or an apology
        let _ = service.send(session, query, product_details).await;

        if let Some(turn) = session.turns().last() {
            output
                .write_all(format!("{}: {}\n", turn.speaker.label(), turn.content).as_bytes())
                .await?;
        }
    }

    output.flush().await?;
    Ok(())
}
