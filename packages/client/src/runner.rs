//! Interactive terminal loop.
//!
//! Two activities run side by side: the session's receive loop fills the
//! inbound buffer, and a line-reader thread feeds typed lines through a
//! channel. The foreground loop renders every buffered message as it arrives
//! and acts on each line. `/exit` (or EOF / Ctrl-C) disconnects; a closed
//! connection ends the loop as well.

use rustyline::{DefaultEditor, error::ReadlineError};
use tokio::sync::mpsc;

use crate::{
    config::ClientConfig,
    error::ClientError,
    input::Input,
    render::render,
    session::ClientSession,
};

/// Why the foreground loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// The user asked to leave
    Requested,
    /// The server side went away
    ConnectionClosed,
}

/// Connect with `config` and chat until `/exit` or the connection closes.
pub async fn run_client(config: ClientConfig) -> Result<(), ClientError> {
    let session = ClientSession::connect(&config.url(), &config.user_id).await?;

    let (line_tx, line_rx) = mpsc::unbounded_channel();
    let prompt = format!("[{}] > ", session.user_id());
    // A plain thread: a blocked readline must not hold up runtime shutdown.
    std::thread::spawn(move || read_lines(&prompt, line_tx));

    chat(session, line_rx).await?;
    Ok(())
}

/// Render inbound messages and act on `lines` until one side ends.
///
/// A closed `lines` channel counts as `/exit`. On [`Exit::Requested`] the
/// session is disconnected before returning.
pub async fn chat(
    mut session: ClientSession,
    mut lines: mpsc::UnboundedReceiver<String>,
) -> Result<Exit, ClientError> {
    let exit = loop {
        tokio::select! {
            inbound = session.recv() => match inbound {
                Some(message) => println!("{}", render(&message)),
                None => break Exit::ConnectionClosed,
            },
            line = lines.recv() => match line.as_deref().map(Input::parse) {
                Some(Input::Broadcast(text)) => session.broadcast(&text).await?,
                Some(Input::Empty) => {}
                Some(Input::Exit) | None => break Exit::Requested,
            },
        }
    };

    match exit {
        Exit::Requested => {
            tracing::info!("Closing connection...");
            session.disconnect().await?;
        }
        Exit::ConnectionClosed => tracing::info!("WebSocket client connection closed"),
    }
    Ok(exit)
}

fn read_lines(prompt: &str, lines: mpsc::UnboundedSender<String>) {
    let mut editor = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(e) => {
            tracing::error!("Failed to open terminal input: {}", e);
            return;
        }
    };

    loop {
        match editor.readline(prompt) {
            Ok(line) => {
                if let Err(e) = editor.add_history_entry(line.as_str()) {
                    tracing::debug!("History not updated: {}", e);
                }
                if lines.send(line).is_err() {
                    return;
                }
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => return,
            Err(e) => {
                tracing::error!("Failed to read input: {}", e);
                return;
            }
        }
    }
}
