//! Connection handles and their outbound mailboxes.
//!
//! A socket is represented in the domain only by the queue that feeds its writer
//! task. Writing a frame never suspends; a closed queue means the writer (and
//! therefore the socket) is gone.

use tokio::sync::mpsc;

use super::{ConnectionId, ConnectionIdFactory, error::DeliveryError};

/// A frame queued for one connection's writer task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundFrame {
    /// One serialized text message
    Text(String),
    /// Close the connection with the given reason; the writer stops afterwards
    Close { reason: String },
}

/// Cloneable sending side of a connection's outbound queue.
///
/// Broadcast fan-out works on a snapshot of mailboxes so that the registry lock
/// is never held while frames are written to sockets.
#[derive(Debug, Clone)]
pub struct Mailbox {
    connection_id: ConnectionId,
    sender: mpsc::UnboundedSender<OutboundFrame>,
}

impl Mailbox {
    /// Open a fresh mailbox with a newly generated connection id.
    ///
    /// The receiver is handed to the writer task of the socket.
    pub fn open() -> (Self, mpsc::UnboundedReceiver<OutboundFrame>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let mailbox = Self {
            connection_id: ConnectionIdFactory::generate(),
            sender,
        };
        (mailbox, receiver)
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    /// Queue a frame for the writer.
    ///
    /// # Errors
    ///
    /// Returns `DeliveryError::MailboxClosed` if the writer has stopped.
    pub fn send(&self, frame: OutboundFrame) -> Result<(), DeliveryError> {
        self.sender
            .send(frame)
            .map_err(|_| DeliveryError::MailboxClosed(self.connection_id))
    }

    /// Queue a text frame.
    pub fn send_text(&self, text: String) -> Result<(), DeliveryError> {
        self.send(OutboundFrame::Text(text))
    }
}

/// Registry-owned handle of one live connection.
///
/// Deliberately not `Clone`: the registry holds at most one handle per identity,
/// and evicting it means consuming it with [`ConnectionHandle::close`].
#[derive(Debug)]
pub struct ConnectionHandle {
    mailbox: Mailbox,
}

impl ConnectionHandle {
    pub fn new(mailbox: Mailbox) -> Self {
        Self { mailbox }
    }

    pub fn id(&self) -> ConnectionId {
        self.mailbox.connection_id()
    }

    /// Mailbox for snapshot-based fan-out.
    pub fn mailbox(&self) -> &Mailbox {
        &self.mailbox
    }

    /// Ask the connection's writer to close the socket.
    pub fn close(self, reason: &str) -> Result<(), DeliveryError> {
        self.mailbox.send(OutboundFrame::Close {
            reason: reason.to_string(),
        })
    }
}
