//! Debounced scheduling of grammar checks.
//!
//! The widget never talks to the grammar service directly. It hands every text
//! change to a [`CheckScheduler`], which waits for a quiet period and then runs
//! the check in the background, reporting back through [`CheckEvent`]s.

use crate::client::{ClientError, GrammarCheck};
use crate::ErrorDescriptor;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::time::Instant;

/// Revision of the widget's text a check was scheduled for.
pub type Ticket = u64;

/// Progress of a scheduled check, sent back to the widget.
#[derive(Debug)]
pub enum CheckEvent {
    /// The debounce period elapsed and a request is in flight.
    Started { ticket: Ticket },
    Finished {
        ticket: Ticket,
        result: Result<Vec<ErrorDescriptor>, ClientError>,
    },
}

impl CheckEvent {
    pub fn ticket(&self) -> Ticket {
        match self {
            CheckEvent::Started { ticket } | CheckEvent::Finished { ticket, .. } => *ticket,
        }
    }
}

pub trait CheckScheduler {
    /// (Re)arm the debounce timer for `text`. Supersedes any pending check.
    fn schedule(&mut self, ticket: Ticket, text: String);

    /// Drop the pending check, if any. Requests already in flight are not
    /// aborted; their results are expected to be ignored by ticket.
    fn cancel(&mut self);
}

#[derive(Debug)]
enum Command {
    Schedule { ticket: Ticket, text: String },
    Cancel,
}

/// [`CheckScheduler`] backed by a tokio task holding a single debounce timer.
pub struct DebouncedChecker {
    tx: UnboundedSender<Command>,
}

impl DebouncedChecker {
    /// Spawn the timer task and return the scheduler handle together with the
    /// stream of check events.
    ///
    /// Outside a tokio runtime nothing is spawned; scheduling then only logs,
    /// which keeps widget code usable in plain unit tests.
    pub fn spawn(
        client: Arc<dyn GrammarCheck>,
        delay: Duration,
    ) -> (Self, UnboundedReceiver<CheckEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        if tokio::runtime::Handle::try_current().is_ok() {
            tokio::spawn(run(client, delay, rx, events_tx));
        }
        (Self { tx }, events_rx)
    }

    fn send(&self, command: Command) {
        if self.tx.send(command).is_err() {
            log::warn!("grammar check scheduler is not running");
        }
    }
}

impl CheckScheduler for DebouncedChecker {
    fn schedule(&mut self, ticket: Ticket, text: String) {
        self.send(Command::Schedule { ticket, text });
    }

    fn cancel(&mut self) {
        self.send(Command::Cancel);
    }
}

async fn run(
    client: Arc<dyn GrammarCheck>,
    delay: Duration,
    mut rx: UnboundedReceiver<Command>,
    events: UnboundedSender<CheckEvent>,
) {
    let mut pending: Option<(Ticket, String)> = None;
    let mut deadline: Option<Instant> = None;

    loop {
        let command = match deadline {
            Some(deadline_) => match tokio::time::timeout_at(deadline_, rx.recv()).await {
                Ok(command) => command,
                Err(_) => {
                    deadline = None;
                    if let Some((ticket, text)) = pending.take() {
                        fire(&client, &events, ticket, text);
                    }
                    continue;
                }
            },
            None => rx.recv().await,
        };

        let Some(command) = command else {
            break;
        };

        match command {
            Command::Schedule { ticket, text } => {
                pending = Some((ticket, text));
                deadline = Some(Instant::now() + delay);
            }
            Command::Cancel => {
                pending = None;
                deadline = None;
            }
        }
    }
}

fn fire(
    client: &Arc<dyn GrammarCheck>,
    events: &UnboundedSender<CheckEvent>,
    ticket: Ticket,
    text: String,
) {
    log::debug!("debounce elapsed, checking revision {}", ticket);
    if events.send(CheckEvent::Started { ticket }).is_err() {
        // Nobody is listening anymore
        return;
    }

    let client = Arc::clone(client);
    let events = events.clone();
    tokio::spawn(async move {
        let result = client.check(&text).await;
        let _ = events.send(CheckEvent::Finished { ticket, result });
    });
}
