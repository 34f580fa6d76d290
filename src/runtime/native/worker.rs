//! Background execution of catalog fetches and fingerprint commands.
//!
//! Fetches run on short-lived threads, one per ticket. Fingerprint commands
//! go to a single long-lived thread that skips to the newest queued command,
//! since only the latest attempt can still be displayed. Results come back
//! over one channel that the UI loop drains between frames.

use crate::app_core::fingerprint::{FingerprintCommand, FingerprintEvent};
use crate::catalog::{CatalogError, CatalogSource, FetchTicket, Payload};
use crate::digest;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;

/// A finished unit of background work.
#[derive(Debug)]
pub enum Completion {
    Catalog {
        ticket: FetchTicket,
        result: Result<Payload, CatalogError>,
    },
    Fingerprint(FingerprintEvent),
}

pub struct Worker {
    source: Arc<dyn CatalogSource>,
    completions_tx: Sender<Completion>,
    completions_rx: Receiver<Completion>,
    fingerprint_tx: Sender<FingerprintCommand>,
}

impl Worker {
    pub fn new(source: Arc<dyn CatalogSource>) -> Self {
        let (completions_tx, completions_rx) = mpsc::channel();
        let (fingerprint_tx, fingerprint_rx) = mpsc::channel();

        let thread_source = Arc::clone(&source);
        let thread_tx = completions_tx.clone();
        thread::spawn(move || run_fingerprint(thread_source, fingerprint_rx, thread_tx));

        Self {
            source,
            completions_tx,
            completions_rx,
            fingerprint_tx,
        }
    }

    pub fn dispatch_fetch(&self, ticket: FetchTicket) {
        let source = Arc::clone(&self.source);
        let tx = self.completions_tx.clone();
        thread::spawn(move || {
            let result = source.fetch(&ticket.key);
            // The receiver is gone only during shutdown.
            let _ = tx.send(Completion::Catalog { ticket, result });
        });
    }

    pub fn dispatch_fingerprint(&self, command: FingerprintCommand) {
        if self.fingerprint_tx.send(command).is_err() {
            log::error!("fingerprint worker stopped");
        }
    }

    /// Returns the next finished unit of work without blocking.
    pub fn try_recv(&self) -> Option<Completion> {
        match self.completions_rx.try_recv() {
            Ok(completion) => Some(completion),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }
}

fn run_fingerprint(
    source: Arc<dyn CatalogSource>,
    commands: Receiver<FingerprintCommand>,
    completions: Sender<Completion>,
) {
    while let Ok(mut command) = commands.recv() {
        while let Ok(newer) = commands.try_recv() {
            log::debug!("skipping superseded {:?}", command.attempt());
            command = newer;
        }

        let event = execute_fingerprint(source.as_ref(), command);
        if completions.send(Completion::Fingerprint(event)).is_err() {
            break;
        }
    }
}

/// Runs one fingerprint command to completion on the calling thread.
pub fn execute_fingerprint(source: &dyn CatalogSource, command: FingerprintCommand) -> FingerprintEvent {
    match command {
        FingerprintCommand::Hash { attempt, file } => {
            log::info!("hashing {}", file.path.display());
            let result = digest::fingerprint_file(&file.path).map_err(|err| format!("{:#}", err));
            FingerprintEvent::Hashed { attempt, result }
        }
        FingerprintCommand::Lookup { attempt, hash } => {
            log::info!("looking up {}", hash);
            let result = source.build(&hash);
            FingerprintEvent::LookedUp { attempt, result }
        }
    }
}
