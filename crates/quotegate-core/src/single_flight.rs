//! Collapses concurrent lookups for one symbol into a single upstream fetch.
//!
//! The first caller to miss becomes the leader: it runs the fetch and
//! publishes the outcome. Callers that arrive while the fetch is in flight
//! become followers and await the leader's outcome instead of fetching
//! themselves. The ticket is removed before the outcome is published, so a
//! caller arriving after resolution starts a fresh, independent fetch.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tracing::debug;

use crate::{LookupError, Quote, Symbol};

type Outcome = Result<Quote, LookupError>;
type TicketTable = Arc<Mutex<HashMap<Symbol, watch::Receiver<Option<Outcome>>>>>;

/// In-flight fetch coordinator.
///
/// Holds one ticket per symbol with an outstanding fetch. Ticket creation is
/// atomic with the existence check, so two leaders can never race into
/// existence for the same symbol.
#[derive(Debug, Clone, Default)]
pub struct SingleFlight {
    tickets: TicketTable,
}

enum Role {
    Leader(watch::Sender<Option<Outcome>>),
    Follower(watch::Receiver<Option<Outcome>>),
}

impl SingleFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `fetch` for this symbol unless a fetch is already in flight, in
    /// which case await that fetch's outcome instead.
    ///
    /// The outcome (success or failure) reaches every caller that joined
    /// before resolution. `fetch` is only invoked by the leader.
    pub async fn run<F, Fut>(&self, symbol: &Symbol, fetch: F) -> Outcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Outcome>,
    {
        let role = {
            let mut tickets = self
                .tickets
                .lock()
                .expect("ticket table lock is not poisoned");
            match tickets.get(symbol) {
                Some(receiver) => Role::Follower(receiver.clone()),
                None => {
                    let (sender, receiver) = watch::channel(None);
                    tickets.insert(symbol.clone(), receiver);
                    Role::Leader(sender)
                }
            }
        };

        match role {
            Role::Leader(sender) => {
                debug!(symbol = %symbol, "leading upstream fetch");
                // The guard removes the ticket even if the fetch panics or
                // the leader's task is cancelled mid-flight.
                let guard = TicketGuard {
                    tickets: Arc::clone(&self.tickets),
                    symbol: symbol.clone(),
                };
                let outcome = fetch().await;
                drop(guard);
                let _ = sender.send(Some(outcome.clone()));
                outcome
            }
            Role::Follower(mut receiver) => {
                debug!(symbol = %symbol, "joining in-flight fetch");
                if receiver.changed().await.is_err() {
                    // Leader dropped its sender without publishing.
                    return Err(LookupError::unavailable(format!(
                        "in-flight fetch for {symbol} was abandoned"
                    )));
                }
                match receiver.borrow().as_ref() {
                    Some(outcome) => outcome.clone(),
                    None => Err(LookupError::unavailable(format!(
                        "in-flight fetch for {symbol} resolved without an outcome"
                    ))),
                }
            }
        }
    }

    /// Number of symbols with an outstanding fetch.
    pub fn in_flight(&self) -> usize {
        self.tickets
            .lock()
            .expect("ticket table lock is not poisoned")
            .len()
    }
}

struct TicketGuard {
    tickets: TicketTable,
    symbol: Symbol,
}

impl Drop for TicketGuard {
    fn drop(&mut self) {
        if let Ok(mut tickets) = self.tickets.lock() {
            tickets.remove(&self.symbol);
        }
    }
}
