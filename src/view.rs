//! Load state for a screen that shows fetched data.
//!
//! A `View` goes `Idle -> Loading -> Loaded | Failed`. Each fetch is started with a `Ticket`, and
//! only the response carrying the newest ticket of the current mount is applied. Responses that
//! arrive after the view was unmounted, or after a newer refresh started, are dropped.

use crate::Result;
use tracing::{debug, error};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState<T> {
    Idle,
    Loading,
    Loaded(T),
    /// The error chain of the failed fetch. Terminal until the view is mounted again.
    Failed(String),
}

/// Identifies one fetch started by `View::mount` or `View::refresh`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct Ticket(u64);

#[derive(Debug)]
pub struct View<T> {
    name: &'static str,
    state: ViewState<T>,
    generation: u64,
    mounted: bool,
}

impl<T> View<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            state: ViewState::Idle,
            generation: 0,
            mounted: false,
        }
    }

    pub fn state(&self) -> &ViewState<T> {
        &self.state
    }

    /// The loaded data, if the view is `Loaded`.
    pub fn data(&self) -> Option<&T> {
        match &self.state {
            ViewState::Loaded(data) => Some(data),
            _ => None,
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Shows the view and starts its first fetch.
    pub fn mount(&mut self) -> Ticket {
        self.mounted = true;
        self.start()
    }

    /// Starts a new fetch, superseding any that is in flight. Returns `None` when the view is not
    /// mounted or has failed.
    pub fn refresh(&mut self) -> Option<Ticket> {
        if !self.mounted || matches!(self.state, ViewState::Failed(_)) {
            return None;
        }
        Some(self.start())
    }

    /// Hides the view. Any fetch still in flight will be ignored when it completes.
    pub fn unmount(&mut self) {
        self.mounted = false;
        self.generation += 1;
        self.state = ViewState::Idle;
    }

    /// Applies the outcome of the fetch started with `ticket`. Returns whether it was applied.
    pub fn resolve(&mut self, ticket: Ticket, result: Result<T>) -> bool {
        if !self.mounted || ticket.0 != self.generation {
            debug!("Dropping a stale response for the {} view", self.name);
            return false;
        }
        self.state = match result {
            Ok(data) => ViewState::Loaded(data),
            Err(e) => {
                error!("Unable to load the {} view: {e:#}", self.name);
                ViewState::Failed(format!("{e:#}"))
            }
        };
        true
    }

    /// Mounts the view and resolves it with the result of `fetch`.
    pub async fn load<F>(&mut self, fetch: F) -> &ViewState<T>
    where
        F: std::future::Future<Output = Result<T>>,
    {
        let ticket = self.mount();
        let result = fetch.await;
        self.resolve(ticket, result);
        &self.state
    }

    fn start(&mut self) -> Ticket {
        self.generation += 1;
        self.state = ViewState::Loading;
        Ticket(self.generation)
    }
}
