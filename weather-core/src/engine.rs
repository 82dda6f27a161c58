//! The application state engine.
//!
//! [`Engine`] owns the single [`AppState`] and is the only thing that mutates
//! it. Work that has to wait (lookups, clock ticks) runs on tokio tasks which
//! post an [`EngineEvent`] back; the owner applies those one at a time through
//! [`Engine::next_update`], so every mutation happens on the caller's task.
//!
//! ```ignore
//! let mut engine = Engine::from_config(&config)?;
//! engine.start_clock();
//! engine.submit_lookup(Some("Paris"));
//! loop {
//!     engine.next_update().await;
//!     render(engine.state());
//! }
//! ```

use chrono::{DateTime, Local};
use rand::{RngCore, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};
use std::{sync::Arc, time::Duration};
use tokio::{
    sync::{mpsc, watch},
    task::AbortHandle,
};

use crate::{
    Config, LookupError, WeatherSnapshot,
    clock::{ClockSource, TICK_PERIOD},
    forecast,
    model::{AppState, LookupStatus},
    provider::{WeatherProvider, provider_from_config},
};

/// Handling of a lookup response that arrives after a newer lookup was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StaleResponses {
    /// Drop it; only the most recently submitted lookup may change the status.
    /// An empty submission counts, so it also supersedes a lookup in flight.
    #[default]
    Discard,
    /// Apply it anyway; whichever response arrives last wins.
    Apply,
}

/// Something that happened off the control task.
#[derive(Debug)]
pub enum EngineEvent {
    /// `generation` identifies the clock source that produced the tick.
    Tick { generation: u64, now: DateTime<Local> },
    LookupFinished {
        seq: u64,
        location: String,
        result: Result<WeatherSnapshot, LookupError>,
    },
}

/// What applying an event did to the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Update {
    Clock,
    LookupSucceeded { seq: u64 },
    LookupFailed { seq: u64 },
    /// A response for a superseded lookup was dropped.
    Discarded { seq: u64 },
    /// The event no longer applies (e.g. a tick queued before the clock stopped).
    Ignored,
}

pub struct Engine {
    state: AppState,
    provider: Arc<dyn WeatherProvider>,
    rng: Box<dyn RngCore + Send>,
    stale_responses: StaleResponses,
    events_tx: mpsc::UnboundedSender<EngineEvent>,
    events_rx: mpsc::UnboundedReceiver<EngineEvent>,
    published: watch::Sender<AppState>,
    clock: Option<ClockSource>,
    clock_generation: u64,
    lookups: Vec<AbortHandle>,
    last_seq: u64,
}

impl Engine {
    pub fn new(provider: Arc<dyn WeatherProvider>) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let state = AppState::default();
        let (published, _) = watch::channel(state.clone());

        Self {
            state,
            provider,
            rng: Box::new(StdRng::from_os_rng()),
            stale_responses: StaleResponses::default(),
            events_tx,
            events_rx,
            published,
            clock: None,
            clock_generation: 0,
            lookups: Vec::new(),
            last_seq: 0,
        }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let provider = provider_from_config(config)?;
        Ok(Self::new(provider).with_stale_responses(config.stale_responses))
    }

    /// Replace the randomness behind the synthetic outlook.
    pub fn with_rng<R: RngCore + Send + 'static>(mut self, rng: R) -> Self {
        self.rng = Box::new(rng);
        self
    }

    pub fn with_stale_responses(mut self, policy: StaleResponses) -> Self {
        self.stale_responses = policy;
        self
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Receiver that sees a fresh copy of the state after every mutation.
    pub fn subscribe(&self) -> watch::Receiver<AppState> {
        self.published.subscribe()
    }

    fn publish(&self) {
        self.published.send_replace(self.state.clone());
    }

    /// Presentation-side input field; used by `submit_lookup(None)`.
    pub fn set_input(&mut self, value: impl Into<String>) {
        self.state.input = value.into();
        self.publish();
    }

    pub fn toggle_theme(&mut self) -> bool {
        self.state.dark_mode = !self.state.dark_mode;
        self.publish();
        self.state.dark_mode
    }

    /// Look up `query`, or the input field when `query` is `None`.
    ///
    /// An empty location fails immediately with "Enter a city". Otherwise the
    /// status becomes `InFlight` and exactly one request is spawned; its result
    /// is applied by a later [`Engine::next_update`]. Returns the sequence
    /// number of the issued lookup.
    pub fn submit_lookup(&mut self, query: Option<&str>) -> Option<u64> {
        let location = query.unwrap_or(self.state.input.as_str()).trim().to_owned();

        // Bumped for empty queries too, so an earlier response cannot
        // overwrite "Enter a city" under `StaleResponses::Discard`.
        self.last_seq += 1;
        let seq = self.last_seq;

        if location.is_empty() {
            self.state.status =
                LookupStatus::Failed(LookupError::EmptyQuery.user_message().to_owned());
            self.publish();
            return None;
        }

        self.state.status = LookupStatus::InFlight;
        self.publish();

        tracing::debug!(seq, %location, "lookup issued");

        let provider = Arc::clone(&self.provider);
        let events = self.events_tx.clone();
        let task = tokio::spawn(async move {
            let result = provider.lookup(&location).await;
            // The engine may be gone by now; nothing to report to.
            let _ = events.send(EngineEvent::LookupFinished { seq, location, result });
        });

        self.lookups.retain(|h| !h.is_finished());
        self.lookups.push(task.abort_handle());

        Some(seq)
    }

    /// Submit the history entry at `index` again. `None` if there is no such entry.
    pub fn replay(&mut self, index: usize) -> Option<u64> {
        let Some(location) = self.state.history.replay(index).map(str::to_owned) else {
            tracing::debug!(index, "no history entry to replay");
            return None;
        };

        self.submit_lookup(Some(&location))
    }

    pub fn start_clock(&mut self) {
        self.start_clock_with_period(TICK_PERIOD);
    }

    /// Start the clock source unless it is already running.
    pub fn start_clock_with_period(&mut self, period: Duration) {
        if self.clock.is_some() {
            return;
        }

        self.clock_generation += 1;
        let generation = self.clock_generation;
        let events = self.events_tx.clone();
        self.clock = Some(ClockSource::spawn(period, move |now| {
            let _ = events.send(EngineEvent::Tick { generation, now });
        }));
    }

    pub fn is_clock_running(&self) -> bool {
        self.clock.as_ref().is_some_and(ClockSource::is_running)
    }

    /// Stop the clock. No tick is applied after this returns, including ticks
    /// already queued.
    pub async fn stop_clock(&mut self) {
        if let Some(clock) = self.clock.take() {
            clock.shutdown().await;
        }
    }

    /// Wait for the next event and apply it.
    ///
    /// Cancel safe: if the future is dropped before completing, no event is lost.
    pub async fn next_update(&mut self) -> Update {
        // `events_tx` lives in `self`, so the channel never closes.
        match self.events_rx.recv().await {
            Some(event) => self.apply(event),
            None => Update::Ignored,
        }
    }

    /// Apply the next event if one is already queued.
    pub fn try_next_update(&mut self) -> Option<Update> {
        self.events_rx.try_recv().ok().map(|event| self.apply(event))
    }

    fn apply(&mut self, event: EngineEvent) -> Update {
        let update = match event {
            EngineEvent::Tick { generation, now } => {
                if self.clock.is_none() || generation != self.clock_generation {
                    return Update::Ignored;
                }
                self.state.clock = now;
                Update::Clock
            }
            EngineEvent::LookupFinished { seq, location, result } => {
                if seq < self.last_seq && self.stale_responses == StaleResponses::Discard {
                    tracing::debug!(seq, latest = self.last_seq, %location, "stale lookup response discarded");
                    return Update::Discarded { seq };
                }
                self.finish_lookup(seq, &location, result)
            }
        };

        self.publish();
        update
    }

    fn finish_lookup(
        &mut self,
        seq: u64,
        location: &str,
        result: Result<WeatherSnapshot, LookupError>,
    ) -> Update {
        match result {
            Ok(snapshot) => {
                tracing::info!(seq, location, "lookup succeeded");
                let base_temperature = snapshot.temperature_c;

                self.state.status = LookupStatus::Succeeded(snapshot);
                self.state.history.record(location);
                self.state.forecast = forecast::synthesize(base_temperature, &mut *self.rng);

                Update::LookupSucceeded { seq }
            }
            Err(err) => {
                tracing::info!(seq, location, error = %err, "lookup failed");
                self.state.status = LookupStatus::Failed(err.user_message().to_owned());

                Update::LookupFailed { seq }
            }
        }
    }

    /// Stop the clock and abort any lookup still in flight.
    pub async fn shutdown(mut self) {
        self.stop_clock().await;
        for handle in self.lookups.drain(..) {
            handle.abort();
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        for handle in &self.lookups {
            handle.abort();
        }
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("state", &self.state)
            .field("provider", &self.provider)
            .field("stale_responses", &self.stale_responses)
            .field("clock", &self.clock)
            .field("clock_generation", &self.clock_generation)
            .field("last_seq", &self.last_seq)
            .finish_non_exhaustive()
    }
}
