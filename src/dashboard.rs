use crate::client::AnalyticsSource;
use crate::error::Error;
use crate::models::{AnalyticsSummary, DashboardSnapshot, TimeRange};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, watch};

pub const FALLBACK_ERROR: &str = "Failed to fetch analytics";

#[derive(Debug, Clone, Default, PartialEq)]
pub enum DashboardState {
    #[default]
    Idle,
    Loading,
    Loaded(DashboardSnapshot),
    Failed(String),
}

impl DashboardState {
    pub fn is_loading(&self) -> bool {
        matches!(self, DashboardState::Loading)
    }

    pub fn snapshot(&self) -> Option<&DashboardSnapshot> {
        match self {
            DashboardState::Loaded(snapshot) => Some(snapshot),
            _ => None,
        }
    }

    /// `None` whenever the last cycle did not succeed.
    pub fn summary(&self) -> Option<&AnalyticsSummary> {
        self.snapshot().map(|s| &s.summary)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            DashboardState::Failed(message) => Some(message),
            _ => None,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            DashboardState::Idle => "idle",
            DashboardState::Loading => "loading",
            DashboardState::Loaded(_) => "loaded",
            DashboardState::Failed(_) => "failed",
        }
    }
}

/// What a fetch cycle reports back to the state machine.
#[derive(Debug, Clone)]
pub enum CycleEvent {
    Started,
    Succeeded(DashboardSnapshot),
    Failed(String),
}

/// Applies one cycle event. Every transition goes through here, so the four
/// entities are only ever replaced together.
pub fn reduce(state: DashboardState, event: CycleEvent) -> DashboardState {
    let next = match event {
        CycleEvent::Started => DashboardState::Loading,
        CycleEvent::Succeeded(snapshot) => DashboardState::Loaded(snapshot),
        CycleEvent::Failed(message) if message.trim().is_empty() => {
            DashboardState::Failed(FALLBACK_ERROR.to_string())
        }
        CycleEvent::Failed(message) => DashboardState::Failed(message),
    };
    log::debug!("Dashboard state: {} -> {}", state.label(), next.label());
    next
}

/// User-facing text for a failed cycle.
pub fn error_message(err: &Error) -> String {
    let message = err.to_string();
    if message.trim().is_empty() {
        FALLBACK_ERROR.to_string()
    } else {
        message
    }
}

/// Inputs that trigger a fetch cycle when they change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Controls {
    pub time_range: TimeRange,
    pub retry_count: u64,
}

/// What a renderer needs: the controls plus the committed state.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub time_range: TimeRange,
    pub retry_count: u64,
    pub state: DashboardState,
}

pub struct Dashboard {
    source: Arc<dyn AnalyticsSource>,
    controls: Mutex<Controls>,
    generation: AtomicU64,
    state: watch::Sender<DashboardState>,
}

impl Dashboard {
    pub fn new(source: Arc<dyn AnalyticsSource>, time_range: TimeRange) -> Self {
        let (state_tx, _) = watch::channel(DashboardState::Idle);

        Self {
            source,
            controls: Mutex::new(Controls {
                time_range,
                retry_count: 0,
            }),
            generation: AtomicU64::new(0),
            state: state_tx,
        }
    }

    /// Runs the initial cycle.
    pub async fn load(&self) -> DashboardState {
        let range = self.controls.lock().await.time_range;
        self.run_cycle(range).await
    }

    /// Switches the lookback window. Re-fetches only if the window changed.
    pub async fn set_time_range(&self, range: TimeRange) -> DashboardState {
        {
            let mut controls = self.controls.lock().await;
            if controls.time_range == range {
                return self.state();
            }
            controls.time_range = range;
        }
        log::info!("Time range changed to {}", range);
        self.run_cycle(range).await
    }

    /// Bumps the retry counter and re-issues all four requests.
    pub async fn retry(&self) -> DashboardState {
        let range = {
            let mut controls = self.controls.lock().await;
            controls.retry_count += 1;
            log::info!("Retrying analytics fetch (attempt {})", controls.retry_count);
            controls.time_range
        };
        self.run_cycle(range).await
    }

    pub fn state(&self) -> DashboardState {
        self.state.borrow().clone()
    }

    pub async fn view(&self) -> DashboardView {
        let controls = *self.controls.lock().await;
        DashboardView {
            time_range: controls.time_range,
            retry_count: controls.retry_count,
            state: self.state(),
        }
    }

    /// Receives every committed transition.
    pub fn subscribe(&self) -> watch::Receiver<DashboardState> {
        self.state.subscribe()
    }

    async fn run_cycle(&self, range: TimeRange) -> DashboardState {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.commit(generation, CycleEvent::Started);

        let event = match self.source.fetch_snapshot(range).await {
            Ok(snapshot) => CycleEvent::Succeeded(snapshot),
            Err(e) => {
                log::error!("Failed to fetch analytics: {}", e);
                CycleEvent::Failed(error_message(&e))
            }
        };
        self.commit(generation, event);
        self.state()
    }

    /// Commits an event unless a newer cycle has been issued since. The check
    /// runs under the channel's write lock.
    fn commit(&self, generation: u64, event: CycleEvent) -> bool {
        self.state.send_if_modified(|state| {
            let latest = self.generation.load(Ordering::SeqCst);
            if generation != latest {
                log::debug!(
                    "Discarding result of cycle {} (latest is {})",
                    generation,
                    latest
                );
                return false;
            }
            let current = std::mem::take(state);
            *state = reduce(current, event);
            true
        })
    }
}
