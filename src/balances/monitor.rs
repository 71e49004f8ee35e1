use std::collections::HashSet;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::balances::errors::MonitorError;
use crate::balances::manager::BalanceManager;
use crate::balances::types::{BalanceResult, MonitorEvent, ProviderInfo, TrackedAddress};
use crate::config::MonitorConfig;
use crate::types::chain::ChainType;
use crate::utils::rpc_client::create_http_client;

/// Error message of the synthetic result published when tracking is cleared
const TRACKING_CLEARED: &str = "Address tracking cleared";

/// Mutable session state, only ever touched under the state lock
#[derive(Debug)]
struct TrackingState {
    tracked: TrackedAddress,
    /// Bumped on every address change; polls started for an older value are stale
    generation: u64,
    refresh_interval: Duration,
    poller: Option<JoinHandle<()>>,
}

impl TrackingState {
    fn stop_polling(&mut self) -> bool {
        match self.poller.take() {
            Some(poller) => {
                poller.abort();
                true
            }
            None => false,
        }
    }
}

#[derive(Debug)]
struct MonitorInner {
    client: reqwest::Client,
    manager: BalanceManager,
    state: Mutex<TrackingState>,
    /// Tracking sessions with a poll outstanding, keyed by generation and pair
    in_flight: Mutex<HashSet<(u64, TrackedAddress)>>,
    latest: RwLock<Option<BalanceResult>>,
    events: broadcast::Sender<MonitorEvent>,
}

impl Drop for MonitorInner {
    fn drop(&mut self) {
        self.state.get_mut().stop_polling();
    }
}

/// Tracks one `(chain, address)` pair and keeps its balance fresh
///
/// Every address change restarts a background polling task which fetches once right
/// away and then once per refresh interval. Results and address changes are
/// published as [`MonitorEvent`]s to every subscriber. Failures never surface as
/// errors to callers; they arrive as results with `success == false`.
///
/// Cloning yields another handle to the same monitor.
#[derive(Debug, Clone)]
pub(crate) struct BalanceMonitor {
    inner: Arc<MonitorInner>,
}

impl BalanceMonitor {
    /// Create a monitor with the default providers for every supported chain
    pub(crate) fn new(config: &MonitorConfig) -> Result<Self, reqwest::Error> {
        let manager = BalanceManager::new(config.request_timeout());
        for (chain, api_endpoint) in config.preferred_sources() {
            manager.set_preferred_api_source(*chain, api_endpoint);
        }

        let client = create_http_client()?;
        Ok(Self::with_manager(manager, client, config))
    }

    /// Create a monitor over an already populated [`BalanceManager`]
    pub(crate) fn with_manager(
        manager: BalanceManager,
        client: reqwest::Client,
        config: &MonitorConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity());

        info!(refresh_interval = ?config.refresh_interval(), "Balance monitor initialized");

        Self {
            inner: Arc::new(MonitorInner {
                client,
                manager,
                state: Mutex::new(TrackingState {
                    tracked: TrackedAddress::default(),
                    generation: 0,
                    refresh_interval: config.refresh_interval(),
                    poller: None,
                }),
                in_flight: Mutex::new(HashSet::new()),
                latest: RwLock::new(None),
                events,
            }),
        }
    }

    /// Receive every event published from now on
    pub(crate) fn subscribe(&self) -> broadcast::Receiver<MonitorEvent> {
        self.inner.events.subscribe()
    }

    /// Track `address` on `chain`
    ///
    /// Does nothing if the pair is already tracked. Otherwise publishes
    /// [`MonitorEvent::AddressChanged`] and either restarts polling with an immediate
    /// fetch, or, for [`ChainType::Unknown`], stops polling and publishes a failed
    /// result so subscribers can clear what they show.
    pub(crate) async fn set_address(&self, chain: ChainType, address: impl Into<String>) {
        let tracked = TrackedAddress::new(chain, address);

        let mut state = self.inner.state.lock().await;
        if state.tracked == tracked {
            debug!(%chain, address = %tracked.address, "Address already tracked");
            return;
        }

        state.tracked = tracked.clone();
        state.generation += 1;
        info!(%chain, address = %tracked.address, "Monitoring address changed");
        self.inner
            .publish(MonitorEvent::AddressChanged(tracked.clone()));

        if tracked.is_tracking() {
            self.inner.start_polling(&mut state);
            return;
        }

        state.stop_polling();
        drop(state);

        self.inner
            .emit_balance(BalanceResult::failure(
                &tracked.address,
                ChainType::Unknown,
                TRACKING_CLEARED,
                "",
            ))
            .await;
    }

    pub(crate) async fn address(&self) -> TrackedAddress {
        self.inner.state.lock().await.tracked.clone()
    }

    /// Change the polling period; the wait already in progress is not shortened
    ///
    /// A zero period is rejected and the current one kept.
    pub(crate) async fn set_refresh_interval(&self, milliseconds: u64) -> Result<(), MonitorError> {
        if milliseconds == 0 {
            warn!("Ignoring zero refresh interval");
            return Err(MonitorError::ZeroRefreshInterval);
        }

        self.inner.state.lock().await.refresh_interval = Duration::from_millis(milliseconds);
        info!(milliseconds, "Refresh interval set");
        Ok(())
    }

    pub(crate) async fn refresh_interval(&self) -> Duration {
        self.inner.state.lock().await.refresh_interval
    }

    /// Fetch the tracked pair now, as a timer tick would
    pub(crate) async fn refresh(&self) {
        let (tracked, generation) = {
            let state = self.inner.state.lock().await;
            (state.tracked.clone(), state.generation)
        };

        if !tracked.is_tracking() {
            debug!("No address tracked, ignoring refresh");
            return;
        }

        debug!(chain = %tracked.chain, address = %tracked.address, "Refreshing balance");
        self.inner.spawn_poll(generation);
    }

    /// Fetch the balance of `address` on `chain` and publish the result
    ///
    /// Returns `None` when the chain has no usable handler. A missing handler also
    /// halts automatic polling until the next [`BalanceMonitor::set_address`].
    pub(crate) async fn fetch_balance(&self, chain: ChainType, address: &str) -> Option<BalanceResult> {
        match self.inner.fetch_or_halt(chain, address, None).await {
            Ok(result) => {
                self.inner.emit_balance(result.clone()).await;
                Some(result)
            }
            Err(err) => {
                self.inner
                    .emit_balance(BalanceResult::failure(address, chain, err.to_string(), ""))
                    .await;
                None
            }
        }
    }

    /// Select the provider for `chain` whose endpoint is `api_endpoint`
    ///
    /// Does not trigger a fetch; call [`BalanceMonitor::refresh`] for that.
    pub(crate) fn set_preferred_api_source(&self, chain: ChainType, api_endpoint: &str) {
        self.inner
            .manager
            .set_preferred_api_source(chain, api_endpoint);
    }

    pub(crate) fn current_api_source(&self, chain: ChainType) -> Option<String> {
        self.inner
            .manager
            .current_api_source(chain)
            .map(str::to_string)
    }

    pub(crate) fn api_sources(&self, chain: ChainType) -> Vec<ProviderInfo> {
        self.inner
            .manager
            .handler(chain)
            .map(|handler| handler.api_sources())
            .unwrap_or_default()
    }

    pub(crate) fn supported_chains(&self) -> Vec<ChainType> {
        self.inner.manager.supported_chains()
    }

    /// Most recently published result
    pub(crate) async fn latest_balance(&self) -> Option<BalanceResult> {
        self.inner.latest.read().await.clone()
    }
}

impl MonitorInner {
    fn publish(&self, event: MonitorEvent) {
        if self.events.send(event).is_err() {
            debug!("No subscribers for monitor event");
        }
    }

    async fn emit_balance(&self, result: BalanceResult) {
        *self.latest.write().await = Some(result.clone());
        self.publish(MonitorEvent::BalanceUpdated(result));
    }

    fn start_polling(self: &Arc<Self>, state: &mut TrackingState) {
        state.stop_polling();
        let generation = state.generation;
        state.poller = Some(tokio::spawn(polling_loop(Arc::downgrade(self), generation)));
    }

    /// Stop polling, unless `generation` is given and polling has since moved on
    async fn halt_polling(&self, generation: Option<u64>) {
        let mut state = self.state.lock().await;
        if generation.is_some_and(|generation| generation != state.generation) {
            return;
        }

        if state.stop_polling() {
            warn!(chain = %state.tracked.chain, "Automatic polling halted");
        }
    }

    async fn fetch_or_halt(
        &self,
        chain: ChainType,
        address: &str,
        generation: Option<u64>,
    ) -> Result<BalanceResult, MonitorError> {
        let Some(handler) = self.manager.handler(chain) else {
            warn!(%chain, %address, "No handler registered for chain");
            self.halt_polling(generation).await;
            return Err(MonitorError::NoHandler);
        };

        handler
            .fetch_balance(&self.client, address)
            .await
            .ok_or(MonitorError::NoProvider)
    }

    fn spawn_poll(self: &Arc<Self>, generation: u64) {
        let inner = Arc::clone(self);
        tokio::spawn(async move { inner.poll(generation).await });
    }

    /// One timer-driven fetch of the tracked pair
    async fn poll(&self, generation: u64) {
        let tracked = {
            let state = self.state.lock().await;
            if state.generation != generation {
                return;
            }
            state.tracked.clone()
        };

        let session = (generation, tracked.clone());
        if !self.in_flight.lock().await.insert(session.clone()) {
            debug!(
                chain = %tracked.chain,
                address = %tracked.address,
                "Previous fetch still outstanding, skipping"
            );
            return;
        }

        let result = match self
            .fetch_or_halt(tracked.chain, &tracked.address, Some(generation))
            .await
        {
            Ok(result) => result,
            Err(err) => BalanceResult::failure(&tracked.address, tracked.chain, err.to_string(), ""),
        };

        self.in_flight.lock().await.remove(&session);

        // state stays locked until the result is published
        let state = self.state.lock().await;
        if state.generation != generation {
            debug!(
                chain = %tracked.chain,
                address = %tracked.address,
                "Dropping result for an address no longer tracked"
            );
            return;
        }

        self.emit_balance(result).await;
        drop(state);
    }
}

/// Background task that polls the tracked pair until polling is restarted or stopped
async fn polling_loop(inner: Weak<MonitorInner>, generation: u64) {
    debug!(generation, "Starting balance polling task");

    loop {
        let Some(monitor) = inner.upgrade() else {
            break;
        };

        let refresh_interval = {
            let state = monitor.state.lock().await;
            if state.generation != generation {
                break;
            }
            state.refresh_interval
        };

        monitor.spawn_poll(generation);
        drop(monitor);

        sleep(refresh_interval).await;
    }
}
