use crate::core::filter::{apply_category_filter, CategorySelection};
use crate::core::location::LocationProvider;
use crate::core::markers::{MarkerSet, ReconcileSummary};
use crate::domain::model::{Coordinate, NotificationKind, Organization, ViewportBounds};
use crate::domain::ports::{ConfigProvider, Notifier, OrganizationStore, RenderLayer};
use crate::utils::error::{MapError, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(1000);
pub const DEFAULT_CENTER: Coordinate = Coordinate {
    latitude: 40.7128,
    longitude: -74.006,
};
pub const DEFAULT_ZOOM: u8 = 13;

const FETCH_TOAST: &str = "organizations";

#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub debounce: Duration,
    pub default_center: Coordinate,
    pub default_zoom: u8,
    pub user_zoom: u8,
    pub initial_categories: CategorySelection,
}

impl SyncSettings {
    pub fn from_config<C: ConfigProvider>(config: &C) -> Self {
        Self {
            debounce: config.debounce(),
            default_center: config.default_center(),
            default_zoom: config.default_zoom(),
            user_zoom: config.user_zoom(),
            initial_categories: config.initial_categories().into_iter().collect(),
        }
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            default_center: DEFAULT_CENTER,
            default_zoom: DEFAULT_ZOOM,
            user_zoom: DEFAULT_ZOOM,
            initial_categories: CategorySelection::all(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Debouncing,
    Fetching,
    Settled,
}

/// Events emitted by the map UI.
#[derive(Debug, Clone)]
pub enum MapEvent {
    MovementStart,
    Settled(ViewportBounds),
    CategoriesChanged(CategorySelection),
    Recenter,
    FitToMarkers,
}

/// A fetch that has been issued; its reply is only applied if `seq` is still the latest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    seq: u64,
    bounds: ViewportBounds,
}

impl FetchTicket {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn bounds(&self) -> &ViewportBounds {
        &self.bounds
    }
}

#[derive(Debug)]
pub enum FetchOutcome {
    Applied {
        count: usize,
        markers: ReconcileSummary,
    },
    Failed(MapError),
    Stale,
}

/// Keeps the rendered markers in step with the viewport and the category filter.
pub struct ViewportSync<S, R, N>
where
    S: OrganizationStore,
    R: RenderLayer,
    N: Notifier,
{
    store: Arc<S>,
    layer: R,
    notifier: Arc<N>,
    location: LocationProvider,
    settings: SyncSettings,
    state: SyncState,
    pending_bounds: Option<ViewportBounds>,
    deadline: Option<Instant>,
    last_requested: Option<ViewportBounds>,
    latest_seq: u64,
    in_flight: bool,
    organizations: Vec<Organization>,
    categories: CategorySelection,
    markers: MarkerSet<R::Handle>,
    initial_view: (Coordinate, u8),
}

impl<S, R, N> ViewportSync<S, R, N>
where
    S: OrganizationStore,
    R: RenderLayer,
    N: Notifier,
{
    /// Builds the map view. The initial center is decided here, once.
    pub fn new(
        store: Arc<S>,
        mut layer: R,
        notifier: Arc<N>,
        location: LocationProvider,
        settings: SyncSettings,
    ) -> Self {
        let user_location = location.current();
        let initial_view = match &user_location {
            Some(loc) => (loc.coordinate, settings.user_zoom),
            None => (settings.default_center, settings.default_zoom),
        };

        tracing::debug!(
            "Initial map view: {:.4}, {:.4} @ zoom {} ({})",
            initial_view.0.latitude,
            initial_view.0.longitude,
            initial_view.1,
            if user_location.is_some() {
                "user location"
            } else {
                "default center"
            }
        );
        layer.set_view(initial_view.0, initial_view.1);
        if let Some(loc) = &user_location {
            layer.show_user_location(loc);
        }

        let categories = settings.initial_categories.clone();
        Self {
            store,
            layer,
            notifier,
            location,
            settings,
            state: SyncState::Idle,
            pending_bounds: None,
            deadline: None,
            last_requested: None,
            latest_seq: 0,
            in_flight: false,
            organizations: Vec::new(),
            categories,
            markers: MarkerSet::new(),
            initial_view,
        }
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn initial_view(&self) -> (Coordinate, u8) {
        self.initial_view
    }

    /// Working set from the last successful fetch, before category filtering.
    pub fn organizations(&self) -> &[Organization] {
        &self.organizations
    }

    pub fn visible_organizations(&self) -> Vec<Organization> {
        apply_category_filter(&self.organizations, &self.categories)
    }

    pub fn categories(&self) -> &CategorySelection {
        &self.categories
    }

    pub fn markers(&self) -> &MarkerSet<R::Handle> {
        &self.markers
    }

    pub fn layer(&self) -> &R {
        &self.layer
    }

    pub fn last_requested_bounds(&self) -> Option<&ViewportBounds> {
        self.last_requested.as_ref()
    }

    pub fn debounce_deadline(&self) -> Option<Instant> {
        self.deadline
    }

    fn transition(&mut self, next: SyncState) {
        if self.state != next {
            tracing::debug!("Viewport sync: {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }

    pub fn on_movement_start(&mut self) {
        self.deadline = None;
        self.transition(SyncState::Debouncing);
    }

    /// Records the settled bounds and (re)arms the quiet-period timer.
    pub fn on_viewport_settled(&mut self, bounds: ViewportBounds) {
        self.pending_bounds = Some(bounds);
        self.deadline = Some(Instant::now() + self.settings.debounce);
        self.transition(SyncState::Debouncing);
    }

    /// Quiet period elapsed. Returns the fetch to issue, if any.
    pub fn on_quiet_period(&mut self) -> Option<FetchTicket> {
        self.deadline = None;
        match self.pending_bounds.take() {
            Some(bounds) => self.begin_fetch(bounds),
            None => {
                self.settle_if_quiet();
                None
            }
        }
    }

    /// Issues a request for `bounds` unless it repeats the last issued one.
    pub fn begin_fetch(&mut self, bounds: ViewportBounds) -> Option<FetchTicket> {
        if self.last_requested.as_ref() == Some(&bounds) {
            tracing::debug!("Bounds unchanged ({}), skipping fetch", bounds);
            self.settle_if_quiet();
            return None;
        }

        self.latest_seq += 1;
        self.last_requested = Some(bounds);
        self.in_flight = true;
        self.transition(SyncState::Fetching);
        self.notifier.notify(
            FETCH_TOAST,
            NotificationKind::Loading,
            "Loading organizations...",
        );
        tracing::debug!("Fetch #{} for bounds {}", self.latest_seq, bounds);

        Some(FetchTicket {
            seq: self.latest_seq,
            bounds,
        })
    }

    /// Applies a fetch reply. Replies for anything but the latest request are dropped.
    pub fn complete_fetch(
        &mut self,
        ticket: FetchTicket,
        result: Result<Vec<Organization>>,
    ) -> FetchOutcome {
        if ticket.seq != self.latest_seq {
            tracing::debug!(
                "Discarding stale reply #{} for {} (latest #{})",
                ticket.seq,
                ticket.bounds,
                self.latest_seq
            );
            return FetchOutcome::Stale;
        }
        self.in_flight = false;

        let outcome = match result {
            Ok(organizations) => {
                let count = organizations.len();
                self.organizations = organizations;
                let markers = self.refresh_markers();
                tracing::info!("Found {} organizations in {}", count, ticket.bounds);
                self.notifier.notify(
                    FETCH_TOAST,
                    NotificationKind::Success,
                    &format!("Found {} organizations in this area", count),
                );
                FetchOutcome::Applied { count, markers }
            }
            Err(e) => {
                tracing::warn!("Fetch #{} for {} failed: {}", ticket.seq, ticket.bounds, e);
                // 允許同一範圍重試
                self.last_requested = None;
                self.notifier.notify(
                    FETCH_TOAST,
                    NotificationKind::Error,
                    "Failed to load organizations",
                );
                FetchOutcome::Failed(e)
            }
        };

        if self.state == SyncState::Fetching {
            self.transition(SyncState::Settled);
            self.transition(SyncState::Idle);
        }
        outcome
    }

    fn settle_if_quiet(&mut self) {
        if self.in_flight {
            self.transition(SyncState::Fetching);
        } else {
            self.transition(SyncState::Idle);
        }
    }

    /// Fetches `bounds` right away, bypassing the debounce timer.
    ///
    /// Returns the size of the working set. Repeating the last requested bounds
    /// makes no store call.
    pub async fn fetch_for_bounds(&mut self, bounds: ViewportBounds) -> Result<usize> {
        let Some(ticket) = self.begin_fetch(bounds) else {
            return Ok(self.organizations.len());
        };

        let result = self.store.organizations_in(&ticket.bounds).await;
        match self.complete_fetch(ticket, result) {
            FetchOutcome::Applied { count, .. } => Ok(count),
            FetchOutcome::Failed(e) => Err(e),
            FetchOutcome::Stale => Ok(self.organizations.len()),
        }
    }

    pub fn set_categories(&mut self, categories: CategorySelection) -> ReconcileSummary {
        tracing::debug!("Active categories: {} selected", categories.len());
        self.categories = categories;
        self.refresh_markers()
    }

    fn refresh_markers(&mut self) -> ReconcileSummary {
        let visible = apply_category_filter(&self.organizations, &self.categories);
        self.markers.reconcile(&visible, &mut self.layer)
    }

    /// Explicit recenter on the detected location. Returns false when none is known.
    pub fn recenter(&mut self) -> bool {
        match self.location.current() {
            Some(loc) => {
                self.layer.set_view(loc.coordinate, self.settings.user_zoom);
                self.layer.show_user_location(&loc);
                true
            }
            None => {
                tracing::info!("No user location known, recenter ignored");
                false
            }
        }
    }

    /// Zooms the map to the markers currently drawn.
    pub fn fit_to_markers(&mut self) -> Option<ViewportBounds> {
        let mut points = self
            .organizations
            .iter()
            .filter(|org| self.markers.contains(&org.id))
            .map(|org| org.coordinate);

        let first = points.next()?;
        let (mut south, mut west, mut north, mut east) =
            (first.latitude, first.longitude, first.latitude, first.longitude);
        for p in points {
            south = south.min(p.latitude);
            north = north.max(p.latitude);
            west = west.min(p.longitude);
            east = east.max(p.longitude);
        }

        let bounds = ViewportBounds::new(south, west, north, east).ok()?;
        self.layer.fit_bounds(&bounds);
        Some(bounds)
    }

    pub fn handle_event(&mut self, event: MapEvent) {
        match event {
            MapEvent::MovementStart => self.on_movement_start(),
            MapEvent::Settled(bounds) => self.on_viewport_settled(bounds),
            MapEvent::CategoriesChanged(categories) => {
                self.set_categories(categories);
            }
            MapEvent::Recenter => {
                self.recenter();
            }
            MapEvent::FitToMarkers => {
                self.fit_to_markers();
            }
        }
    }
}

impl<S, R, N> ViewportSync<S, R, N>
where
    S: OrganizationStore + 'static,
    R: RenderLayer,
    N: Notifier,
{
    /// Event loop: drives the debounce timer and fetches until `events` closes.
    ///
    /// Fetches run on spawned tasks and report back here, so marker updates only
    /// ever happen on this task, one reconciliation at a time.
    pub async fn run(mut self, mut events: mpsc::Receiver<MapEvent>) -> Self {
        let (reply_tx, mut replies) = mpsc::unbounded_channel();

        loop {
            let deadline = self.deadline;
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => self.handle_event(event),
                    None => break,
                },
                Some((ticket, result)) = replies.recv() => {
                    self.complete_fetch(ticket, result);
                }
                _ = wait_until(deadline) => {
                    if let Some(ticket) = self.on_quiet_period() {
                        self.spawn_fetch(ticket, reply_tx.clone());
                    }
                }
            }
        }

        tracing::debug!("Map event channel closed, stopping viewport sync");
        self
    }

    fn spawn_fetch(
        &self,
        ticket: FetchTicket,
        reply_tx: mpsc::UnboundedSender<(FetchTicket, Result<Vec<Organization>>)>,
    ) {
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            let result = store.organizations_in(&ticket.bounds).await;
            // 迴圈已結束時直接丟棄結果
            let _ = reply_tx.send((ticket, result));
        });
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
