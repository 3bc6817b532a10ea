use async_trait::async_trait;
use orgmap::adapters::render::{RecordingLayer, RenderOp};
use orgmap::domain::model::{NotificationKind, OrgId, Organization, ViewportBounds};
use orgmap::domain::ports::OrganizationStore;
use orgmap::{
    CategorySelection, InMemoryStore, LocationProvider, MapEvent, Result, SyncSettings,
    SyncState, ToastBoard, ViewportSync,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{sleep, Instant};

/// Bundled dataset with per-bounds latency; records when each request arrives.
struct ScriptedStore {
    inner: InMemoryStore,
    delays: Vec<(ViewportBounds, Duration)>,
    calls: Mutex<Vec<(Duration, ViewportBounds)>>,
    start: Instant,
}

impl ScriptedStore {
    fn new(start: Instant) -> Self {
        Self {
            inner: InMemoryStore::bundled().unwrap(),
            delays: Vec::new(),
            calls: Mutex::new(Vec::new()),
            start,
        }
    }

    fn with_delay(mut self, bounds: ViewportBounds, delay: Duration) -> Self {
        self.delays.push((bounds, delay));
        self
    }

    fn calls(&self) -> Vec<(Duration, ViewportBounds)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl OrganizationStore for ScriptedStore {
    async fn organizations_in(&self, bounds: &ViewportBounds) -> Result<Vec<Organization>> {
        self.calls
            .lock()
            .unwrap()
            .push((self.start.elapsed(), *bounds));

        if let Some((_, delay)) = self.delays.iter().find(|(b, _)| b == bounds) {
            sleep(*delay).await;
        }
        Ok(self.inner.query(bounds))
    }
}

fn bounds(raw: &str) -> ViewportBounds {
    raw.parse().unwrap()
}

type MapSync = ViewportSync<ScriptedStore, RecordingLayer, ToastBoard>;

fn start_sync(
    store: Arc<ScriptedStore>,
    notifier: Arc<ToastBoard>,
) -> (mpsc::Sender<MapEvent>, tokio::task::JoinHandle<MapSync>) {
    let sync = ViewportSync::new(
        store,
        RecordingLayer::new(),
        notifier,
        LocationProvider::new(),
        SyncSettings::default(),
    );
    let (tx, rx) = mpsc::channel(32);
    (tx, tokio::spawn(sync.run(rx)))
}

async fn pan(tx: &mpsc::Sender<MapEvent>, to: ViewportBounds) {
    tx.send(MapEvent::MovementStart).await.unwrap();
    tx.send(MapEvent::Settled(to)).await.unwrap();
}

fn live_ids(sync: &MapSync) -> Vec<String> {
    sync.layer()
        .live_markers()
        .into_iter()
        .map(|id| id.to_string())
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_burst_of_moves_fetches_once_after_quiet_period() {
    let start = Instant::now();
    let store = Arc::new(ScriptedStore::new(start));
    let (tx, handle) = start_sync(store.clone(), Arc::new(ToastBoard::new()));

    let b0 = bounds("40.70,-74.02,40.72,-74.00");
    let b1 = bounds("40.701,-74.02,40.721,-74.00");
    let b2 = bounds("40.702,-74.02,40.722,-74.00");

    pan(&tx, b0).await;
    sleep(Duration::from_millis(200)).await;
    pan(&tx, b1).await;
    sleep(Duration::from_millis(200)).await;
    pan(&tx, b2).await;

    sleep(Duration::from_millis(3000)).await;
    drop(tx);
    let sync = handle.await.unwrap();

    let calls = store.calls();
    assert_eq!(calls.len(), 1);
    // 最後一次停止移動在 t=400，加上一秒的安靜期
    assert!(calls[0].0 >= Duration::from_millis(1400));
    assert!(calls[0].0 < Duration::from_millis(1500));
    assert_eq!(calls[0].1, b2);
    assert_eq!(sync.state(), SyncState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_stale_reply_never_overwrites_newer_result() {
    let b1 = bounds("40.712,-74.0065,40.7136,-74.0055");
    let b2 = bounds("40.7195,-74.0155,40.7215,-74.0135");

    let start = Instant::now();
    let store = Arc::new(
        ScriptedStore::new(start)
            .with_delay(b1, Duration::from_millis(3000))
            .with_delay(b2, Duration::from_millis(10)),
    );
    let notifier = Arc::new(ToastBoard::new());
    let (tx, handle) = start_sync(store.clone(), notifier.clone());

    // R1 發出於 t=1000，t=4000 才回來；R2 發出於 t=2100，t=2110 回來
    pan(&tx, b1).await;
    sleep(Duration::from_millis(1100)).await;
    pan(&tx, b2).await;

    sleep(Duration::from_millis(5000)).await;
    drop(tx);
    let sync = handle.await.unwrap();

    assert_eq!(store.calls().len(), 2);
    let ids: Vec<&str> = sync.organizations().iter().map(|o| o.id.as_str()).collect();
    assert_eq!(ids, vec!["9", "10"]);
    assert_eq!(live_ids(&sync), vec!["10", "9"]);
    assert_eq!(sync.layer().count_adds(), 2);
    assert_eq!(
        notifier.get("organizations").unwrap().message,
        "Found 2 organizations in this area"
    );
}

#[tokio::test(start_paused = true)]
async fn test_returning_to_same_bounds_does_not_refetch() {
    let start = Instant::now();
    let store = Arc::new(ScriptedStore::new(start));
    let (tx, handle) = start_sync(store.clone(), Arc::new(ToastBoard::new()));
    let b = bounds("40.70,-74.02,40.72,-74.00");

    pan(&tx, b).await;
    sleep(Duration::from_millis(2000)).await;
    pan(&tx, b).await;
    sleep(Duration::from_millis(2000)).await;

    drop(tx);
    let sync = handle.await.unwrap();

    assert_eq!(store.calls().len(), 1);
    assert_eq!(sync.state(), SyncState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_overlapping_pan_keeps_existing_markers() {
    let start = Instant::now();
    let store = Arc::new(ScriptedStore::new(start));
    let (tx, handle) = start_sync(store.clone(), Arc::new(ToastBoard::new()));

    // 第一個範圍包含 1、3；第二個範圍再加上 2
    pan(&tx, bounds("40.7125,-74.0075,40.7140,-74.0050")).await;
    sleep(Duration::from_millis(1500)).await;
    pan(&tx, bounds("40.7125,-74.0085,40.7146,-74.0050")).await;
    sleep(Duration::from_millis(1500)).await;

    drop(tx);
    let sync = handle.await.unwrap();

    assert_eq!(live_ids(&sync), vec!["1", "2", "3"]);
    assert_eq!(sync.layer().count_adds(), 3);
    assert_eq!(sync.layer().count_removes(), 0);

    let adds: Vec<&OrgId> = sync
        .layer()
        .ops()
        .iter()
        .filter_map(|op| match op {
            RenderOp::Add(id) => Some(id),
            _ => None,
        })
        .collect();
    assert_eq!(adds.last().unwrap().as_str(), "2");
}

#[tokio::test(start_paused = true)]
async fn test_deselecting_every_category_clears_the_map() {
    let start = Instant::now();
    let store = Arc::new(ScriptedStore::new(start));
    let (tx, handle) = start_sync(store.clone(), Arc::new(ToastBoard::new()));

    pan(&tx, bounds("40.0,-75.0,41.0,-73.0")).await;
    sleep(Duration::from_millis(1500)).await;
    tx.send(MapEvent::CategoriesChanged(CategorySelection::none()))
        .await
        .unwrap();
    sleep(Duration::from_millis(10)).await;

    drop(tx);
    let sync = handle.await.unwrap();

    assert_eq!(sync.organizations().len(), 10);
    assert!(sync.markers().is_empty());
    assert!(sync.layer().live_markers().is_empty());
    assert_eq!(store.calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_fetch_progress_is_reported_under_one_key() {
    let start = Instant::now();
    let store = Arc::new(ScriptedStore::new(start));
    let notifier = Arc::new(ToastBoard::new());
    let (tx, handle) = start_sync(store, notifier.clone());

    pan(&tx, bounds("40.70,-74.02,40.72,-74.00")).await;
    sleep(Duration::from_millis(1500)).await;
    pan(&tx, bounds("40.0,-75.0,41.0,-73.0")).await;
    sleep(Duration::from_millis(1500)).await;

    drop(tx);
    handle.await.unwrap();

    assert_eq!(notifier.len(), 1);
    let toast = notifier.get("organizations").unwrap();
    assert_eq!(toast.kind, NotificationKind::Success);
    assert_eq!(toast.message, "Found 10 organizations in this area");
}
