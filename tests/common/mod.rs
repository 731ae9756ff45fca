#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use shipmap::prelude::*;
use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct PositionsCall {
    pub query: PositionQuery,
    pub at: Instant,
}

/// Scriptable in-process feed recording every request.
#[derive(Default)]
pub struct MockFeed {
    positions_calls: Mutex<Vec<PositionsCall>>,
    lookups: Mutex<Vec<String>>,
    records: Mutex<HashMap<VesselCategory, Vec<VesselRecord>>>,
    vessels: Mutex<HashMap<String, VesselRecord>>,
    failing: Mutex<HashSet<VesselCategory>>,
    delays: Mutex<Vec<Duration>>,
    lookup_delays: Mutex<HashMap<String, Duration>>,
    lookup_fails: AtomicBool,
}

impl MockFeed {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_records(&self, category: VesselCategory, records: Vec<VesselRecord>) {
        self.records.lock().unwrap().insert(category, records);
    }

    pub fn add_vessel(&self, record: VesselRecord) {
        self.vessels
            .lock()
            .unwrap()
            .insert(record.mmsi.to_string(), record);
    }

    pub fn set_failing(&self, category: VesselCategory, failing: bool) {
        let mut set = self.failing.lock().unwrap();
        if failing {
            set.insert(category);
        } else {
            set.remove(&category);
        }
    }

    /// Delays applied to the next position requests, in call order
    pub fn push_delays(&self, delays: &[Duration]) {
        self.delays.lock().unwrap().extend_from_slice(delays);
    }

    pub fn set_lookup_delay(&self, id: &str, delay: Duration) {
        self.lookup_delays
            .lock()
            .unwrap()
            .insert(id.to_string(), delay);
    }

    pub fn set_lookup_fails(&self, fails: bool) {
        self.lookup_fails.store(fails, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<PositionsCall> {
        self.positions_calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, category: VesselCategory) -> Vec<PositionsCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.query.category == category)
            .collect()
    }

    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }
}

#[async_trait]
impl PositionFeed for MockFeed {
    async fn positions(&self, query: &PositionQuery) -> Result<Vec<VesselRecord>> {
        self.positions_calls.lock().unwrap().push(PositionsCall {
            query: *query,
            at: Instant::now(),
        });
        // the response is the data current when the request was sent
        let failing = self.failing.lock().unwrap().contains(&query.category);
        let records = self
            .records
            .lock()
            .unwrap()
            .get(&query.category)
            .cloned()
            .unwrap_or_default();
        let delay = {
            let mut delays = self.delays.lock().unwrap();
            (!delays.is_empty()).then(|| delays.remove(0))
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if failing {
            return Err(Error::Http { status: 503 });
        }
        Ok(records)
    }

    async fn position(&self, id: &str) -> Result<Option<VesselRecord>> {
        self.lookups.lock().unwrap().push(id.to_string());
        let delay = self.lookup_delays.lock().unwrap().get(id).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.lookup_fails.load(Ordering::SeqCst) {
            return Err(Error::Http { status: 500 });
        }
        Ok(self.vessels.lock().unwrap().get(id).cloned())
    }
}

pub fn vessel(mmsi: u32, lat: f64, lon: f64, vessel_type: u8) -> VesselRecord {
    serde_json::from_value(serde_json::json!({
        "MMSI": mmsi,
        "ShipName": format!("VESSEL {mmsi}"),
        "Latitude": lat,
        "Longitude": lon,
        "NavigationalStatus": 0,
        "TrueHeading": 90,
        "VesselType": vessel_type
    }))
    .unwrap()
}

pub fn bounds(offset: f64) -> ViewportBounds {
    ViewportBounds::new(51.0 + offset, 52.0 + offset, 4.0 + offset, 5.0 + offset)
}

/// Lets spawned tasks run without moving the paused clock noticeably
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
