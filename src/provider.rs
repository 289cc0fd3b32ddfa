//! Remote aircraft provider
//!
//!  Owns the per-callsign situation and parts buffers. The outer map lock is
//!  only held to find or create an aircraft entry; buffer work happens under
//!  the per-aircraft mutex, so traffic for one callsign never waits on
//!  another. Reads copy records out.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, trace};

use crate::buffer::{BufferLimits, TimestampedBuffer};
use crate::error::{Error, Result};
use crate::parts::AircraftParts;
use crate::situation::{AircraftSituation, Callsign};

/// Buffers of one remote aircraft
#[derive(Debug)]
struct AircraftBuffers {
    situations: TimestampedBuffer<AircraftSituation>,
    parts: TimestampedBuffer<AircraftParts>,
    /// Set once any parts were received
    supports_parts: bool,
}

impl AircraftBuffers {
    fn new(situation_limits: BufferLimits, parts_limits: BufferLimits) -> Self {
        Self {
            situations: TimestampedBuffer::new(situation_limits),
            parts: TimestampedBuffer::new(parts_limits),
            supports_parts: false,
        }
    }
}

/// Store of all remote aircraft buffers
#[derive(Debug)]
pub struct RemoteAircraftProvider {
    aircraft: RwLock<HashMap<Callsign, Arc<Mutex<AircraftBuffers>>>>,
    situation_limits: BufferLimits,
    parts_limits: BufferLimits,
}

impl Default for RemoteAircraftProvider {
    fn default() -> Self {
        Self::new(BufferLimits::situations(), BufferLimits::parts())
    }
}

impl RemoteAircraftProvider {
    pub fn new(situation_limits: BufferLimits, parts_limits: BufferLimits) -> Self {
        Self {
            aircraft: RwLock::new(HashMap::new()),
            situation_limits,
            parts_limits,
        }
    }

    fn entry(&self, callsign: &Callsign) -> Option<Arc<Mutex<AircraftBuffers>>> {
        self.aircraft.read().get(callsign).cloned()
    }

    fn entry_or_create(&self, callsign: &Callsign) -> Arc<Mutex<AircraftBuffers>> {
        if let Some(entry) = self.entry(callsign) {
            return entry;
        }
        let mut aircraft = self.aircraft.write();
        Arc::clone(aircraft.entry(callsign.clone()).or_insert_with(|| {
            debug!(callsign = %callsign, "new remote aircraft");
            Arc::new(Mutex::new(AircraftBuffers::new(
                self.situation_limits,
                self.parts_limits,
            )))
        }))
    }

    /// Validate and buffer a situation, creating the aircraft on first use
    pub fn insert_situation(&self, situation: AircraftSituation) -> Result<()> {
        situation.validate()?;
        let entry = self.entry_or_create(situation.callsign());
        trace!(callsign = %situation.callsign(), ts = situation.timestamp_ms(), "situation");
        entry.lock().situations.push(situation);
        Ok(())
    }

    /// Validate and buffer parts, creating the aircraft on first use
    pub fn insert_parts(&self, callsign: &Callsign, parts: AircraftParts) -> Result<()> {
        parts.validate(callsign)?;
        let entry = self.entry_or_create(callsign);
        trace!(callsign = %callsign, ts = parts.timestamp_ms, "parts");
        let mut buffers = entry.lock();
        buffers.parts.push(parts);
        buffers.supports_parts = true;
        Ok(())
    }

    /// Situations of an aircraft, newest first
    pub fn remote_aircraft_situations(&self, callsign: &Callsign) -> Vec<AircraftSituation> {
        self.entry(callsign)
            .map(|e| e.lock().situations.to_vec())
            .unwrap_or_default()
    }

    pub fn remote_aircraft_situations_count(&self, callsign: &Callsign) -> usize {
        self.entry(callsign).map(|e| e.lock().situations.len()).unwrap_or(0)
    }

    pub fn latest_situation(&self, callsign: &Callsign) -> Option<AircraftSituation> {
        self.entry(callsign)
            .and_then(|e| e.lock().situations.latest().cloned())
    }

    /// Parts of an aircraft, newest first. With a cutoff only those valid
    /// at or before it.
    pub fn remote_aircraft_parts(&self, callsign: &Callsign, cutoff_ms: Option<i64>) -> Vec<AircraftParts> {
        let Some(entry) = self.entry(callsign) else {
            return Vec::new();
        };
        let buffers = entry.lock();
        match cutoff_ms {
            Some(cutoff) => buffers.parts.before(cutoff),
            None => buffers.parts.to_vec(),
        }
    }

    /// Whether the aircraft ever sent parts
    pub fn is_remote_aircraft_supporting_parts(&self, callsign: &Callsign) -> bool {
        self.entry(callsign).is_some_and(|e| e.lock().supports_parts)
    }

    pub fn remote_aircraft_supporting_parts(&self) -> Vec<Callsign> {
        let mut callsigns: Vec<Callsign> = self
            .aircraft
            .read()
            .iter()
            .filter(|(_, e)| e.lock().supports_parts)
            .map(|(cs, _)| cs.clone())
            .collect();
        callsigns.sort();
        callsigns
    }

    pub fn contains(&self, callsign: &Callsign) -> bool {
        self.aircraft.read().contains_key(callsign)
    }

    /// All known callsigns, sorted
    pub fn callsigns(&self) -> Vec<Callsign> {
        let mut callsigns: Vec<Callsign> = self.aircraft.read().keys().cloned().collect();
        callsigns.sort();
        callsigns
    }

    pub fn len(&self) -> usize {
        self.aircraft.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.aircraft.read().is_empty()
    }

    /// Drop all buffers of an aircraft that left range
    pub fn remove_aircraft(&self, callsign: &Callsign) -> bool {
        let removed = self.aircraft.write().remove(callsign).is_some();
        if removed {
            debug!(callsign = %callsign, "removed remote aircraft");
        }
        removed
    }

    pub fn clear(&self) {
        self.aircraft.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;
    use crate::geo::GeoPosition;
    use crate::parts::AircraftLights;
    use crate::situation::Heading;

    fn situation(cs: &str, ts: i64, lat: f64) -> AircraftSituation {
        AircraftSituation::new(
            Callsign::new(cs),
            GeoPosition::new(lat, 8.0, 1000.0),
            Heading::true_north(0.0),
            0.0,
            0.0,
            100.0,
        )
        .with_timestamp_ms(ts)
    }

    fn parts(ts: i64, gear_down: bool) -> AircraftParts {
        AircraftParts::new(AircraftLights::all_on(), gear_down, 0.0, false, vec![], false).with_timestamp_ms(ts)
    }

    #[test]
    fn test_insert_and_read_situations() {
        let provider = RemoteAircraftProvider::default();
        let cs = Callsign::new("SWIFT");
        provider.insert_situation(situation("SWIFT", 1000, 1.0)).unwrap();
        provider.insert_situation(situation("SWIFT", 3000, 3.0)).unwrap();
        provider.insert_situation(situation("SWIFT", 2000, 2.0)).unwrap();

        let situations = provider.remote_aircraft_situations(&cs);
        let ts: Vec<i64> = situations.iter().map(|s| s.timestamp_ms()).collect();
        assert_eq!(ts, vec![3000, 2000, 1000]);
        assert_eq!(provider.remote_aircraft_situations_count(&cs), 3);
        assert_eq!(provider.latest_situation(&cs).unwrap().timestamp_ms(), 3000);
        assert!(provider.contains(&cs));
        assert!(!provider.is_remote_aircraft_supporting_parts(&cs));
    }

    #[test]
    fn test_unknown_callsign_is_empty() {
        let provider = RemoteAircraftProvider::default();
        let cs = Callsign::new("NOPE");
        assert!(provider.remote_aircraft_situations(&cs).is_empty());
        assert!(provider.remote_aircraft_parts(&cs, None).is_empty());
        assert_eq!(provider.remote_aircraft_situations_count(&cs), 0);
        assert!(provider.latest_situation(&cs).is_none());
        assert!(!provider.remove_aircraft(&cs));
    }

    #[test]
    fn test_invalid_situation_rejected() {
        let provider = RemoteAircraftProvider::default();
        let bad = situation("SWIFT", 1000, f64::NAN);
        assert!(matches!(provider.insert_situation(bad), Err(Error::InvalidSituation { .. })));
        assert!(provider.is_empty());

        let empty = situation("", 1000, 1.0);
        assert!(matches!(provider.insert_situation(empty), Err(Error::EmptyCallsign)));
    }

    #[test]
    fn test_parts_cutoff() {
        let provider = RemoteAircraftProvider::default();
        let cs = Callsign::new("SWIFT");
        provider.insert_parts(&cs, parts(10_000, false)).unwrap();
        provider.insert_parts(&cs, parts(0, true)).unwrap();

        let before = provider.remote_aircraft_parts(&cs, Some(5_000));
        assert_eq!(before.len(), 1);
        assert!(before[0].gear_down);
        assert_eq!(provider.remote_aircraft_parts(&cs, None).len(), 2);
        assert!(provider.is_remote_aircraft_supporting_parts(&cs));
        assert_eq!(provider.remote_aircraft_supporting_parts(), vec![cs]);
    }

    #[test]
    fn test_remove_aircraft() {
        let provider = RemoteAircraftProvider::default();
        provider.insert_situation(situation("AAA", 1, 1.0)).unwrap();
        provider.insert_situation(situation("BBB", 1, 1.0)).unwrap();
        assert_eq!(provider.callsigns(), vec![Callsign::new("AAA"), Callsign::new("BBB")]);

        assert!(provider.remove_aircraft(&Callsign::new("AAA")));
        assert_eq!(provider.len(), 1);
        provider.clear();
        assert!(provider.is_empty());
    }

    #[test]
    fn test_concurrent_writers_and_readers() {
        let provider = Arc::new(RemoteAircraftProvider::new(
            BufferLimits::new(20, 1_000_000),
            BufferLimits::parts(),
        ));
        let writers: Vec<_> = (0..4)
            .map(|n| {
                let provider = Arc::clone(&provider);
                thread::spawn(move || {
                    let cs = format!("AC{}", n);
                    for i in 0..200 {
                        provider.insert_situation(situation(&cs, i * 10, 1.0)).unwrap();
                    }
                })
            })
            .collect();
        let reader = {
            let provider = Arc::clone(&provider);
            thread::spawn(move || {
                for _ in 0..200 {
                    for cs in provider.callsigns() {
                        let s = provider.remote_aircraft_situations(&cs);
                        assert!(s.windows(2).all(|w| w[0].timestamp_ms() >= w[1].timestamp_ms()));
                    }
                }
            })
        };
        for w in writers {
            w.join().unwrap();
        }
        reader.join().unwrap();

        for cs in provider.callsigns() {
            assert_eq!(provider.remote_aircraft_situations_count(&cs), 20);
        }
    }
}
