//! Interpolation engine
//!
//!  Per-callsign entry point used by a simulator driver. Network side calls
//!  add situations and parts; the frame loop asks for interpolated results.
//!  One [`InterpolatorMulti`] per aircraft is created on first query and
//!  dropped with the aircraft.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::debug;

use crate::error::Result;
use crate::interpolator::InterpolatorMulti;
use crate::logger::InterpolationLogger;
use crate::parts::AircraftParts;
use crate::provider::RemoteAircraftProvider;
use crate::setup::{InterpolationHints, InterpolationSetup};
use crate::situation::{AircraftSituation, Callsign};
use crate::status::{InterpolationStatus, PartsStatus};

/// Shared state of one aircraft's interpolation
type InterpolatorEntry = Arc<Mutex<InterpolatorMulti>>;

#[derive(Debug)]
pub struct InterpolationEngine {
    provider: Arc<RemoteAircraftProvider>,
    interpolators: RwLock<HashMap<Callsign, InterpolatorEntry>>,
    logger: RwLock<Option<Arc<InterpolationLogger>>>,
}

impl Default for InterpolationEngine {
    fn default() -> Self {
        Self::new(Arc::new(RemoteAircraftProvider::default()))
    }
}

impl InterpolationEngine {
    pub fn new(provider: Arc<RemoteAircraftProvider>) -> Self {
        Self {
            provider,
            interpolators: RwLock::new(HashMap::new()),
            logger: RwLock::new(None),
        }
    }

    pub fn provider(&self) -> &Arc<RemoteAircraftProvider> {
        &self.provider
    }

    pub fn add_aircraft_situation(&self, situation: AircraftSituation) -> Result<()> {
        self.provider.insert_situation(situation)
    }

    pub fn add_aircraft_parts(&self, callsign: &Callsign, parts: AircraftParts) -> Result<()> {
        self.provider.insert_parts(callsign, parts)
    }

    /// Drop buffers and interpolator state of an aircraft
    pub fn remove_aircraft(&self, callsign: &Callsign) -> bool {
        self.interpolators.write().remove(callsign);
        let removed = self.provider.remove_aircraft(callsign);
        if removed {
            debug!(callsign = %callsign, "aircraft removed");
        }
        removed
    }

    pub fn callsigns(&self) -> Vec<Callsign> {
        self.provider.callsigns()
    }

    /// Attach a logger to all current and future interpolators
    pub fn attach_logger(&self, logger: Arc<InterpolationLogger>) {
        *self.logger.write() = Some(Arc::clone(&logger));
        for entry in self.entries() {
            entry.lock().attach_logger(Arc::clone(&logger));
        }
    }

    pub fn detach_logger(&self) {
        *self.logger.write() = None;
        for entry in self.entries() {
            entry.lock().detach_logger();
        }
    }

    pub fn logger(&self) -> Option<Arc<InterpolationLogger>> {
        self.logger.read().clone()
    }

    pub fn get_interpolated_situation(
        &self,
        callsign: &Callsign,
        current_time_ms: i64,
        setup: &InterpolationSetup,
        hints: &InterpolationHints,
    ) -> (AircraftSituation, InterpolationStatus) {
        let Some(entry) = self.entry_for(callsign) else {
            return (AircraftSituation::null(callsign.clone()), InterpolationStatus::default());
        };
        let mut interpolator = entry.lock();
        interpolator.get_interpolated_situation(current_time_ms, setup, hints)
    }

    pub fn get_interpolated_parts(
        &self,
        callsign: &Callsign,
        cutoff_ms: i64,
        setup: &InterpolationSetup,
    ) -> (AircraftParts, PartsStatus) {
        let Some(entry) = self.entry_for(callsign) else {
            return (AircraftParts::neutral(Vec::new()).with_timestamp_ms(cutoff_ms), PartsStatus::default());
        };
        let interpolator = entry.lock();
        interpolator.get_interpolated_parts(cutoff_ms, setup)
    }

    fn entries(&self) -> Vec<InterpolatorEntry> {
        self.interpolators.read().values().cloned().collect()
    }

    /// Interpolator of a known aircraft, created on first use. Unknown
    /// callsigns drop any stale interpolator. The map lock is released on return.
    fn entry_for(&self, callsign: &Callsign) -> Option<InterpolatorEntry> {
        debug_assert!(!callsign.is_empty(), "missing callsign");
        if callsign.is_empty() || !self.provider.contains(callsign) {
            self.interpolators.write().remove(callsign);
            return None;
        }
        if let Some(entry) = self.interpolators.read().get(callsign) {
            return Some(Arc::clone(entry));
        }

        let mut interpolators = self.interpolators.write();
        let logger = self.logger();
        let entry = interpolators.entry(callsign.clone()).or_insert_with(|| {
            let mut interpolator = InterpolatorMulti::new(callsign.clone(), Arc::clone(&self.provider));
            if let Some(logger) = logger {
                interpolator.attach_logger(logger);
            }
            Arc::new(Mutex::new(interpolator))
        });
        Some(Arc::clone(entry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::GeoPosition;
    use crate::parts::AircraftEngine;
    use crate::situation::Heading;

    fn situation(cs: &str, ts: i64, lat: f64) -> AircraftSituation {
        AircraftSituation::new(
            Callsign::new(cs),
            GeoPosition::new(lat, 0.0, 5000.0),
            Heading::true_north(180.0),
            0.0,
            0.0,
            220.0,
        )
        .with_timestamp_ms(ts)
    }

    #[test]
    fn test_swift_end_to_end() {
        let t = 1_425_000_000_000;
        let engine = InterpolationEngine::default();
        // decreasing latitude over time, delivered oldest first
        for (i, lat) in [2.0, 1.0, 0.0].into_iter().enumerate() {
            let ts = t - 10_000 + i as i64 * 5000;
            engine.add_aircraft_situation(situation("SWIFT", ts, lat)).unwrap();
        }

        let callsign = Callsign::new("SWIFT");
        let setup = InterpolationSetup::default();
        let hints = InterpolationHints::default();
        let (s, status) = engine.get_interpolated_situation(&callsign, t - 2500, &setup, &hints);
        assert!(status.did_interpolation_succeed());
        assert!(status.has_changed_position());
        assert!((s.position().latitude - 0.5).abs() < 1e-9);

        // marching forward in time keeps moving south
        let mut last_lat = f64::MAX;
        for query in (t - 10_000..=t).step_by(500) {
            let (s, status) = engine.get_interpolated_situation(&callsign, query, &setup, &hints);
            assert!(status.did_interpolation_succeed());
            assert!(s.position().latitude <= last_lat, "query {}", query);
            last_lat = s.position().latitude;
        }
    }

    #[test]
    fn test_unknown_callsign() {
        let engine = InterpolationEngine::default();
        let callsign = Callsign::new("NOBODY");
        let (s, status) = engine.get_interpolated_situation(
            &callsign,
            0,
            &InterpolationSetup::default(),
            &InterpolationHints::default(),
        );
        assert!(s.is_null());
        assert_eq!(s.callsign(), &callsign);
        assert!(!status.did_interpolation_succeed());

        let (parts, status) = engine.get_interpolated_parts(&callsign, 0, &InterpolationSetup::default());
        assert!(!status.is_supporting_parts());
        assert!(parts.gear_down);
    }

    #[test]
    fn test_parts_through_engine() {
        let engine = InterpolationEngine::default();
        let callsign = Callsign::new("SWIFT");
        engine.add_aircraft_situation(situation("SWIFT", 0, 1.0)).unwrap();
        let mut gear_up = AircraftParts::neutral(vec![AircraftEngine::new(1, true)]).with_timestamp_ms(10);
        gear_up.gear_down = false;
        engine
            .add_aircraft_parts(&callsign, AircraftParts::neutral(Vec::new()).with_timestamp_ms(0))
            .unwrap();
        engine.add_aircraft_parts(&callsign, gear_up).unwrap();

        let setup = InterpolationSetup::default();
        let (parts, status) = engine.get_interpolated_parts(&callsign, 5, &setup);
        assert!(status.is_supporting_parts());
        assert!(parts.gear_down);
        let (parts, _) = engine.get_interpolated_parts(&callsign, 15, &setup);
        assert!(!parts.gear_down);
    }

    #[test]
    fn test_remove_aircraft() {
        let engine = InterpolationEngine::default();
        let callsign = Callsign::new("SWIFT");
        engine.add_aircraft_situation(situation("SWIFT", 0, 1.0)).unwrap();
        engine.add_aircraft_situation(situation("SWIFT", 1000, 2.0)).unwrap();
        let setup = InterpolationSetup::default();
        let hints = InterpolationHints::default();
        let (_, status) = engine.get_interpolated_situation(&callsign, 500, &setup, &hints);
        assert!(status.did_interpolation_succeed());

        assert!(engine.remove_aircraft(&callsign));
        assert!(!engine.remove_aircraft(&callsign));
        assert!(engine.callsigns().is_empty());
        let (s, status) = engine.get_interpolated_situation(&callsign, 500, &setup, &hints);
        assert!(s.is_null());
        assert!(!status.did_interpolation_succeed());
    }

    #[test]
    fn test_logger_reaches_new_interpolators() {
        let engine = InterpolationEngine::default();
        let logger = Arc::new(InterpolationLogger::default());
        engine.attach_logger(Arc::clone(&logger));
        engine.add_aircraft_situation(situation("SWIFT", 0, 1.0)).unwrap();
        engine.add_aircraft_situation(situation("SWIFT", 1000, 2.0)).unwrap();

        let mut setup = InterpolationSetup::default();
        setup.add_callsign_to_log(Callsign::new("SWIFT"));
        engine.get_interpolated_situation(&Callsign::new("SWIFT"), 500, &setup, &InterpolationHints::default());
        assert_eq!(logger.situation_log_count(), 1);

        engine.detach_logger();
        assert!(engine.logger().is_none());
        engine.get_interpolated_situation(&Callsign::new("SWIFT"), 600, &setup, &InterpolationHints::default());
        assert_eq!(logger.situation_log_count(), 1);
    }

    #[test]
    fn test_aircraft_do_not_wait_on_each_other() {
        let engine = Arc::new(InterpolationEngine::default());
        for cs in ["AAA", "BBB"] {
            engine.add_aircraft_situation(situation(cs, 0, 1.0)).unwrap();
            engine.add_aircraft_situation(situation(cs, 1000, 2.0)).unwrap();
        }
        let setup = InterpolationSetup::default();
        let hints = InterpolationHints::default();
        engine.get_interpolated_situation(&Callsign::new("AAA"), 500, &setup, &hints);

        // keep AAA busy while BBB is queried and removed from another thread
        let busy = engine.entry_for(&Callsign::new("AAA")).unwrap();
        let _guard = busy.lock();
        let other = {
            let engine = Arc::clone(&engine);
            std::thread::spawn(move || {
                let (_, status) = engine.get_interpolated_situation(
                    &Callsign::new("BBB"),
                    500,
                    &InterpolationSetup::default(),
                    &InterpolationHints::default(),
                );
                let removed = engine.remove_aircraft(&Callsign::new("BBB"));
                (status.did_interpolation_succeed(), removed)
            })
        };
        assert_eq!(other.join().unwrap(), (true, true));
    }

    #[test]
    fn test_concurrent_ingest_and_query() {
        let engine = Arc::new(InterpolationEngine::default());
        let writer = {
            let engine = Arc::clone(&engine);
            std::thread::spawn(move || {
                for i in 0..200 {
                    engine.add_aircraft_situation(situation("SWIFT", i * 100, i as f64 * 0.01)).unwrap();
                    engine.add_aircraft_situation(situation("OTHER", i * 100, i as f64 * 0.02)).unwrap();
                }
            })
        };
        let setup = InterpolationSetup::default();
        let hints = InterpolationHints::default();
        for i in 0..200 {
            let (s, _) = engine.get_interpolated_situation(&Callsign::new("SWIFT"), i * 100, &setup, &hints);
            assert!(s.position().is_finite());
        }
        writer.join().unwrap();
        assert_eq!(engine.callsigns().len(), 2);
    }
}
