//! Synthetic remote traffic
//!
//!  Aircraft flying circles with a slow climb and descent, delivered the way
//!  a network client would see them: at a fixed interval, with random
//!  latency and the occasional update arriving after a newer one.

use std::f64::consts::PI;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crossbeam_channel::Sender;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace};

use traffic_interpolator::{
    AircraftEngine, AircraftLights, AircraftParts, AircraftSituation, Callsign, ElevationPlane, GeoPosition, Heading,
    InterpolationHints,
};

const KTS_TO_MPS: f64 = 0.514_444;
const MPS_TO_FPM: f64 = 196.850_4;
const GRAVITY_MPS2: f64 = 9.806_65;

/// Milliseconds since the Unix epoch
pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[derive(Debug, Clone)]
pub enum TrafficUpdate {
    Situation(AircraftSituation),
    Parts(Callsign, AircraftParts),
}

#[derive(Debug, Clone, Copy)]
pub struct FeedSettings {
    pub aircraft: usize,
    pub update_interval_ms: u64,
    pub jitter_ms: u64,
    pub reorder_probability: f64,
}

impl FeedSettings {
    /// Latency reported with every situation, long enough that the frame
    /// loop normally interpolates between received updates
    pub fn time_offset_ms(&self) -> i64 {
        (self.update_interval_ms + self.jitter_ms) as i64
    }
}

#[derive(Debug, Clone)]
pub struct SyntheticAircraft {
    callsign: Callsign,
    center: GeoPosition,
    radius_m: f64,
    ground_speed_kts: f64,
    phase_deg: f64,
    ground_elevation_ft: f64,
    base_altitude_ft: f64,
    altitude_swing_ft: f64,
    /// Period of one climb and descent cycle
    profile_period_ms: f64,
}

impl SyntheticAircraft {
    pub fn new(index: usize, rng: &mut impl Rng) -> Self {
        let center = GeoPosition::new(47.45 + rng.gen_range(-0.5..0.5), 8.55 + rng.gen_range(-0.5..0.5), 0.0);
        Self {
            callsign: Callsign::new(format!("SWIFT{}", index + 1)),
            center,
            radius_m: rng.gen_range(3_000.0..15_000.0),
            ground_speed_kts: rng.gen_range(140.0..320.0),
            phase_deg: rng.gen_range(0.0..360.0),
            ground_elevation_ft: rng.gen_range(300.0..1_800.0),
            base_altitude_ft: rng.gen_range(4_000.0..9_000.0),
            altitude_swing_ft: rng.gen_range(1_000.0..3_000.0),
            profile_period_ms: rng.gen_range(120_000.0..360_000.0),
        }
    }

    pub fn callsign(&self) -> &Callsign {
        &self.callsign
    }

    fn angular_rate_deg_per_ms(&self) -> f64 {
        let speed_mps = self.ground_speed_kts * KTS_TO_MPS;
        (speed_mps / self.radius_m).to_degrees() / 1000.0
    }

    fn altitude_ft(&self, timestamp_ms: i64) -> f64 {
        let phase = 2.0 * PI * timestamp_ms as f64 / self.profile_period_ms;
        self.base_altitude_ft + self.altitude_swing_ft * phase.sin()
    }

    fn vertical_speed_fpm(&self, timestamp_ms: i64) -> f64 {
        let omega = 2.0 * PI / self.profile_period_ms;
        let phase = omega * timestamp_ms as f64;
        self.altitude_swing_ft * omega * phase.cos() * 60_000.0
    }

    /// Situation at `timestamp_ms`, circling clockwise around the center
    pub fn situation_at(&self, timestamp_ms: i64) -> AircraftSituation {
        let bearing = self.phase_deg + self.angular_rate_deg_per_ms() * timestamp_ms as f64;
        let mut position = self.center.destination(bearing.rem_euclid(360.0), self.radius_m);
        position.altitude_ft = self.altitude_ft(timestamp_ms);

        let speed_mps = self.ground_speed_kts * KTS_TO_MPS;
        let bank = (speed_mps * speed_mps / (GRAVITY_MPS2 * self.radius_m)).atan().to_degrees();
        let pitch = (self.vertical_speed_fpm(timestamp_ms) / (speed_mps * MPS_TO_FPM))
            .atan()
            .to_degrees();

        AircraftSituation::new(
            self.callsign.clone(),
            position,
            Heading::true_north(bearing + 90.0),
            pitch,
            bank,
            self.ground_speed_kts,
        )
        .with_timestamp_ms(timestamp_ms)
        .with_ground_elevation_ft(self.ground_elevation_ft)
        .with_on_ground(false)
    }

    /// Parts matching the altitude at `timestamp_ms`
    pub fn parts_at(&self, timestamp_ms: i64) -> AircraftParts {
        let height = self.altitude_ft(timestamp_ms) - self.ground_elevation_ft;
        let flaps = if height < 4_000.0 {
            30.0
        } else if height < 6_000.0 {
            10.0
        } else {
            0.0
        };
        let lights = AircraftLights {
            strobe: true,
            landing: height < 10_000.0,
            taxi: false,
            beacon: true,
            nav: true,
            logo: height < 5_000.0,
        };
        let engines = vec![AircraftEngine::new(1, true), AircraftEngine::new(2, true)];
        AircraftParts::new(lights, height < 4_000.0, flaps, false, engines, false).with_timestamp_ms(timestamp_ms)
    }

    /// Terrain around the circle
    pub fn hints(&self) -> InterpolationHints {
        InterpolationHints::with_elevation(ElevationPlane::new(
            self.center,
            self.ground_elevation_ft,
            self.radius_m * 2.0,
        ))
    }
}

/// Produces update batches for all synthetic aircraft
#[derive(Debug)]
pub struct TrafficFeed {
    settings: FeedSettings,
    aircraft: Vec<SyntheticAircraft>,
    /// Updates held back per aircraft, sent after the next batch
    held: Vec<Option<Vec<TrafficUpdate>>>,
    rng: StdRng,
}

impl TrafficFeed {
    pub fn new(settings: FeedSettings) -> Self {
        Self::with_rng(settings, StdRng::from_entropy())
    }

    pub fn with_rng(settings: FeedSettings, mut rng: StdRng) -> Self {
        let aircraft: Vec<SyntheticAircraft> = (0..settings.aircraft)
            .map(|i| SyntheticAircraft::new(i, &mut rng))
            .collect();
        Self {
            held: vec![None; aircraft.len()],
            settings,
            aircraft,
            rng,
        }
    }

    pub fn aircraft(&self) -> &[SyntheticAircraft] {
        &self.aircraft
    }

    /// Updates to deliver at `now_ms`, in delivery order
    pub fn tick(&mut self, now_ms: i64) -> Vec<TrafficUpdate> {
        let reorder = match self.settings.reorder_probability {
            p if p.is_nan() => 0.0,
            p => p.clamp(0.0, 1.0),
        };
        let offset = self.settings.time_offset_ms();
        let mut out = Vec::with_capacity(self.aircraft.len() * 2);

        for (aircraft, held) in self.aircraft.iter().zip(self.held.iter_mut()) {
            let delay = if self.settings.jitter_ms > 0 {
                self.rng.gen_range(0..=self.settings.jitter_ms) as i64
            } else {
                0
            };
            let ts = now_ms - delay;
            let batch = vec![
                TrafficUpdate::Situation(aircraft.situation_at(ts).with_time_offset_ms(offset)),
                TrafficUpdate::Parts(aircraft.callsign().clone(), aircraft.parts_at(ts)),
            ];

            if held.is_none() && self.rng.gen_bool(reorder) {
                trace!(callsign = %aircraft.callsign(), ts, "holding back update");
                *held = Some(batch);
                continue;
            }
            out.extend(batch);
            if let Some(late) = held.take() {
                out.extend(late);
            }
        }
        out
    }
}

/// Send update batches until the receiver goes away
pub async fn run_feed(mut feed: TrafficFeed, tx: Sender<TrafficUpdate>, update_interval: Duration) {
    let mut interval = tokio::time::interval(update_interval);
    loop {
        interval.tick().await;
        for update in feed.tick(now_ms()) {
            if tx.send(update).is_err() {
                debug!("Traffic receiver closed");
                return;
            }
        }
    }
}
