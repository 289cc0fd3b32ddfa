//! Situation and parts interpolation for one remote aircraft
//!
//!  [`Interpolator`] does everything that does not depend on how positions
//!  are curved: time offset handling, bracket selection, attitude via
//!  [`PbhInterpolator`], ground elevation and on-ground handling, change
//!  detection and logging. The position itself comes from a
//!  [`PositionInterpolation`] strategy.

pub mod linear;
pub mod multi;
pub mod parts;
pub mod spline;

use std::sync::Arc;

use tracing::{debug, trace};

pub use linear::LinearInterpolator;
pub use multi::InterpolatorMulti;
pub use spline::SplineInterpolator;

use crate::error::{Error, Result};
use crate::geo::{GeoPosition, lerp};
use crate::logger::{InterpolationLogger, PartsLog, SituationLog};
use crate::parts::AircraftParts;
use crate::pbh::PbhInterpolator;
use crate::provider::RemoteAircraftProvider;
use crate::setup::{InterpolationHints, InterpolationSetup, InterpolatorMode};
use crate::situation::{AircraftSituation, Callsign};
use crate::status::{InterpolationStatus, PartsStatus};

/// At or below this height above ground an aircraft counts as on ground
pub const ON_GROUND_HEIGHT_FT: f64 = 5.0;

/// Below this ground speed an aircraft without known height counts as on ground
pub const ON_GROUND_SPEED_KTS: f64 = 30.0;

/// The two situations used as interpolation endpoints, as indexes into a
/// newest first situation list
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bracket {
    pub older: usize,
    pub newer: usize,
    /// 0 at the older situation, 1 at the newer one, > 1 when extrapolating
    pub fraction: f64,
}

impl Bracket {
    pub fn is_extrapolating(&self) -> bool {
        self.fraction > 1.0
    }
}

/// Find the bracket around `effective_time_ms` in newest first situations.
///
/// Times at or after the newest situation use the two newest situations and
/// extrapolate; times before the oldest use the two oldest with fraction 0.
pub fn find_bracket(situations: &[AircraftSituation], effective_time_ms: i64) -> Option<Bracket> {
    if situations.len() < 2 {
        return None;
    }

    let (older, newer) = match situations
        .iter()
        .position(|s| s.timestamp_ms() <= effective_time_ms)
    {
        Some(0) => (1, 0),
        Some(i) => (i, i - 1),
        None => (situations.len() - 1, situations.len() - 2),
    };

    let older_ts = situations[older].timestamp_ms();
    let span = situations[newer].timestamp_ms().saturating_sub(older_ts);
    let fraction = if span <= 0 {
        1.0
    } else {
        (effective_time_ms.saturating_sub(older_ts) as f64 / span as f64).max(0.0)
    };

    Some(Bracket {
        older,
        newer,
        fraction,
    })
}

/// How a position is computed from the buffered situations
pub trait PositionInterpolation: Send + Sync {
    fn mode(&self) -> InterpolatorMode;

    /// Position at `bracket.fraction`. `situations` is newest first and holds
    /// at least the two bracket entries.
    fn interpolate_position(&self, situations: &[AircraftSituation], bracket: &Bracket) -> GeoPosition;
}

/// Interpolator of one remote aircraft using position strategy `S`
#[derive(Debug)]
pub struct Interpolator<S> {
    callsign: Callsign,
    provider: Arc<RemoteAircraftProvider>,
    strategy: S,
    logger: Option<Arc<InterpolationLogger>>,
    last_position: Option<GeoPosition>,
}

impl<S: PositionInterpolation> Interpolator<S> {
    pub fn new(callsign: Callsign, provider: Arc<RemoteAircraftProvider>, strategy: S) -> Self {
        debug_assert!(!callsign.is_empty(), "missing callsign");
        Self {
            callsign,
            provider,
            strategy,
            logger: None,
            last_position: None,
        }
    }

    pub fn callsign(&self) -> &Callsign {
        &self.callsign
    }

    pub fn mode(&self) -> InterpolatorMode {
        self.strategy.mode()
    }

    /// Attach an observer recording this interpolator's cycles
    pub fn attach_logger(&mut self, logger: Arc<InterpolationLogger>) {
        self.logger = Some(logger);
    }

    pub fn detach_logger(&mut self) {
        self.logger = None;
    }

    pub fn add_aircraft_situation(&self, situation: AircraftSituation) -> Result<()> {
        if situation.callsign() != &self.callsign {
            return Err(Error::InvalidSituation {
                callsign: situation.callsign().clone(),
                reason: format!("expected callsign {}", self.callsign),
            });
        }
        self.provider.insert_situation(situation)
    }

    pub fn add_aircraft_parts(&self, parts: AircraftParts) -> Result<()> {
        self.provider.insert_parts(&self.callsign, parts)
    }

    /// Best estimate of the aircraft situation at `current_time_ms`
    pub fn get_interpolated_situation(
        &mut self,
        current_time_ms: i64,
        setup: &InterpolationSetup,
        hints: &InterpolationHints,
    ) -> (AircraftSituation, InterpolationStatus) {
        let mut last_position = self.last_position.take();
        let result = self.interpolate(current_time_ms, setup, hints, &mut last_position);
        self.last_position = last_position;
        result
    }

    /// Like [`Self::get_interpolated_situation`], comparing against and
    /// updating a position cache owned by the caller
    pub(crate) fn interpolate(
        &self,
        current_time_ms: i64,
        setup: &InterpolationSetup,
        hints: &InterpolationHints,
        last_position: &mut Option<GeoPosition>,
    ) -> (AircraftSituation, InterpolationStatus) {
        let mut status = InterpolationStatus::default();
        if self.callsign.is_empty() {
            return (AircraftSituation::null(Callsign::default()), status);
        }

        let situations = self.provider.remote_aircraft_situations(&self.callsign);
        let Some(newest) = situations.first() else {
            debug!(callsign = %self.callsign, "no situations to interpolate");
            let result = AircraftSituation::null(self.callsign.clone());
            self.log_situation(setup, current_time_ms, 0, 0.0, &situations, None, &result, None, status);
            return (result, status);
        };

        let time_offset_ms = newest.time_offset_ms().unwrap_or(setup.default_time_offset_ms);
        let effective_time_ms = current_time_ms.saturating_sub(time_offset_ms);

        let Some(bracket) = find_bracket(&situations, effective_time_ms) else {
            trace!(callsign = %self.callsign, "single situation, nothing to interpolate");
            let result = newest.clone();
            self.log_situation(setup, current_time_ms, time_offset_ms, 0.0, &situations, None, &result, None, status);
            return (result, status);
        };

        let older = &situations[bracket.older];
        let newer = &situations[bracket.newer];
        let pbh = PbhInterpolator::new(bracket.fraction, older, newer);

        let mut result = newer.clone();
        result.set_timestamp_ms(effective_time_ms);
        result.set_time_offset_ms(Some(time_offset_ms));
        result.set_position(self.strategy.interpolate_position(&situations, &bracket));
        result.set_heading(pbh.heading());
        result.set_pitch_deg(pbh.pitch_deg());
        result.set_bank_deg(pbh.bank_deg());
        result.set_ground_speed_kts(pbh.ground_speed_kts());

        // elevation is terrain, never extrapolated
        let ground_fraction = bracket.fraction.min(1.0);
        let elevation = match (older.ground_elevation_ft(), newer.ground_elevation_ft()) {
            (Some(o), Some(n)) => Some(lerp(o, n, ground_fraction)),
            (o, n) => n.or(o),
        };
        result.set_ground_elevation_ft(elevation);
        let hint_elevation_ft = set_ground_elevation_from_hint(hints, &mut result);
        if result.ground_elevation_ft().is_none() {
            debug!(callsign = %self.callsign, "unknown ground elevation");
        }

        set_ground_flag(hints, older, newer, ground_fraction, &mut result);
        clamp_to_ground(hints, &mut result);

        status.set_interpolation_succeeded(true);
        status.set_changed_position(*last_position != Some(*result.position()));
        *last_position = Some(*result.position());

        if bracket.is_extrapolating() {
            trace!(callsign = %self.callsign, fraction = bracket.fraction, "extrapolating");
        }
        self.log_situation(
            setup,
            current_time_ms,
            time_offset_ms,
            bracket.fraction,
            &situations,
            Some((older, newer)),
            &result,
            hint_elevation_ft,
            status,
        );
        (result, status)
    }

    /// Parts applicable at `cutoff_ms`
    pub fn get_interpolated_parts(&self, cutoff_ms: i64, setup: &InterpolationSetup) -> (AircraftParts, PartsStatus) {
        let all_parts = self.provider.remote_aircraft_parts(&self.callsign, None);
        let (parts, status, blended) = parts::interpolate_parts(&all_parts, cutoff_ms, setup.blend_flaps);

        if let Some(logger) = &self.logger {
            if setup.log_interpolation_for(&self.callsign) {
                logger.log_parts(PartsLog {
                    timestamp_ms: cutoff_ms,
                    callsign: self.callsign.clone(),
                    parts_count: all_parts.len(),
                    parts: parts.clone(),
                    flaps_blended: blended,
                    status,
                });
            }
        }
        (parts, status)
    }

    #[allow(clippy::too_many_arguments)]
    fn log_situation(
        &self,
        setup: &InterpolationSetup,
        current_time_ms: i64,
        time_offset_ms: i64,
        fraction: f64,
        situations: &[AircraftSituation],
        bracket: Option<(&AircraftSituation, &AircraftSituation)>,
        result: &AircraftSituation,
        hint_elevation_ft: Option<f64>,
        status: InterpolationStatus,
    ) {
        let Some(logger) = &self.logger else {
            return;
        };
        if !setup.log_interpolation_for(&self.callsign) {
            return;
        }
        logger.log_interpolation(SituationLog {
            timestamp_ms: current_time_ms,
            callsign: self.callsign.clone(),
            mode: self.strategy.mode(),
            effective_time_ms: current_time_ms.saturating_sub(time_offset_ms),
            time_offset_ms,
            fraction,
            situations_count: situations.len(),
            older: bracket.map(|(o, _)| o.clone()),
            newer: bracket.map(|(_, n)| n.clone()),
            interpolated: result.clone(),
            hint_elevation_ft,
            status,
        });
    }
}

/// Override the ground elevation with the hint's, if it covers the position.
/// Returns the elevation used.
fn set_ground_elevation_from_hint(hints: &InterpolationHints, situation: &mut AircraftSituation) -> Option<f64> {
    let elevation = hints.ground_elevation_at(situation.position())?;
    situation.set_ground_elevation_ft(Some(elevation));
    Some(elevation)
}

/// Blend the brackets' on-ground flags, or infer one from height and speed
fn set_ground_flag(
    hints: &InterpolationHints,
    older: &AircraftSituation,
    newer: &AircraftSituation,
    fraction: f64,
    situation: &mut AircraftSituation,
) {
    let on_ground = match (older.on_ground(), newer.on_ground()) {
        (Some(o), Some(n)) => {
            let ground_factor = lerp(o as u8 as f64, n as u8 as f64, fraction);
            Some(ground_factor > 0.5)
        }
        (o, n) => n.or(o),
    };
    let on_ground = on_ground.or_else(|| {
        infer_on_ground(
            situation.height_above_ground_ft(),
            situation.ground_speed_kts(),
            hints.vtol,
        )
    });
    situation.set_on_ground(on_ground);
}

/// On-ground guess for aircraft that did not report it
pub fn infer_on_ground(height_above_ground_ft: Option<f64>, ground_speed_kts: f64, vtol: bool) -> Option<bool> {
    match height_above_ground_ft {
        Some(height) => Some(height <= ON_GROUND_HEIGHT_FT),
        None if vtol => None,
        None => Some(ground_speed_kts < ON_GROUND_SPEED_KTS),
    }
}

/// Put on-ground aircraft onto the terrain
fn clamp_to_ground(hints: &InterpolationHints, situation: &mut AircraftSituation) {
    if !situation.is_on_ground() {
        return;
    }
    if let Some(elevation) = situation.ground_elevation_ft() {
        situation.set_altitude_ft(elevation + hints.cg_above_ground_ft.unwrap_or(0.0));
    }
}
