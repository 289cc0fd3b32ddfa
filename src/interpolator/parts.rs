//! Parts selection
//!
//!  Parts are discrete, so the newest record valid at the cutoff is held
//!  until the next one applies. Only the flap percentage may be blended.

use crate::geo::lerp;
use crate::parts::AircraftParts;
use crate::status::PartsStatus;

/// Parts applicable at `cutoff_ms` from newest first records.
///
/// Returns the parts, the status and whether flaps were blended.
pub fn interpolate_parts(parts: &[AircraftParts], cutoff_ms: i64, blend_flaps: bool) -> (AircraftParts, PartsStatus, bool) {
    let mut status = PartsStatus::default();

    let Some(index) = parts.iter().position(|p| p.timestamp_ms <= cutoff_ms) else {
        let engines = parts.first().map(|p| p.engines.clone()).unwrap_or_default();
        return (AircraftParts::neutral(engines).with_timestamp_ms(cutoff_ms), status, false);
    };

    status.set_supports_parts(true);
    let mut result = parts[index].clone();

    let next = index.checked_sub(1).map(|i| &parts[i]);
    let blended = match next {
        Some(next) if blend_flaps && next.timestamp_ms > result.timestamp_ms => {
            let fraction =
                (cutoff_ms - result.timestamp_ms) as f64 / (next.timestamp_ms - result.timestamp_ms) as f64;
            result.set_flaps_percent(lerp(result.flaps_percent, next.flaps_percent, fraction));
            true
        }
        _ => false,
    };

    (result, status, blended)
}
