//! Linear position interpolation

use crate::geo::GeoPosition;
use crate::setup::InterpolatorMode;
use crate::situation::AircraftSituation;

use super::{Bracket, PositionInterpolation};

/// Latitude, longitude and altitude interpolated independently along a
/// straight line through the bracket, continued past the newer situation
/// when extrapolating
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearInterpolator;

impl PositionInterpolation for LinearInterpolator {
    fn mode(&self) -> InterpolatorMode {
        InterpolatorMode::Linear
    }

    fn interpolate_position(&self, situations: &[AircraftSituation], bracket: &Bracket) -> GeoPosition {
        linear_position(situations, bracket)
    }
}

pub(crate) fn linear_position(situations: &[AircraftSituation], bracket: &Bracket) -> GeoPosition {
    let older = situations[bracket.older].position();
    let newer = situations[bracket.newer].position();
    older.lerp(newer, bracket.fraction)
}

#[cfg(test)]
mod tests {
    use super::super::find_bracket;
    use super::super::test_support::situation;
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_midpoint() {
        let situations = vec![
            situation("SWIFT", 10_000, 2.0, 4.0, 2000.0),
            situation("SWIFT", 0, 0.0, 0.0, 1000.0),
        ];
        let bracket = find_bracket(&situations, 5_000).unwrap();
        let p = LinearInterpolator.interpolate_position(&situations, &bracket);
        assert!((p.latitude - 1.0).abs() < EPS);
        assert!((p.longitude - 2.0).abs() < EPS);
        assert!((p.altitude_ft - 1500.0).abs() < EPS);
    }

    #[test]
    fn test_extrapolates_along_line() {
        let situations = vec![
            situation("SWIFT", 10_000, 1.0, 1.0, 1000.0),
            situation("SWIFT", 0, 0.0, 0.0, 0.0),
        ];
        let bracket = find_bracket(&situations, 12_000).unwrap();
        let p = LinearInterpolator.interpolate_position(&situations, &bracket);
        assert!((p.latitude - 1.2).abs() < EPS);
        assert!((p.altitude_ft - 1200.0).abs() < EPS);
    }

    #[test]
    fn test_fraction_zero_is_older() {
        let situations = vec![
            situation("SWIFT", 10_000, 1.0, 1.0, 1000.0),
            situation("SWIFT", 5_000, 0.5, 0.5, 500.0),
        ];
        let bracket = find_bracket(&situations, 0).unwrap();
        let p = LinearInterpolator.interpolate_position(&situations, &bracket);
        assert_eq!(p, *situations[1].position());
    }
}
