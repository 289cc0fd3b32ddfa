//! Spline position interpolation
//!
//!  Cubic Hermite curve through the bracket with Catmull-Rom style tangents
//!  taken from the neighboring situations, scaled for uneven update spacing.
//!  Extrapolation and two-point buffers fall back to the straight line.

use crate::geo::GeoPosition;
use crate::setup::InterpolatorMode;
use crate::situation::AircraftSituation;

use super::linear::linear_position;
use super::{Bracket, PositionInterpolation};

#[derive(Debug, Clone, Copy, Default)]
pub struct SplineInterpolator;

impl PositionInterpolation for SplineInterpolator {
    fn mode(&self) -> InterpolatorMode {
        InterpolatorMode::Spline
    }

    fn interpolate_position(&self, situations: &[AircraftSituation], bracket: &Bracket) -> GeoPosition {
        if situations.len() < 3 || bracket.is_extrapolating() {
            return linear_position(situations, bracket);
        }

        // newest first: the situation before `older` in time sits at a higher index
        let before = situations.get(bracket.older + 1);
        let after = bracket.newer.checked_sub(1).and_then(|i| situations.get(i));
        let p1 = &situations[bracket.older];
        let p2 = &situations[bracket.newer];

        let segment_ms = (p2.timestamp_ms() - p1.timestamp_ms()) as f64;
        let component = |get: fn(&GeoPosition) -> f64| {
            let v1 = get(p1.position());
            let v2 = get(p2.position());
            let chord = v2 - v1;
            let m1 = before
                .and_then(|p0| tangent(get(p0.position()), p0.timestamp_ms(), v2, p2.timestamp_ms(), segment_ms))
                .unwrap_or(chord);
            let m2 = after
                .and_then(|p3| tangent(v1, p1.timestamp_ms(), get(p3.position()), p3.timestamp_ms(), segment_ms))
                .unwrap_or(chord);
            hermite(v1, v2, m1, m2, bracket.fraction)
        };

        GeoPosition {
            latitude: component(|p| p.latitude),
            longitude: component(|p| p.longitude),
            altitude_ft: component(|p| p.altitude_ft),
        }
    }
}

/// Slope between two samples, expressed per bracket segment
fn tangent(from: f64, from_ms: i64, to: f64, to_ms: i64, segment_ms: f64) -> Option<f64> {
    let span_ms = (to_ms - from_ms) as f64;
    (span_ms > 0.0 && segment_ms > 0.0).then(|| (to - from) * segment_ms / span_ms)
}

fn hermite(p1: f64, p2: f64, m1: f64, m2: f64, s: f64) -> f64 {
    let s2 = s * s;
    let s3 = s2 * s;
    let h00 = 2.0 * s3 - 3.0 * s2 + 1.0;
    let h10 = s3 - 2.0 * s2 + s;
    let h01 = -2.0 * s3 + 3.0 * s2;
    let h11 = s3 - s2;
    h00 * p1 + h10 * m1 + h01 * p2 + h11 * m2
}

#[cfg(test)]
mod tests {
    use super::super::test_support::situation;
    use super::super::{LinearInterpolator, find_bracket};
    use super::*;

    const EPS: f64 = 1e-9;

    fn parabola() -> Vec<AircraftSituation> {
        // latitude = (t / 1000)^2, newest first
        vec![
            situation("SWIFT", 3000, 9.0, 0.0, 0.0),
            situation("SWIFT", 2000, 4.0, 0.0, 0.0),
            situation("SWIFT", 1000, 1.0, 0.0, 0.0),
            situation("SWIFT", 0, 0.0, 0.0, 0.0),
        ]
    }

    #[test]
    fn test_two_points_same_as_linear() {
        let situations = vec![
            situation("SWIFT", 5000, 1.3, 7.1, 3300.0),
            situation("SWIFT", 0, 0.7, 7.9, 1200.0),
        ];
        for query in [-1000, 0, 1234, 2500, 4999, 5000, 9000] {
            let bracket = find_bracket(&situations, query).unwrap();
            assert_eq!(
                SplineInterpolator.interpolate_position(&situations, &bracket),
                LinearInterpolator.interpolate_position(&situations, &bracket)
            );
        }
    }

    #[test]
    fn test_extrapolation_same_as_linear() {
        let situations = parabola();
        let bracket = find_bracket(&situations, 4000).unwrap();
        assert!(bracket.is_extrapolating());
        assert_eq!(
            SplineInterpolator.interpolate_position(&situations, &bracket),
            LinearInterpolator.interpolate_position(&situations, &bracket)
        );
    }

    #[test]
    fn test_passes_through_endpoints() {
        let situations = parabola();
        for (query, lat) in [(1000, 1.0), (2000, 4.0)] {
            let bracket = find_bracket(&situations, query).unwrap();
            let p = SplineInterpolator.interpolate_position(&situations, &bracket);
            assert!((p.latitude - lat).abs() < EPS, "query {} lat {}", query, p.latitude);
        }
    }

    #[test]
    fn test_follows_curve() {
        let situations = parabola();
        let bracket = find_bracket(&situations, 1500).unwrap();
        let spline = SplineInterpolator.interpolate_position(&situations, &bracket);
        let linear = LinearInterpolator.interpolate_position(&situations, &bracket);
        assert!((spline.latitude - 2.25).abs() < EPS);
        assert!((linear.latitude - 2.5).abs() < EPS);
    }

    #[test]
    fn test_straight_line_matches_linear() {
        // constant velocity with uneven spacing
        let situations = vec![
            situation("SWIFT", 9000, 9.0, 4.5, 9000.0),
            situation("SWIFT", 4000, 4.0, 2.0, 4000.0),
            situation("SWIFT", 3000, 3.0, 1.5, 3000.0),
            situation("SWIFT", 0, 0.0, 0.0, 0.0),
        ];
        for query in [500, 3500, 6000] {
            let bracket = find_bracket(&situations, query).unwrap();
            let spline = SplineInterpolator.interpolate_position(&situations, &bracket);
            let linear = LinearInterpolator.interpolate_position(&situations, &bracket);
            assert!((spline.latitude - linear.latitude).abs() < 1e-6);
            assert!((spline.longitude - linear.longitude).abs() < 1e-6);
            assert!((spline.altitude_ft - linear.altitude_ft).abs() < 1e-6);
        }
    }
}
