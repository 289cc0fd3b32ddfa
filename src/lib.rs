//!   traffic-interpolator:   remote aircraft interpolation for flight simulators
//!
//!  Buffers the sparse, out-of-order situation and parts updates received for
//!  remote aircraft and turns them into smooth per-frame estimates, including
//!  short extrapolation when updates are late.

pub mod buffer;
pub mod engine;
pub mod error;
pub mod geo;
pub mod interpolator;
pub mod logger;
pub mod parts;
pub mod pbh;
pub mod provider;
pub mod setup;
pub mod situation;
pub mod status;

pub use buffer::{BufferLimits, Timestamped, TimestampedBuffer};
pub use engine::InterpolationEngine;
pub use error::{Error, Result};
pub use geo::GeoPosition;
pub use interpolator::{Interpolator, InterpolatorMulti, LinearInterpolator, PositionInterpolation, SplineInterpolator};
pub use logger::{InterpolationLogger, PartsLog, SituationLog};
pub use parts::{AircraftEngine, AircraftLights, AircraftParts};
pub use provider::RemoteAircraftProvider;
pub use setup::{ElevationPlane, InterpolationHints, InterpolationSetup, InterpolatorMode};
pub use situation::{AircraftSituation, Callsign, Heading, HeadingReference};
pub use status::{InterpolationStatus, PartsStatus};
