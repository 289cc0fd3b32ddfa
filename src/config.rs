//! Configuration and command-line argument parsing

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use traffic_interpolator::{BufferLimits, Callsign, InterpolationSetup, InterpolatorMode};

/// Drive the interpolation engine with synthetic remote traffic
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Number of synthetic aircraft
    #[arg(long, default_value_t = 8)]
    pub aircraft: usize,

    /// Frame loop rate in Hz
    #[arg(long, default_value_t = 30)]
    pub frame_rate_hz: u32,

    /// Interval between situation updates per aircraft
    #[arg(long, value_name = "MS", default_value_t = 5000)]
    pub update_interval_ms: u64,

    /// Maximum random delivery delay added to each update
    #[arg(long, value_name = "MS", default_value_t = 400)]
    pub jitter_ms: u64,

    /// Probability that an update is held back and delivered after the next one
    #[arg(long, default_value_t = 0.05, value_parser = parse_probability)]
    pub reorder_probability: f64,

    /// Stop after this many seconds, 0 runs until Ctrl+C
    #[arg(long, value_name = "SECS", default_value_t = 0)]
    pub duration_secs: u64,

    /// Position interpolator: linear or spline
    #[arg(long, default_value = "spline")]
    pub mode: InterpolatorMode,

    /// Log interpolation cycles of this callsign (repeatable)
    #[arg(long = "log-callsign", value_name = "CALLSIGN")]
    pub log_callsigns: Vec<String>,

    /// Log every aircraft
    #[arg(long, default_value_t = false)]
    pub log_all: bool,

    /// Write interpolation logs to this directory at exit
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// Situations kept per aircraft
    #[arg(long, default_value_t = traffic_interpolator::buffer::DEFAULT_MAX_SITUATIONS)]
    pub max_situations: usize,

    /// Maximum situation and parts age relative to the newest
    #[arg(long, value_name = "SECS", default_value_t = 30)]
    pub max_age_secs: u64,

    /// Latency assumed when a situation carries none
    #[arg(long, value_name = "MS", default_value_t = 0)]
    pub time_offset_ms: i64,

    /// Blend flap percentage between parts updates
    #[arg(long, default_value_t = false)]
    pub blend_flaps: bool,

    /// Summary report interval in seconds
    #[arg(long, value_name = "SECS", default_value_t = 5)]
    pub report_interval_secs: u64,

    /// Verbose logging (DEBUG level)
    #[arg(long, short, default_value_t = false)]
    pub verbose: bool,
}

impl Config {
    pub fn from_args() -> Self {
        Config::parse()
    }

    pub fn to_setup(&self) -> InterpolationSetup {
        let mut setup = InterpolationSetup {
            default_mode: self.mode,
            log_all: self.log_all,
            default_time_offset_ms: self.time_offset_ms,
            blend_flaps: self.blend_flaps,
            ..Default::default()
        };
        for callsign in &self.log_callsigns {
            setup.add_callsign_to_log(Callsign::new(callsign.as_str()));
        }
        setup
    }

    pub fn situation_limits(&self) -> BufferLimits {
        BufferLimits::new(self.max_situations, self.max_age_ms())
    }

    pub fn parts_limits(&self) -> BufferLimits {
        BufferLimits::new(traffic_interpolator::buffer::DEFAULT_MAX_PARTS, self.max_age_ms())
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.frame_rate_hz.max(1) as f64)
    }

    pub fn duration(&self) -> Option<Duration> {
        (self.duration_secs > 0).then(|| Duration::from_secs(self.duration_secs))
    }

    fn max_age_ms(&self) -> i64 {
        (self.max_age_secs as i64).saturating_mul(1000)
    }
}

fn parse_probability(s: &str) -> Result<f64, String> {
    let p: f64 = s.parse().map_err(|e| format!("{}", e))?;
    if (0.0..=1.0).contains(&p) {
        Ok(p)
    } else {
        Err(format!("{} is not a probability between 0 and 1", s))
    }
}
