//! Per call result descriptors

use serde::Serialize;

/// Status of one situation interpolation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct InterpolationStatus {
    changed_position: bool,
    interpolation_succeeded: bool,
}

impl InterpolationStatus {
    /// Enough situations existed to compute a result
    pub fn did_interpolation_succeed(&self) -> bool {
        self.interpolation_succeeded
    }

    pub fn set_interpolation_succeeded(&mut self, succeeded: bool) {
        self.interpolation_succeeded = succeeded;
    }

    /// Position differs from the previous result for this aircraft
    pub fn has_changed_position(&self) -> bool {
        self.changed_position
    }

    pub fn set_changed_position(&mut self, changed: bool) {
        self.changed_position = changed;
    }

    pub fn all_true(&self) -> bool {
        self.interpolation_succeeded && self.changed_position
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Status of one parts lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PartsStatus {
    supports_parts: bool,
}

impl PartsStatus {
    pub fn is_supporting_parts(&self) -> bool {
        self.supports_parts
    }

    pub fn set_supports_parts(&mut self, supports: bool) {
        self.supports_parts = supports;
    }

    pub fn all_true(&self) -> bool {
        self.supports_parts
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
