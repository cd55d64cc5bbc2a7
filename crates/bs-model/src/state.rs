//! Live station state and per-step metric increments.

/// Bike counts at both stations plus cumulative unmet demand.
///
/// `mailly + moulin` never changes over a run: a failed departure only bumps
/// an unmet counter.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct SystemState {
    pub mailly:       u64,
    pub moulin:       u64,
    pub unmet_mailly: u64,
    pub unmet_moulin: u64,
}

impl SystemState {
    /// Initial state: given bike counts, no unmet demand yet.
    pub fn new(mailly: u64, moulin: u64) -> Self {
        Self { mailly, moulin, unmet_mailly: 0, unmet_moulin: 0 }
    }

    #[inline]
    pub fn total(&self) -> u64 {
        self.mailly + self.moulin
    }
}

/// Unmet demand registered during one step.  Each field is 0 or 1.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct MetricDeltas {
    pub unmet_mailly: u64,
    pub unmet_moulin: u64,
}
