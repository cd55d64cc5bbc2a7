//! The station-pair transition function.

use bs_core::DrawSource;

use crate::{MetricDeltas, SystemState};

/// Advance `state` by one time unit.
///
/// Takes exactly two draws from `rng`: the Mailly → Moulin trial first, then
/// the Moulin → Mailly trial.  The second trial sees the bike counts left by
/// the first.  The returned state already includes the deltas in its
/// cumulative unmet counters.
///
/// `p = 0.0` never attempts a trip and `p = 1.0` always does, because draws
/// lie in `[0, 1)`.
pub fn step<D: DrawSource>(
    state: &SystemState,
    p1:    f64,
    p2:    f64,
    rng:   &mut D,
) -> (SystemState, MetricDeltas) {
    let mut next = *state;
    let mut deltas = MetricDeltas::default();

    // Mailly → Moulin
    if rng.draw() < p1 {
        if next.mailly > 0 {
            next.mailly -= 1;
            next.moulin += 1;
        } else {
            deltas.unmet_mailly += 1;
        }
    }

    // Moulin → Mailly
    if rng.draw() < p2 {
        if next.moulin > 0 {
            next.moulin -= 1;
            next.mailly += 1;
        } else {
            deltas.unmet_moulin += 1;
        }
    }

    next.unmet_mailly += deltas.unmet_mailly;
    next.unmet_moulin += deltas.unmet_moulin;
    (next, deltas)
}
