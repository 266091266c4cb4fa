//! benchtab-ranker — Score normalisation and aggregate scenarios.
//! Turns raw per-scenario scores into comparable [0, 1] values and derives
//! synthetic scenarios (mean or mean win-rate) over a scenario subset.

pub mod normalise;
pub mod aggregate;

pub use aggregate::{
    add_aggregate, compute_aggregate, win_rates, AggregateMode, AggregateSpec, AggregateSummary,
    AggregatedFromPolicy, ScenarioFilter,
};
pub use normalise::{minmax_normalise, normalise_long_table, normalise_scores_per_scenario, normalise_table};
