pub mod calibration;
pub mod config;
pub mod constants;
pub mod expectation;
pub mod logging;
pub mod priors;
pub mod rng;
pub mod sim;
pub mod slate;
pub mod teams;

pub use config::ModelConfig;
pub use expectation::{expected_points, ExpectedPointsResult, PriorsCache};
pub use priors::{estimate_priors, PriorsContext, TeamPriors, TeamSampleMetrics};
pub use sim::{Engine, SimulationOptions, SimulationResult, SimulationSummary, Simulator};
pub use slate::simulate_slate;
