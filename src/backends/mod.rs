pub mod simulated;

pub use simulated::SimulatedBackend;
