mod direction;
mod execution_guard;
mod orchestrator;
mod price_oracle;
mod profit_simulator;
mod report;

#[cfg(test)]
mod test_support;

pub use direction::{percentage_difference, resolve_direction};
pub use execution_guard::{ExecutionGuard, GuardPermit, GuardStats};
pub use orchestrator::{ArbitrageOrchestrator, CycleOutcome, CycleSummary, OrchestratorConfig};
pub use price_oracle::{OracleError, PriceOracle};
pub use profit_simulator::{Leg, ProfitSimulator, RejectReason, SimulationOutcome, SimulatorConfig};
pub use report::{BalanceReport, WalletSnapshot};
