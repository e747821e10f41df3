mod assets;
mod results;
mod scenario;

pub use assets::{ASSET_COUNT, Asset, AssetMap, AssetMatrix, AssetVector};
pub use results::{BalanceMatrix, EndBalancePercentiles, SimulationSummary};
pub use scenario::{
    Account, BlackSwanEvent, CapitalMarketAssumptions, ConsultingLadder, IncomeStream, LumpEvent,
    MAX_CONSULTING_YEARS, MAX_SIMS, MIN_SIMS, Scenario, Spending, Taxes, ToyPurchase,
};
