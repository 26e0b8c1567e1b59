mod salinity_rebalance;
mod temperature_increment;

pub use salinity_rebalance::SalinityRebalance;
pub use temperature_increment::TemperatureIncrement;
