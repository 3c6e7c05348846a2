//! Concrete compliance policies.

pub mod country_allow;
pub mod exchange_monthly_limits;
pub mod supply_limit;
pub mod time_exchange_limits;
pub mod transfer_restrict;

pub use country_allow::CountryAllowModule;
pub use exchange_monthly_limits::{ExchangeCounter, ExchangeMonthlyLimitsModule};
pub use supply_limit::SupplyLimitModule;
pub use time_exchange_limits::{ExchangeLimit, TimeExchangeLimitsModule};
pub use transfer_restrict::TransferRestrictModule;
