pub mod connection;
pub mod fixtures;
pub mod migrations;
pub mod store;

pub use connection::{connect, connect_with_settings, DbPool};
pub use fixtures::{seed_reference_data, SeedSummary};
pub use store::{
    ApprovalStore, CalculationRuleSet, InMemoryApprovalStore, InMemoryCalculationRuleSet,
    InMemoryQuoteStore, InMemoryRateCatalog, QuoteStore, RateCatalog, SqlApprovalStore,
    SqlCalculationRuleSet, SqlQuoteStore, SqlRateCatalog, StoreError,
};
