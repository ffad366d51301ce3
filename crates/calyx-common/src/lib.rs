//! calyx-common — Shared types, errors, and traits used across all Calyx crates.

pub mod error;
pub mod company;
pub mod market;
pub mod confidence;

// Re-export commonly used types
pub use error::{CalyxError, Result};
pub use company::{CompanyRecord, Financials, Program, DevelopmentStage};
pub use market::{MarketContext, MarketContextProvider, MockMarketContextProvider};
pub use confidence::{ConfidenceMetrics, ConfidenceBlend};
