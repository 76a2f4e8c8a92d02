pub mod aggregator;
pub mod config;
pub mod error;
pub mod formatters;
pub mod hex;
pub mod models;
pub mod rate_limiter;
pub mod rpc;
pub mod scanner;

pub use aggregator::{BalanceAggregator, BalanceChange, SelectionStrategy};
pub use error::ScanError;
pub use rpc::{HttpTransport, LedgerClient, RpcTransport};
pub use scanner::{ScanReport, Scanner};
