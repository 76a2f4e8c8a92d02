use crate::aggregator::{
    BalanceAggregator, BalanceChange, SelectionStrategy, select_balance_change,
};
use crate::config::Config;
use crate::error::ScanError;
use crate::models::Address;
use crate::rate_limiter::RateLimiter;
use crate::rpc::{LedgerClient, RpcTransport};
use num_bigint::BigInt;
use std::collections::{BTreeMap, HashMap};
use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::{Id, JoinError, JoinSet};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    Idle,
    FetchingLatestHeight,
    FetchingWindow,
    Aggregating,
    Reporting,
    Done,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanReport {
    pub from_block: u64,
    pub to_block: u64,
    pub blocks_scanned: u64,
    pub transfers_applied: u64,
    /// Net delta of every touched address, ordered by address.
    pub balances: BTreeMap<Address, BigInt>,
    pub selection: Option<BalanceChange>,
}

impl ScanReport {
    pub fn addresses_touched(&self) -> usize {
        self.balances.len()
    }
}

/// The `window_size` most recent block numbers ending at `latest`, clamped at genesis.
pub fn scan_window(latest: u64, window_size: u64) -> RangeInclusive<u64> {
    let start = latest.saturating_sub(window_size.saturating_sub(1));
    start..=latest
}

pub struct Scanner<T> {
    client: Arc<LedgerClient<T>>,
    limiter: RateLimiter,
    window_size: u64,
    selection: SelectionStrategy,
    phase: ScanPhase,
}

impl<T: RpcTransport + 'static> Scanner<T> {
    pub fn new(client: LedgerClient<T>, config: &Config) -> Self {
        Scanner {
            client: Arc::new(client),
            limiter: RateLimiter::new(config.rate_limit_interval),
            window_size: config.window_size.max(1),
            selection: config.selection,
            phase: ScanPhase::Idle,
        }
    }

    pub fn phase(&self) -> ScanPhase {
        self.phase
    }

    fn transition(&mut self, phase: ScanPhase) {
        debug!("Scan phase {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
    }

    /// Scan the window once. Any fetch or decode failure aborts the remaining
    /// fetches and is returned as-is; no partial report is ever produced.
    pub async fn run(&mut self) -> Result<ScanReport, ScanError> {
        let started = Instant::now();
        match self.scan().await {
            Ok(report) => {
                self.transition(ScanPhase::Done);
                info!(
                    "Scanned {} blocks in {:?}",
                    report.blocks_scanned,
                    started.elapsed()
                );
                Ok(report)
            }
            Err(e) => {
                self.transition(ScanPhase::Failed);
                Err(e)
            }
        }
    }

    async fn scan(&mut self) -> Result<ScanReport, ScanError> {
        self.transition(ScanPhase::FetchingLatestHeight);
        let latest = self.client.get_latest_block_number().await?;
        let window = scan_window(latest, self.window_size);
        info!(
            "Latest block is {}, scanning blocks {} to {}",
            latest,
            window.start(),
            window.end()
        );

        self.transition(ScanPhase::FetchingWindow);
        let aggregator = Arc::new(BalanceAggregator::new());
        let mut tasks = FetchTasks::default();

        for number in window.clone().rev() {
            self.limiter.acquire().await;
            // stop dispatching as soon as an earlier fetch has failed
            tasks.collect_finished()?;

            let client = self.client.clone();
            let aggregator = aggregator.clone();
            tasks.spawn(number, async move {
                fetch_and_apply(&*client, &*aggregator, number).await
            });
        }
        tasks.collect_all().await?;

        self.transition(ScanPhase::Aggregating);
        let balances = aggregator.snapshot();

        self.transition(ScanPhase::Reporting);
        let selection = select_balance_change(balances.clone(), self.selection);

        Ok(ScanReport {
            from_block: *window.start(),
            to_block: *window.end(),
            blocks_scanned: window.end() - window.start() + 1,
            transfers_applied: tasks.transfers_applied,
            balances,
            selection,
        })
    }
}

/// Fetch one block and book each non-zero transfer: sender debited, recipient credited.
async fn fetch_and_apply<T: RpcTransport>(
    client: &LedgerClient<T>,
    aggregator: &BalanceAggregator,
    number: u64,
) -> Result<u64, ScanError> {
    let block = client.get_block(number).await?;

    let mut applied = 0;
    for transfer in block.transactions {
        if transfer.is_zero() {
            continue;
        }

        aggregator.debit(&transfer.from, &transfer.value);
        if let Some(to) = &transfer.to {
            aggregator.credit(to, &transfer.value);
        }
        applied += 1;
    }

    Ok(applied)
}

/// The in-flight fetches of one scan. Dropping it aborts whatever is still running.
#[derive(Default)]
struct FetchTasks {
    set: JoinSet<Result<u64, ScanError>>,
    blocks: HashMap<Id, u64>,
    transfers_applied: u64,
}

impl FetchTasks {
    fn spawn<F>(&mut self, number: u64, task: F)
    where
        F: Future<Output = Result<u64, ScanError>> + Send + 'static,
    {
        let handle = self.set.spawn(task);
        self.blocks.insert(handle.id(), number);
    }

    fn collect_finished(&mut self) -> Result<(), ScanError> {
        while let Some(joined) = self.set.try_join_next_with_id() {
            self.record(joined)?;
        }
        Ok(())
    }

    async fn collect_all(&mut self) -> Result<(), ScanError> {
        while let Some(joined) = self.set.join_next_with_id().await {
            self.record(joined)?;
        }
        Ok(())
    }

    fn record(
        &mut self,
        joined: Result<(Id, Result<u64, ScanError>), JoinError>,
    ) -> Result<(), ScanError> {
        let outcome = match joined {
            Ok((id, result)) => {
                let number = self.blocks.remove(&id).unwrap_or_default();
                result.inspect_err(|e| warn!("Fetching block {} failed: {}", number, e))
            }
            Err(e) => {
                let block = self.blocks.remove(&e.id()).unwrap_or_default();
                Err(ScanError::TaskFailed {
                    block,
                    reason: e.to_string(),
                })
            }
        };

        match outcome {
            Ok(applied) => {
                self.transfers_applied += applied;
                Ok(())
            }
            Err(e) => {
                let pending = self.set.len();
                self.set.abort_all();
                if pending > 0 {
                    info!("Cancelled {} in-flight block fetches", pending);
                }
                Err(e)
            }
        }
    }
}
