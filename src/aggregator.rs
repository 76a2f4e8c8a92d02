use crate::models::Address;
use clap::ValueEnum;
use dashmap::DashMap;
use num_bigint::BigInt;
use num_traits::Signed;
use std::collections::BTreeMap;

/// Net balance delta per address, shared by all fetch tasks.
///
/// `DashMap` locks per shard, so the lazy insert of a new address and the
/// arithmetic on it happen under one entry guard and no update is lost.
#[derive(Debug, Default)]
pub struct BalanceAggregator {
    balances: DashMap<Address, BigInt>,
}

impl BalanceAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn credit(&self, address: &str, amount: &BigInt) {
        *self.balances.entry(address.to_string()).or_default() += amount;
    }

    pub fn debit(&self, address: &str, amount: &BigInt) {
        *self.balances.entry(address.to_string()).or_default() -= amount;
    }

    /// Copy of every balance, ordered by address.
    ///
    /// Only meaningful once all writers are done.
    pub fn snapshot(&self) -> BTreeMap<Address, BigInt> {
        self.balances
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceChange {
    pub address: Address,
    pub balance_change: BigInt,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum SelectionStrategy {
    /// Keep the last entry whose value differs from the running candidate.
    #[default]
    Permissive,
    /// Largest absolute change; the earliest entry wins ties.
    MaxAbs,
}

/// Pick the reported address from balances in iteration order.
pub fn select_balance_change<I>(
    balances: I,
    strategy: SelectionStrategy,
) -> Option<BalanceChange>
where
    I: IntoIterator<Item = (Address, BigInt)>,
{
    let mut candidate: Option<BalanceChange> = None;

    for (address, balance) in balances {
        let replace = match (&candidate, strategy) {
            (None, _) => true,
            (Some(current), SelectionStrategy::Permissive) => balance != current.balance_change,
            (Some(current), SelectionStrategy::MaxAbs) => {
                balance.abs() > current.balance_change.abs()
            }
        };

        if replace {
            candidate = Some(BalanceChange {
                address,
                balance_change: balance,
            });
        }
    }

    candidate
}
