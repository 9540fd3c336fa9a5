//! Token transfer collaborator.
//!
//! Settlement hands the full transfer list of a batch to the ledger in one
//! call; the ledger applies all of it or none of it.

use std::collections::HashMap;
use std::fmt;

use parking_lot::Mutex;
use thiserror::Error;

use crate::types::{Address, PoolId};

/// Holder of token balances
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub enum Account {
    Trader(Address),
    /// Pool vault backing the reserves
    Pool(PoolId),
    /// Protocol fee recipient
    Treasury,
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Account::Trader(address) => write!(f, "trader:{address}"),
            Account::Pool(pool) => write!(f, "pool:{pool}"),
            Account::Treasury => write!(f, "treasury"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub struct Transfer {
    pub token: Address,
    pub from: Account,
    pub to: Account,
    pub amount: u128,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("{account} holds {available} of {token}, needs {needed}")]
    InsufficientBalance {
        account: Account,
        token: Address,
        needed: u128,
        available: u128,
    },

    #[error("Balance overflow for {0}")]
    Overflow(Account),
}

/// Atomic multi-transfer execution
pub trait TokenLedger: Send + Sync {
    fn apply(&self, transfers: &[Transfer]) -> Result<(), LedgerError>;
}

/// Balance book kept in memory
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    balances: Mutex<HashMap<(Account, Address), u128>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn credit(&self, account: Account, token: Address, amount: u128) -> Result<(), LedgerError> {
        let mut balances = self.balances.lock();
        let balance = balances.entry((account, token)).or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or(LedgerError::Overflow(account))?;
        Ok(())
    }

    pub fn balance(&self, account: Account, token: Address) -> u128 {
        self.balances
            .lock()
            .get(&(account, token))
            .copied()
            .unwrap_or(0)
    }
}

impl TokenLedger for InMemoryLedger {
    fn apply(&self, transfers: &[Transfer]) -> Result<(), LedgerError> {
        let mut balances = self.balances.lock();
        // Work on a copy; swap it in only when every transfer succeeded
        let mut staged = balances.clone();

        for transfer in transfers {
            let from = staged.entry((transfer.from, transfer.token)).or_insert(0);
            if *from < transfer.amount {
                return Err(LedgerError::InsufficientBalance {
                    account: transfer.from,
                    token: transfer.token,
                    needed: transfer.amount,
                    available: *from,
                });
            }
            *from -= transfer.amount;

            let to = staged.entry((transfer.to, transfer.token)).or_insert(0);
            *to = to
                .checked_add(transfer.amount)
                .ok_or(LedgerError::Overflow(transfer.to))?;
        }

        *balances = staged;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_moves_balances() {
        let ledger = InMemoryLedger::new();
        let token = Address::repeat(1);
        let alice = Account::Trader(Address::repeat(7));
        let pool = Account::Pool(PoolId::repeat(9));
        ledger.credit(alice, token, 100).unwrap();

        ledger
            .apply(&[Transfer {
                token,
                from: alice,
                to: pool,
                amount: 60,
            }])
            .unwrap();
        assert_eq!(ledger.balance(alice, token), 40);
        assert_eq!(ledger.balance(pool, token), 60);
    }

    #[test]
    fn test_apply_is_all_or_nothing() {
        let ledger = InMemoryLedger::new();
        let token = Address::repeat(1);
        let alice = Account::Trader(Address::repeat(7));
        let bob = Account::Trader(Address::repeat(8));
        ledger.credit(alice, token, 100).unwrap();

        let result = ledger.apply(&[
            Transfer {
                token,
                from: alice,
                to: bob,
                amount: 50,
            },
            Transfer {
                token,
                from: bob,
                to: Account::Treasury,
                amount: 80,
            },
        ]);

        assert_eq!(
            result,
            Err(LedgerError::InsufficientBalance {
                account: bob,
                token,
                needed: 80,
                available: 50,
            })
        );
        assert_eq!(ledger.balance(alice, token), 100);
        assert_eq!(ledger.balance(bob, token), 0);
    }
}
