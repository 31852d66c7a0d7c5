// Copyright 2026 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

pub const DEFAULT_STARTING_BALANCE: f64 = 1000.0;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BalanceError {
    #[error("wallet {wallet_id} does not exist")]
    WalletNotFound { wallet_id: String },

    #[error("there is no active wallet to credit")]
    NoActiveWallet,

    #[error("{amount} is not a valid reward amount")]
    InvalidAmount { amount: f64 },
}

/// Credits minted rewards to the user's balance.
#[async_trait]
pub trait BalanceMutator: Send + Sync {
    async fn apply_reward(&self, amount: f64) -> Result<(), BalanceError>;
}

#[async_trait]
impl<T> BalanceMutator for Arc<T>
where
    T: BalanceMutator + ?Sized,
{
    async fn apply_reward(&self, amount: f64) -> Result<(), BalanceError> {
        (**self).apply_reward(amount).await
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Wallet {
    pub id: String,
    pub name: String,
    pub user_id: String,
    pub balances: HashMap<String, f64>,
}

impl Wallet {
    pub fn balance(&self, currency: &str) -> f64 {
        self.balances.get(currency).copied().unwrap_or_default()
    }
}

#[derive(Debug, Default)]
struct LedgerState {
    wallets: HashMap<String, Wallet>,
    active: Option<String>,
}

/// Local, non-transactional ledger of the user's wallets.
/// Rewards are always credited to the active wallet in the reward currency.
#[derive(Debug, Clone)]
pub struct WalletLedger {
    currency: String,
    state: Arc<RwLock<LedgerState>>,
}

impl WalletLedger {
    pub fn new(currency: impl Into<String>) -> Self {
        WalletLedger {
            currency: currency.into(),
            state: Default::default(),
        }
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Create a wallet holding `starting_balance` of the reward currency.
    /// The first wallet created becomes the active one.
    pub async fn create_wallet(
        &self,
        id: impl Into<String>,
        name: impl Into<String>,
        user_id: impl Into<String>,
        starting_balance: f64,
    ) -> Wallet {
        let wallet = Wallet {
            id: id.into(),
            name: name.into(),
            user_id: user_id.into(),
            balances: HashMap::from([(self.currency.clone(), starting_balance)]),
        };

        let mut state = self.state.write().await;
        if state.active.is_none() {
            state.active = Some(wallet.id.clone());
        }
        state.wallets.insert(wallet.id.clone(), wallet.clone());
        wallet
    }

    pub async fn set_active_wallet(&self, wallet_id: &str) -> Result<(), BalanceError> {
        let mut state = self.state.write().await;
        if !state.wallets.contains_key(wallet_id) {
            return Err(BalanceError::WalletNotFound {
                wallet_id: wallet_id.to_string(),
            });
        }
        state.active = Some(wallet_id.to_string());
        Ok(())
    }

    pub async fn wallet(&self, wallet_id: &str) -> Option<Wallet> {
        self.state.read().await.wallets.get(wallet_id).cloned()
    }

    pub async fn balance(&self, wallet_id: &str, currency: &str) -> Result<f64, BalanceError> {
        self.state
            .read()
            .await
            .wallets
            .get(wallet_id)
            .map(|wallet| wallet.balance(currency))
            .ok_or_else(|| BalanceError::WalletNotFound {
                wallet_id: wallet_id.to_string(),
            })
    }

    pub async fn add_currency(
        &self,
        wallet_id: &str,
        currency: &str,
        amount: f64,
    ) -> Result<f64, BalanceError> {
        if !amount.is_finite() {
            return Err(BalanceError::InvalidAmount { amount });
        }

        let mut state = self.state.write().await;
        let wallet =
            state
                .wallets
                .get_mut(wallet_id)
                .ok_or_else(|| BalanceError::WalletNotFound {
                    wallet_id: wallet_id.to_string(),
                })?;
        let balance = wallet.balances.entry(currency.to_string()).or_default();
        *balance += amount;
        Ok(*balance)
    }
}

#[async_trait]
impl BalanceMutator for WalletLedger {
    async fn apply_reward(&self, amount: f64) -> Result<(), BalanceError> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(BalanceError::InvalidAmount { amount });
        }

        let active = self
            .state
            .read()
            .await
            .active
            .clone()
            .ok_or(BalanceError::NoActiveWallet)?;
        let new_balance = self.add_currency(&active, &self.currency, amount).await?;
        debug!(
            "credited {amount} {} to {active}, new balance: {new_balance}",
            self.currency
        );
        Ok(())
    }
}
