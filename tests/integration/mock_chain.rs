//! Mock chain for integration testing.
//!
//! A deterministic `ChainClient` with an in-memory bank ledger and a router
//! that answers simulations with a fixed return amount. Executions move
//! funds between the ledger and the router, and reject with the SDK
//! insufficient-funds code when the sender cannot cover them.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use oroswap_farmer::chain::{ChainClient, ChainError, Funds};

/// One recorded contract execution.
#[derive(Debug, Clone)]
pub struct Execution {
    pub sender: String,
    pub contract: String,
    pub msg: Value,
    pub funds: Vec<Funds>,
    pub tx_hash: String,
}

impl Execution {
    /// Top-level message name, e.g. "swap".
    pub fn action(&self) -> String {
        self.msg
            .as_object()
            .and_then(|o| o.keys().next().cloned())
            .unwrap_or_default()
    }
}

/// Clones share the same ledger.
#[derive(Clone)]
pub struct MockChain {
    balances: Arc<Mutex<HashMap<(String, String), u128>>>,
    /// Counter-asset return of a simulation.
    simulation_return: u128,
    /// Counter asset credited by every swap.
    swap_return: (String, u128),
    executions: Arc<Mutex<Vec<Execution>>>,
    /// Errors returned by the next executions, in order.
    scripted_failures: Arc<Mutex<VecDeque<ChainError>>>,
    /// Denoms whose balance query fails.
    unavailable_denoms: Arc<Mutex<HashSet<String>>>,
    tx_counter: Arc<Mutex<u64>>,
}

impl MockChain {
    pub fn new(simulation_return: u128, swap_return: (&str, u128)) -> Self {
        Self {
            balances: Arc::new(Mutex::new(HashMap::new())),
            simulation_return,
            swap_return: (swap_return.0.to_string(), swap_return.1),
            executions: Arc::new(Mutex::new(Vec::new())),
            scripted_failures: Arc::new(Mutex::new(VecDeque::new())),
            unavailable_denoms: Arc::new(Mutex::new(HashSet::new())),
            tx_counter: Arc::new(Mutex::new(0)),
        }
    }

    pub fn set_balance(&self, address: &str, denom: &str, amount: u128) {
        self.balances
            .lock()
            .unwrap()
            .insert((address.to_string(), denom.to_string()), amount);
    }

    pub fn balance_of(&self, address: &str, denom: &str) -> u128 {
        *self
            .balances
            .lock()
            .unwrap()
            .get(&(address.to_string(), denom.to_string()))
            .unwrap_or(&0)
    }

    /// Make the next execution fail with `err`.
    pub fn fail_next_execute(&self, err: ChainError) {
        self.scripted_failures.lock().unwrap().push_back(err);
    }

    pub fn make_denom_unavailable(&self, denom: &str) {
        self.unavailable_denoms
            .lock()
            .unwrap()
            .insert(denom.to_string());
    }

    pub fn executions(&self) -> Vec<Execution> {
        self.executions.lock().unwrap().clone()
    }

    fn next_hash(&self) -> String {
        let mut counter = self.tx_counter.lock().unwrap();
        *counter += 1;
        format!("MOCKTX{:04}", *counter)
    }
}

#[async_trait]
impl ChainClient for MockChain {
    async fn balance(&self, address: &str, denom: &str) -> Result<u128, ChainError> {
        if self.unavailable_denoms.lock().unwrap().contains(denom) {
            return Err(ChainError::QueryFailed {
                path: "/cosmos.bank.v1beta1.Query/Balance".into(),
                codespace: "sdk".into(),
                code: 1,
                log: format!("denom {denom} unavailable"),
            });
        }
        Ok(self.balance_of(address, denom))
    }

    async fn execute(
        &self,
        sender: &str,
        contract: &str,
        msg: Value,
        funds: Vec<Funds>,
    ) -> Result<String, ChainError> {
        if let Some(err) = self.scripted_failures.lock().unwrap().pop_front() {
            return Err(err);
        }

        {
            let mut balances = self.balances.lock().unwrap();
            for coin in &funds {
                let held = *balances
                    .get(&(sender.to_string(), coin.denom.clone()))
                    .unwrap_or(&0);
                if held < coin.amount {
                    return Err(ChainError::Rejected {
                        codespace: "sdk".into(),
                        code: 5,
                        log: format!(
                            "spendable balance {held}{} is smaller than {coin}: insufficient funds",
                            coin.denom
                        ),
                    });
                }
            }
            for coin in &funds {
                *balances
                    .entry((sender.to_string(), coin.denom.clone()))
                    .or_insert(0) -= coin.amount;
            }
            if msg.get("swap").is_some() {
                let (denom, amount) = &self.swap_return;
                *balances
                    .entry((sender.to_string(), denom.clone()))
                    .or_insert(0) += amount;
            }
        }

        let tx_hash = self.next_hash();
        self.executions.lock().unwrap().push(Execution {
            sender: sender.to_string(),
            contract: contract.to_string(),
            msg,
            funds,
            tx_hash: tx_hash.clone(),
        });
        Ok(tx_hash)
    }

    async fn query_smart(&self, _contract: &str, query: Value) -> Result<Value, ChainError> {
        if query.get("simulation").is_none() {
            return Err(ChainError::QueryFailed {
                path: "/cosmwasm.wasm.v1.Query/SmartContractState".into(),
                codespace: "wasm".into(),
                code: 9,
                log: "unknown query".into(),
            });
        }
        Ok(json!({
            "return_amount": self.simulation_return.to_string(),
            "spread_amount": "0",
            "commission_amount": "0"
        }))
    }
}
