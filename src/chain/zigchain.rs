//! ZigChain signing client.
//!
//! Talks to a CometBFT node over its JSON-RPC endpoint. Queries go through
//! `abci_query` with protobuf-encoded requests; transactions are signed in
//! direct mode, fee-estimated by simulation, broadcast in sync mode and
//! then polled until included in a block.

use std::time::Duration;

use async_trait::async_trait;
use bip32::DerivationPath;
use bip39::Mnemonic;
use cosmrs::cosmwasm::MsgExecuteContract;
use cosmrs::crypto::{secp256k1::SigningKey, PublicKey};
use cosmrs::proto::cosmos::auth::v1beta1::{BaseAccount, QueryAccountRequest, QueryAccountResponse};
use cosmrs::proto::cosmos::bank::v1beta1::{QueryBalanceRequest, QueryBalanceResponse};
use cosmrs::proto::cosmos::tx::v1beta1::{SimulateRequest, SimulateResponse};
use cosmrs::proto::cosmwasm::wasm::v1::{
    QuerySmartContractStateRequest, QuerySmartContractStateResponse,
};
use cosmrs::rpc::{Client as _, HttpClient};
use cosmrs::tendermint::chain::Id as ChainId;
use cosmrs::tendermint::Hash;
use cosmrs::tx::{self, Fee, Msg, SignDoc, SignerInfo};
use cosmrs::{AccountId, Any, Coin, Denom};
use prost::Message;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, info};

use super::gas::{self, GasPrice};
use super::{ChainClient, ChainError, Funds};
use crate::config::ChainConfig;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Standard Cosmos coin type 118, first account, first address.
const DERIVATION_PATH: &str = "m/44'/118'/0'/0/0";

const ACCOUNT_QUERY_PATH: &str = "/cosmos.auth.v1beta1.Query/Account";
const BALANCE_QUERY_PATH: &str = "/cosmos.bank.v1beta1.Query/Balance";
const SMART_QUERY_PATH: &str = "/cosmwasm.wasm.v1.Query/SmartContractState";
const SIMULATE_PATH: &str = "/cosmos.tx.v1beta1.Service/Simulate";

const BASE_ACCOUNT_TYPE_URL: &str = "/cosmos.auth.v1beta1.BaseAccount";

// ---------------------------------------------------------------------------
// Signer
// ---------------------------------------------------------------------------

/// The single account derived from the recovery phrase.
pub struct Signer {
    signing_key: SigningKey,
    public_key: PublicKey,
    address: AccountId,
}

impl Signer {
    /// Derive the first account of `phrase` and encode its address with
    /// the bech32 `prefix`.
    pub fn from_mnemonic(phrase: &SecretString, prefix: &str) -> Result<Self, ChainError> {
        let mnemonic = Mnemonic::parse_normalized(phrase.expose_secret().trim())
            .map_err(|e| ChainError::Signing(format!("invalid recovery phrase: {e}")))?;
        let seed = mnemonic.to_seed_normalized("");

        let path: DerivationPath = DERIVATION_PATH.parse()?;

        let signing_key = SigningKey::derive_from_path(seed, &path)?;
        let public_key = signing_key.public_key();
        let address = public_key.account_id(prefix)?;

        Ok(Self {
            signing_key,
            public_key,
            address,
        })
    }

    pub fn address(&self) -> &AccountId {
        &self.address
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Connected signing client for one account on one node.
pub struct ZigChainClient {
    rpc: HttpClient,
    signer: Signer,
    chain_id: ChainId,
    gas_price: GasPrice,
    gas_adjustment: Decimal,
    memo: String,
    poll_interval: Duration,
    tx_timeout: Duration,
}

impl ZigChainClient {
    /// Connect to `endpoint` and resolve the chain id from the node status.
    pub async fn connect(
        endpoint: &str,
        signer: Signer,
        config: &ChainConfig,
    ) -> Result<Self, ChainError> {
        let gas_price: GasPrice = config
            .gas_price
            .parse()
            .map_err(|e: gas::GasPriceError| ChainError::Config(e.to_string()))?;

        let rpc = HttpClient::new(endpoint)?;
        let status = rpc.status().await?;
        let chain_id = status.node_info.network;

        info!(
            chain_id = %chain_id,
            address = %signer.address,
            gas_price = %gas_price,
            "Connected to node"
        );

        Ok(Self {
            rpc,
            signer,
            chain_id,
            gas_price,
            gas_adjustment: config.gas_adjustment,
            memo: config.memo.clone(),
            poll_interval: Duration::from_millis(config.tx_poll_interval_ms),
            tx_timeout: Duration::from_secs(config.tx_timeout_secs),
        })
    }

    pub fn chain_id(&self) -> &ChainId {
        &self.chain_id
    }

    // -- Internal helpers ------------------------------------------------

    async fn abci_query<Req, Resp>(&self, path: &str, request: Req) -> Result<Resp, ChainError>
    where
        Req: Message,
        Resp: Message + Default,
    {
        let data = request.encode_to_vec();
        let response = self
            .rpc
            .abci_query(Some(path.to_string()), data, None, false)
            .await?;

        if response.code.is_err() {
            return Err(ChainError::QueryFailed {
                path: path.to_string(),
                codespace: response.codespace,
                code: response.code.value(),
                log: response.log,
            });
        }

        Ok(Resp::decode(response.value.as_slice())?)
    }

    /// Fetch account number and sequence just before signing.
    async fn account(&self) -> Result<BaseAccount, ChainError> {
        let response: QueryAccountResponse = self
            .abci_query(
                ACCOUNT_QUERY_PATH,
                QueryAccountRequest {
                    address: self.signer.address.to_string(),
                },
            )
            .await?;

        let account = response
            .account
            .ok_or_else(|| ChainError::NotFound(format!("account {}", self.signer.address)))?;

        if account.type_url != BASE_ACCOUNT_TYPE_URL {
            return Err(ChainError::Decode(format!(
                "unsupported account type {}",
                account.type_url
            )));
        }

        Ok(BaseAccount::decode(account.value.as_slice())?)
    }

    fn fee_coin(&self, amount: u128) -> Result<Coin, ChainError> {
        Ok(Coin {
            denom: self.gas_price.denom.parse::<Denom>()?,
            amount,
        })
    }

    fn sign(&self, msg: Any, fee: Fee, account: &BaseAccount) -> Result<Vec<u8>, ChainError> {
        let body = tx::BodyBuilder::new()
            .msg(msg)
            .memo(self.memo.clone())
            .finish();

        let auth_info =
            SignerInfo::single_direct(Some(self.signer.public_key), account.sequence).auth_info(fee);

        let sign_doc = SignDoc::new(&body, &auth_info, &self.chain_id, account.account_number)?;
        let raw = sign_doc.sign(&self.signer.signing_key)?;

        Ok(raw.to_bytes()?)
    }

    async fn simulate(&self, msg: Any, account: &BaseAccount) -> Result<u64, ChainError> {
        let fee = Fee::from_amount_and_gas(self.fee_coin(0)?, 0u64);
        let tx_bytes = self.sign(msg, fee, account)?;

        #[allow(deprecated)]
        let request = SimulateRequest { tx: None, tx_bytes };

        let response: SimulateResponse = self.abci_query(SIMULATE_PATH, request).await?;

        response
            .gas_info
            .map(|info| info.gas_used)
            .ok_or_else(|| ChainError::Decode("simulation response without gas info".into()))
    }

    async fn wait_for_inclusion(&self, hash: Hash) -> Result<(), ChainError> {
        let started = tokio::time::Instant::now();

        loop {
            tokio::time::sleep(self.poll_interval).await;

            match self.rpc.tx(hash, false).await {
                Ok(response) => {
                    let result = response.tx_result;
                    if result.code.is_err() {
                        return Err(ChainError::Rejected {
                            codespace: result.codespace,
                            code: result.code.value(),
                            log: result.log,
                        });
                    }
                    debug!(
                        tx = %hash,
                        height = %response.height,
                        gas_used = result.gas_used,
                        "Transaction included"
                    );
                    return Ok(());
                }
                Err(e) => debug!(tx = %hash, error = %e, "Transaction not indexed yet"),
            }

            if started.elapsed() >= self.tx_timeout {
                return Err(ChainError::Timeout {
                    hash: hash.to_string(),
                    timeout_secs: self.tx_timeout.as_secs(),
                });
            }
        }
    }
}

#[async_trait]
impl ChainClient for ZigChainClient {
    async fn balance(&self, address: &str, denom: &str) -> Result<u128, ChainError> {
        let response: QueryBalanceResponse = self
            .abci_query(
                BALANCE_QUERY_PATH,
                QueryBalanceRequest {
                    address: address.to_string(),
                    denom: denom.to_string(),
                },
            )
            .await?;

        let coin = response
            .balance
            .ok_or_else(|| ChainError::NotFound(format!("balance of {denom} for {address}")))?;

        coin.amount
            .parse::<u128>()
            .map_err(|e| ChainError::Decode(format!("balance amount {:?}: {e}", coin.amount)))
    }

    async fn execute(
        &self,
        sender: &str,
        contract: &str,
        msg: Value,
        mut funds: Vec<Funds>,
    ) -> Result<String, ChainError> {
        if sender != self.signer.address.as_ref() {
            return Err(ChainError::Signing(format!(
                "client holds the key for {}, not {sender}",
                self.signer.address
            )));
        }

        // The bank module only accepts coins sorted by denom.
        funds.sort_by(|a, b| a.denom.cmp(&b.denom));
        let funds = funds
            .iter()
            .map(|f| {
                Ok(Coin {
                    denom: f.denom.parse::<Denom>()?,
                    amount: f.amount,
                })
            })
            .collect::<Result<Vec<_>, ChainError>>()?;

        let msg_bytes = serde_json::to_vec(&msg)
            .map_err(|e| ChainError::Encode(format!("contract message: {e}")))?;

        let execute_msg = MsgExecuteContract {
            sender: self.signer.address.clone(),
            contract: contract.parse::<AccountId>()?,
            msg: msg_bytes,
            funds,
        }
        .to_any()?;

        let account = self.account().await?;
        let gas_used = self.simulate(execute_msg.clone(), &account).await?;
        let gas_limit = gas::gas_limit(gas_used, self.gas_adjustment);
        let fee = Fee::from_amount_and_gas(
            self.fee_coin(self.gas_price.fee_for(gas_limit))?,
            gas_limit,
        );

        debug!(
            contract,
            gas_used,
            gas_limit,
            sequence = account.sequence,
            "Broadcasting contract execution"
        );

        let tx_bytes = self.sign(execute_msg, fee, &account)?;
        let response = self.rpc.broadcast_tx_sync(tx_bytes).await?;

        if response.code.is_err() {
            return Err(ChainError::Rejected {
                codespace: response.codespace,
                code: response.code.value(),
                log: response.log,
            });
        }

        self.wait_for_inclusion(response.hash).await?;
        Ok(response.hash.to_string())
    }

    async fn query_smart(&self, contract: &str, query: Value) -> Result<Value, ChainError> {
        let query_data = serde_json::to_vec(&query)
            .map_err(|e| ChainError::Encode(format!("smart query: {e}")))?;

        let response: QuerySmartContractStateResponse = self
            .abci_query(
                SMART_QUERY_PATH,
                QuerySmartContractStateRequest {
                    address: contract.to_string(),
                    query_data,
                },
            )
            .await?;

        serde_json::from_slice(&response.data)
            .map_err(|e| ChainError::Decode(format!("smart query response: {e}")))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
