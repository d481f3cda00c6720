//! In-memory node used by the test suite.
//!
//! Keeps just enough chain state to exercise the signing pipeline: balances, nonces, locked
//! and unlocked accounts, and a single Greeter contract. Addresses are accepted in every
//! encoding, so whatever reaches the node is judged on content only.

use crate::address::decode_address;
use crate::normalize::parse_quantity;
use crate::traits::RequestHandler;
use crate::types::{SignerError, SignerResult, ETH_SEND_RAW_TRANSACTION, ETH_SEND_TRANSACTION};
use alloy_consensus::{Transaction, TxEnvelope};
use alloy_eips::eip2718::Decodable2718;
use alloy_primitives::{address, hex, keccak256, Address, Bytes, B256, U256};
use alloy_signer_local::PrivateKeySigner;
use jsonrpsee::core::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};

pub const CHAIN_ID: u64 = 1337;
pub const GAS_PRICE: u64 = 1_000_000_000;
const TRANSFER_GAS: u64 = 21_000;
const CALL_GAS: u64 = 60_000;

/// Funded and unlocked on a fresh node
pub const DEV_ACCOUNTS: [Address; 2] = [
    address!("0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf"),
    address!("0x2B5AD5c4795c026514f8317c7a215E218DcCD6cF"),
];

pub const GREET: &str = "greet()";
pub const PAY_FOR_NOTHING: &str = "payForNothing()";

/// Four byte function selector
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Calldata for a call without arguments
pub fn calldata(signature: &str) -> Value {
    Value::String(hex::encode_prefixed(selector(signature)))
}

pub fn ether(amount: u64) -> U256 {
    U256::from(amount) * U256::from(10u64).pow(U256::from(18))
}

/// ABI encoding of a single string return value
fn abi_string(text: &str) -> Bytes {
    assert!(text.len() <= 32, "only single word strings are supported");
    let mut out = vec![0u8; 64];
    out[31] = 0x20;
    out[63] = text.len() as u8;
    let mut word = text.as_bytes().to_vec();
    word.resize(32, 0);
    out.extend(word);
    out.into()
}

fn rpc_error(code: i32, message: impl Into<String>) -> SignerError {
    SignerError::Rpc {
        code,
        message: message.into(),
    }
}

fn quantity(value: impl std::fmt::LowerHex) -> Value {
    Value::String(format!("0x{:x}", value))
}

#[derive(Debug, Default)]
struct Account {
    balance: U256,
    nonce: u64,
    unlocked: bool,
}

#[derive(Debug, Default)]
struct State {
    accounts: HashMap<Address, Account>,
    contracts: HashSet<Address>,
    receipts: HashMap<B256, Value>,
    raw_transactions: usize,
    block: u64,
}

/// A call to apply against the state
struct Execution<'a> {
    from: Address,
    to: Option<Address>,
    value: U256,
    data: &'a [u8],
}

impl State {
    fn account(&mut self, address: Address) -> &mut Account {
        self.accounts.entry(address).or_default()
    }

    fn execute(&mut self, execution: Execution<'_>) -> SignerResult<B256> {
        let Execution {
            from,
            to,
            value,
            data,
        } = execution;

        if let Some(to) = to.filter(|to| self.contracts.contains(to)) {
            let payable = data.get(..4) == Some(&selector(PAY_FOR_NOTHING)[..]);
            let known = payable || data.get(..4) == Some(&selector(GREET)[..]);
            if !known || (!payable && !value.is_zero()) {
                log::debug!("call to {} reverted", to);
                return Err(rpc_error(3, "execution reverted"));
            }
        }

        let sender = self.account(from);
        if sender.balance < value {
            return Err(rpc_error(-32000, "insufficient funds for transfer"));
        }
        sender.balance -= value;
        let nonce = sender.nonce;
        sender.nonce += 1;
        if let Some(to) = to {
            self.account(to).balance += value;
        }

        self.block += 1;
        let hash = keccak256([from.as_slice(), &nonce.to_be_bytes()].concat());
        self.receipts.insert(
            hash,
            json!({
                "transactionHash": hash,
                "blockNumber": quantity(self.block),
                "from": from,
                "to": to,
                "status": "0x1",
            }),
        );
        Ok(hash)
    }
}

/// Development chain living in memory
#[derive(Debug)]
pub struct MockNode {
    state: Mutex<State>,
}

impl Default for MockNode {
    fn default() -> Self {
        Self::new()
    }
}

impl MockNode {
    pub fn new() -> Self {
        let mut state = State::default();
        for address in DEV_ACCOUNTS {
            let account = state.account(address);
            account.balance = ether(1_000);
            account.unlocked = true;
        }
        Self {
            state: Mutex::new(state),
        }
    }

    /// Import a private key; the node knows the account but keeps it locked
    pub fn import_raw_key(&self, key: &str) -> Address {
        let address = key
            .parse::<PrivateKeySigner>()
            .expect("valid private key")
            .address();
        self.state.lock().account(address);
        address
    }

    /// Deploy a Greeter contract and return its address
    pub fn deploy_greeter(&self) -> Address {
        let mut state = self.state.lock();
        let address = Address::from_slice(&keccak256(state.contracts.len().to_be_bytes())[12..]);
        state.contracts.insert(address);
        state.account(address);
        address
    }

    pub fn balance(&self, address: Address) -> U256 {
        self.state
            .lock()
            .accounts
            .get(&address)
            .map_or(U256::ZERO, |account| account.balance)
    }

    pub fn nonce(&self, address: Address) -> u64 {
        self.state
            .lock()
            .accounts
            .get(&address)
            .map_or(0, |account| account.nonce)
    }

    /// Number of transactions that arrived already signed
    pub fn raw_transactions(&self) -> usize {
        self.state.lock().raw_transactions
    }

    fn send_transaction(&self, transaction: &Value) -> SignerResult<Value> {
        let from = transaction
            .get("from")
            .and_then(decode_address)
            .ok_or_else(|| rpc_error(-32602, "missing sender"))?;
        let to = optional_address(transaction, "to")?;
        let value = optional_quantity(transaction, "value")?;
        let data = input(transaction)?;

        let mut state = self.state.lock();
        if !state.accounts.get(&from).is_some_and(|account| account.unlocked) {
            return Err(rpc_error(-32000, format!("account locked: {}", from)));
        }
        let hash = state.execute(Execution {
            from,
            to,
            value,
            data: &data,
        })?;
        Ok(json!(hash))
    }

    fn send_raw_transaction(&self, raw: &Value) -> SignerResult<Value> {
        let raw = raw
            .as_str()
            .and_then(|text| hex::decode(text).ok())
            .ok_or_else(|| rpc_error(-32602, "expected hex encoded bytes"))?;
        let envelope = TxEnvelope::decode_2718(&mut raw.as_slice())
            .map_err(|e| rpc_error(-32602, format!("rlp: {}", e)))?;
        let from = envelope
            .recover_signer()
            .map_err(|e| rpc_error(-32000, format!("invalid sender: {}", e)))?;

        if envelope.chain_id().is_some_and(|id| id != CHAIN_ID) {
            return Err(rpc_error(-32000, "invalid chain id for signer"));
        }

        let mut state = self.state.lock();
        let expected = state.account(from).nonce;
        if envelope.nonce() != expected {
            return Err(rpc_error(
                -32000,
                format!("invalid nonce: expected {}, got {}", expected, envelope.nonce()),
            ));
        }
        let hash = state.execute(Execution {
            from,
            to: envelope.to(),
            value: envelope.value(),
            data: envelope.input(),
        })?;
        state.raw_transactions += 1;
        Ok(json!(hash))
    }

    fn call(&self, transaction: &Value) -> SignerResult<Value> {
        let to = optional_address(transaction, "to")?;
        let data = input(transaction)?;
        let is_contract = to.is_some_and(|to| self.state.lock().contracts.contains(&to));

        let output = if is_contract && data.get(..4) == Some(&selector(GREET)[..]) {
            abi_string("Hello")
        } else {
            Bytes::new()
        };
        Ok(json!(output))
    }

    fn estimate_gas(&self, transaction: &Value) -> SignerResult<Value> {
        optional_address(transaction, "to")?;
        let gas = if input(transaction)?.is_empty() {
            TRANSFER_GAS
        } else {
            CALL_GAS
        };
        Ok(quantity(gas))
    }
}

fn param(params: &[Value], index: usize) -> SignerResult<&Value> {
    params
        .get(index)
        .ok_or_else(|| rpc_error(-32602, format!("missing parameter {}", index)))
}

fn address_param(params: &[Value], index: usize) -> SignerResult<Address> {
    decode_address(param(params, index)?).ok_or_else(|| rpc_error(-32602, "invalid address"))
}

fn optional_address(transaction: &Value, field: &str) -> SignerResult<Option<Address>> {
    match transaction.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => decode_address(value)
            .map(Some)
            .ok_or_else(|| rpc_error(-32602, format!("invalid `{}` address", field))),
    }
}

fn optional_quantity(transaction: &Value, field: &str) -> SignerResult<U256> {
    match transaction.get(field) {
        None | Some(Value::Null) => Ok(U256::ZERO),
        Some(value) => parse_quantity(field, value),
    }
}

fn input(transaction: &Value) -> SignerResult<Vec<u8>> {
    match transaction.get("data").or_else(|| transaction.get("input")) {
        None | Some(Value::Null) => Ok(vec![]),
        Some(Value::String(text)) => {
            hex::decode(text).map_err(|e| rpc_error(-32602, format!("invalid data: {}", e)))
        }
        Some(_) => Err(rpc_error(-32602, "invalid data")),
    }
}

#[async_trait]
impl RequestHandler for MockNode {
    async fn request(&self, method: &str, params: Vec<Value>) -> SignerResult<Value> {
        log::trace!("mock node <- {} {:?}", method, params);
        match method {
            "eth_chainId" => Ok(quantity(CHAIN_ID)),
            "net_version" => Ok(json!(CHAIN_ID.to_string())),
            "eth_blockNumber" => Ok(quantity(self.state.lock().block)),
            "eth_gasPrice" => Ok(quantity(GAS_PRICE)),
            "eth_accounts" => {
                let state = self.state.lock();
                let mut unlocked: Vec<Address> = state
                    .accounts
                    .iter()
                    .filter(|(_, account)| account.unlocked)
                    .map(|(address, _)| *address)
                    .collect();
                unlocked.sort();
                Ok(json!(unlocked))
            }
            "eth_getBalance" => Ok(quantity(self.balance(address_param(&params, 0)?))),
            "eth_getTransactionCount" => Ok(quantity(self.nonce(address_param(&params, 0)?))),
            "eth_getTransactionReceipt" => {
                let hash = param(&params, 0)?
                    .as_str()
                    .and_then(|text| text.parse::<B256>().ok())
                    .ok_or_else(|| rpc_error(-32602, "invalid hash"))?;
                Ok(self
                    .state
                    .lock()
                    .receipts
                    .get(&hash)
                    .cloned()
                    .unwrap_or(Value::Null))
            }
            "eth_estimateGas" => self.estimate_gas(param(&params, 0)?),
            "eth_call" => self.call(param(&params, 0)?),
            ETH_SEND_TRANSACTION => self.send_transaction(param(&params, 0)?),
            ETH_SEND_RAW_TRANSACTION => self.send_raw_transaction(param(&params, 0)?),
            _ => Err(rpc_error(
                -32601,
                format!("the method {} does not exist/is not available", method),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::AddressEncoding;

    #[test]
    fn test_unlocked_accounts_send_in_every_encoding() {
        let node = MockNode::new();
        for encoding in [AddressEncoding::Hex, AddressEncoding::Bytes] {
            let from = encoding.encode(DEV_ACCOUNTS[0]);
            let to = encoding.encode(DEV_ACCOUNTS[1]);
            node.send_transaction(&json!({"from": from, "to": to, "value": "0x1"}))
                .unwrap();
        }

        assert_eq!(node.nonce(DEV_ACCOUNTS[0]), 2);
        assert_eq!(node.balance(DEV_ACCOUNTS[1]), ether(1_000) + U256::from(2));
    }

    #[test]
    fn test_abi_string_layout() {
        let encoded = abi_string("Hello");
        assert_eq!(encoded.len(), 96);
        assert_eq!(encoded[31], 0x20);
        assert_eq!(encoded[63], 5);
        assert_eq!(&encoded[64..69], b"Hello");
    }

    #[test]
    #[should_panic(expected = "only single word strings")]
    fn test_abi_string_rejects_long_text() {
        abi_string(&"x".repeat(33));
    }

    #[test]
    fn test_greeter_rejects_unknown_calls() {
        let node = MockNode::new();
        let greeter = node.deploy_greeter();

        let err = node
            .send_transaction(&json!({"from": DEV_ACCOUNTS[0], "to": greeter, "data": "0xdeadbeef"}))
            .unwrap_err();
        assert_eq!(err.code(), 3);
    }
}
