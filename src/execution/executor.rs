//! # Swap Execution
//!
//! Submits planned swaps through the universal router, running the two-step
//! approval handshake first when the input is an ERC-20: the token approves
//! the Permit2 contract once (unbounded), then Permit2 grants the router a
//! bounded, expiring delegation. Native input skips both steps.

use crate::chain::ChainClient;
use crate::config::{settings_for_chain, ChainSettings};
use crate::errors::{classify_simulation_error, ChainError, RouterError};
use crate::execution::builder::build_swap_calldata;
use crate::path::SwapPath;
use crate::types::is_native;
use dashmap::DashMap;
use ethers::abi::{Function, HumanReadableParser, Token};
use ethers::types::{Address, Bytes, TransactionRequest, H256, U256};
use std::sync::Arc;
use tracing::{debug, info, instrument};

const ERC20_ALLOWANCE: &str =
    "function allowance(address owner, address spender) external view returns (uint256)";
const ERC20_APPROVE: &str =
    "function approve(address spender, uint256 amount) external returns (bool)";
const PERMIT2_ALLOWANCE: &str = "function allowance(address user, address token, address spender) external view returns (uint160 amount, uint48 expiration, uint48 nonce)";
const PERMIT2_APPROVE: &str =
    "function approve(address token, address spender, uint160 amount, uint48 expiration) external";
const ROUTER_EXECUTE: &str =
    "function execute(bytes commands, bytes[] inputs, uint256 deadline) external payable";

/// Knobs for a single execution.
#[derive(Debug, Clone)]
pub struct ExecutionOptions {
    /// Dry-run the router call before submitting, surfacing classified
    /// revert reasons instead of burning gas.
    pub simulate: bool,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self { simulate: true }
    }
}

pub struct SwapExecutor {
    chain: Arc<dyn ChainClient>,
    /// Parsed-ABI cache keyed by human-readable signature.
    functions: DashMap<String, Arc<Function>>,
}

impl SwapExecutor {
    pub fn new(chain: Arc<dyn ChainClient>) -> Self {
        Self {
            chain,
            functions: DashMap::new(),
        }
    }

    /// Execute `path` for `user`, returning the swap transaction hash once
    /// it has been accepted by the node. Approval transactions, when needed,
    /// are submitted first and awaited to completion.
    #[instrument(skip(self, path), fields(user = %user, amount_in = %amount_in))]
    pub async fn execute_swap(
        &self,
        user: Address,
        path: &SwapPath,
        amount_in: U256,
        min_amount_out: U256,
        options: &ExecutionOptions,
    ) -> Result<H256, RouterError> {
        let chain_id = self.chain.chain_id();
        let settings = settings_for_chain(chain_id)
            .ok_or_else(|| RouterError::Validation(format!("unknown chain {chain_id}")))?;

        let token_in = path
            .token_in()
            .ok_or_else(|| RouterError::Validation("cannot execute an empty path".to_string()))?;
        let calldata = build_swap_calldata(path, amount_in, min_amount_out, settings.weth_address)?;

        if !is_native(token_in) {
            self.ensure_approvals(settings, user, token_in, amount_in)
                .await?;
        }

        let now = self
            .chain
            .latest_block_timestamp()
            .await
            .map_err(chain_err)?;
        let deadline = now + U256::from(settings.execution_deadline_secs);

        let execute = self.function(ROUTER_EXECUTE)?;
        let data = execute
            .encode_input(&[
                Token::Bytes(calldata.commands.to_vec()),
                Token::Array(
                    calldata
                        .inputs
                        .iter()
                        .map(|input| Token::Bytes(input.to_vec()))
                        .collect(),
                ),
                Token::Uint(deadline),
            ])
            .map_err(|e| RouterError::Validation(format!("router input encoding failed: {e}")))?;

        let tx = TransactionRequest::new()
            .from(user)
            .to(settings.universal_router_address)
            .data(Bytes::from(data))
            .value(calldata.value);

        if options.simulate {
            self.chain
                .simulate_transaction(&tx)
                .await
                .map_err(classify_simulation_error)?;
        }

        let hash = self
            .chain
            .submit_transaction(tx)
            .await
            .map_err(chain_err)?;
        info!(%hash, %deadline, "swap submitted");
        Ok(hash)
    }

    /// Bring the Permit2 delegation chain up to date for `token`:
    /// token -> Permit2 allowance first, then the Permit2 -> router grant.
    /// Grants expiring within the configured buffer are refreshed early.
    async fn ensure_approvals(
        &self,
        settings: &ChainSettings,
        user: Address,
        token: Address,
        amount_in: U256,
    ) -> Result<(), RouterError> {
        let permit2 = settings.permit2_address;
        let router = settings.universal_router_address;

        let allowance_fn = self.function(ERC20_ALLOWANCE)?;
        let reply = self
            .chain
            .call(
                token,
                encode_call(&allowance_fn, &[Token::Address(user), Token::Address(permit2)])?,
            )
            .await
            .map_err(chain_err)?;
        let erc20_allowance = decode_uint(&allowance_fn, &reply, 0)?;

        if erc20_allowance < amount_in {
            debug!(%token, "granting unbounded token allowance to permit2");
            let approve_fn = self.function(ERC20_APPROVE)?;
            let data = encode_call(&approve_fn, &[Token::Address(permit2), Token::Uint(U256::MAX)])?;
            self.submit_and_confirm(TransactionRequest::new().from(user).to(token).data(data))
                .await?;
        }

        let permit_allowance_fn = self.function(PERMIT2_ALLOWANCE)?;
        let reply = self
            .chain
            .call(
                permit2,
                encode_call(
                    &permit_allowance_fn,
                    &[
                        Token::Address(user),
                        Token::Address(token),
                        Token::Address(router),
                    ],
                )?,
            )
            .await
            .map_err(chain_err)?;
        let granted = decode_uint(&permit_allowance_fn, &reply, 0)?;
        let expiration = decode_uint(&permit_allowance_fn, &reply, 1)?;

        let now = self
            .chain
            .latest_block_timestamp()
            .await
            .map_err(chain_err)?;
        let stale = expiration < now + U256::from(settings.approval_expiry_buffer_secs);
        if granted < amount_in || stale {
            debug!(%token, %granted, %expiration, "refreshing permit2 delegation to the router");
            let max_uint160 = (U256::one() << 160) - U256::one();
            let new_expiration = now + U256::from(settings.approval_duration_secs);
            let approve_fn = self.function(PERMIT2_APPROVE)?;
            let data = encode_call(
                &approve_fn,
                &[
                    Token::Address(token),
                    Token::Address(router),
                    Token::Uint(max_uint160),
                    Token::Uint(new_expiration),
                ],
            )?;
            self.submit_and_confirm(TransactionRequest::new().from(user).to(permit2).data(data))
                .await?;
        }

        Ok(())
    }

    async fn submit_and_confirm(&self, tx: TransactionRequest) -> Result<(), RouterError> {
        let hash = self
            .chain
            .submit_transaction(tx)
            .await
            .map_err(chain_err)?;
        let receipt = self.chain.wait_for_receipt(hash).await.map_err(chain_err)?;
        if receipt.status != Some(1u64.into()) {
            return Err(RouterError::Network(format!(
                "approval transaction {hash:#x} reverted"
            )));
        }
        Ok(())
    }

    fn function(&self, signature: &str) -> Result<Arc<Function>, RouterError> {
        if let Some(cached) = self.functions.get(signature) {
            return Ok(cached.clone());
        }
        let parsed = HumanReadableParser::parse_function(signature).map_err(|e| {
            RouterError::Validation(format!("invalid ABI signature {signature:?}: {e}"))
        })?;
        let parsed = Arc::new(parsed);
        self.functions
            .insert(signature.to_string(), parsed.clone());
        Ok(parsed)
    }
}

fn encode_call(function: &Function, args: &[Token]) -> Result<Bytes, RouterError> {
    function
        .encode_input(args)
        .map(Bytes::from)
        .map_err(|e| RouterError::Validation(format!("call encoding failed: {e}")))
}

fn decode_uint(function: &Function, reply: &Bytes, index: usize) -> Result<U256, RouterError> {
    let tokens = function
        .decode_output(reply)
        .map_err(|e| RouterError::Validation(format!("undecodable call reply: {e}")))?;
    match tokens.get(index) {
        Some(Token::Uint(value)) => Ok(*value),
        _ => Err(RouterError::Validation(format!(
            "call reply missing uint at position {index}"
        ))),
    }
}

fn chain_err(err: ChainError) -> RouterError {
    RouterError::Network(err.to_string())
}

impl std::fmt::Debug for SwapExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SwapExecutor").finish()
    }
}
