// src/execution/mod.rs

pub mod builder;
pub mod executor;

pub use builder::{
    build_swap_calldata, plan_swap, PathKey, SwapCalldata, SwapPlan, ACTION_SETTLE_ALL,
    ACTION_SWAP_EXACT_IN, ACTION_SWAP_EXACT_IN_SINGLE, ACTION_TAKE_ALL, COMMAND_V4_SWAP,
};
pub use executor::{ExecutionOptions, SwapExecutor};
