// src/path/mod.rs

pub mod builder;
pub mod types;


pub use builder::PathBuilder;
pub use types::{SwapOption, SwapPath, SwapPathHop, TradeDirection, MAX_PATH_HOPS};
