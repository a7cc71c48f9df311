//! # Line Allocation Engine
//!
//! 配產請求建立、貪婪拆分配產與結果組裝

pub mod assembler;
pub mod greedy;
pub mod pattern;
pub mod request_builder;

// Re-export 主要類型
pub use assembler::{AssembledRow, ResultAssembler};
pub use greedy::{
    AllocationAttempt, AllocationLedger, GreedyAllocator, GreedyOutcome, RequestFailure,
};
pub use pattern::GroupPattern;
pub use request_builder::{RequestBuildOutput, RequestBuilder};
