//! # 批量处理模块
//!
//! 收集输出文件并并行解析。
//!
//! ## 依赖关系
//! - 被 `commands/extract.rs` 调用
//! - 子模块: collector, runner

pub mod collector;
pub mod runner;

pub use collector::FileCollector;
pub use runner::{BatchRunner, BatchSummary, ProcessResult};
