//! # 作业生成模块
//!
//! 模板驱动的输入文件与提交脚本生成，以及多次尝试的收敛
//! 重试策略。
//!
//! ## 依赖关系
//! - 被 `commands/submit.rs`, `commands/run.rs` 使用
//! - 子模块: template, slurm, retry

pub mod retry;
pub mod slurm;
pub mod template;

pub use retry::{AttemptRunner, RetryOutcome, RetryPolicy};
pub use template::{JobSpec, JobTask};
