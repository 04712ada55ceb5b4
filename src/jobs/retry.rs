//! # 收敛重试策略
//!
//! 几何优化常在平坦势能面上耗尽循环数而不收敛。重试策略从
//! 上一次的最终几何重新发起优化，最多尝试给定次数。单次尝试
//! 的执行（写输入、调程序、续几何）由 `AttemptRunner` 实现方
//! 负责，本模块只做决策循环。
//!
//! ## 依赖关系
//! - 被 `commands/run.rs` 使用
//! - 使用 `models/result.rs` 的收敛状态

use crate::error::Result;
use crate::models::QcResult;

/// 重试参数
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// 最多尝试次数（含首次）
    pub max_attempts: u32,
    /// 是否接受仅力收敛的结果
    pub accept_forces_only: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 3,
            accept_forces_only: true,
        }
    }
}

/// 单次尝试的执行接口
///
/// `attempt` 从 1 开始编号。实现方在前次失败后应从最后解析到
/// 的几何继续。
pub trait AttemptRunner {
    fn attempt(&mut self, attempt: u32) -> Result<QcResult>;
}

/// 重试循环结果
#[derive(Debug)]
pub enum RetryOutcome {
    /// 在第 attempts 次尝试达到可接受的收敛
    Converged { attempts: u32, result: QcResult },
    /// 用尽尝试次数，保留最后一次可解析的结果
    GaveUp {
        attempts: u32,
        last: Option<QcResult>,
        last_error: Option<String>,
    },
}

impl RetryOutcome {
    pub fn attempts(&self) -> u32 {
        match self {
            RetryOutcome::Converged { attempts, .. } => *attempts,
            RetryOutcome::GaveUp { attempts, .. } => *attempts,
        }
    }
}

/// 执行重试循环
///
/// 尝试抛错不会中断循环：程序崩溃后换个起点重来是常规操作，
/// 错误信息保留在 GaveUp 中。
pub fn run_with_retry<R: AttemptRunner>(runner: &mut R, policy: &RetryPolicy) -> RetryOutcome {
    let mut last: Option<QcResult> = None;
    let mut last_error: Option<String> = None;

    for attempt in 1..=policy.max_attempts.max(1) {
        match runner.attempt(attempt) {
            Ok(result) => {
                if result.convergence.is_acceptable(policy.accept_forces_only) {
                    return RetryOutcome::Converged { attempts: attempt, result };
                }
                last = Some(result);
            }
            Err(e) => {
                last_error = Some(e.to_string());
            }
        }
    }

    RetryOutcome::GaveUp {
        attempts: policy.max_attempts.max(1),
        last,
        last_error,
    }
}
