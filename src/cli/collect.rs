//! # collect 子命令 CLI 定义
//!
//! 收集完成作业的状态与能量入结果数据库
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/collect.rs`

use crate::models::QcProgram;
use clap::Args;
use std::path::PathBuf;

/// collect 子命令参数
#[derive(Args, Debug)]
pub struct CollectArgs {
    /// Root directory containing per-job folders
    pub jobs_dir: PathBuf,

    /// Generating program; auto-detected from file content when omitted
    #[arg(long, value_enum)]
    pub program: Option<QcProgram>,

    /// Results database file
    #[arg(long, default_value = "qcflow_results.csv")]
    pub db: PathBuf,

    /// Do not append the trailing 'done' marker to collected logs
    #[arg(long, default_value_t = false)]
    pub no_done: bool,
}
