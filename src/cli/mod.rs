//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `extract`: 批量提取输出文件结果
//! - `hessian`: 从检查点重建 Hessian
//! - `irc`: 导出 IRC 路径轨迹
//! - `collect`: 收集作业状态入结果数据库
//! - `submit`: 生成并提交作业
//! - `run`: 本地执行作业（带收敛重试）
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: extract, hessian, irc, collect, submit, run

pub mod collect;
pub mod extract;
pub mod hessian;
pub mod irc;
pub mod run;
pub mod submit;

use clap::{Parser, Subcommand};

/// qcflow - 量子化学工作流统一工具箱
#[derive(Parser)]
#[command(name = "qcflow")]
#[command(author = "Changjiang Wu")]
#[command(version)]
#[command(about = "A unified quantum chemistry workflow toolkit", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令
#[derive(Subcommand)]
pub enum Commands {
    /// Extract energies, frequencies and convergence from QC output files
    Extract(extract::ExtractArgs),

    /// Rebuild the Cartesian Hessian from a formatted checkpoint file
    Hessian(hessian::HessianArgs),

    /// Export IRC path geometries from a QChem IRC log
    Irc(irc::IrcArgs),

    /// Collect finished jobs into the results database
    Collect(collect::CollectArgs),

    /// Generate job inputs and sbatch scripts, optionally submit
    Submit(submit::SubmitArgs),

    /// Run a job locally with convergence retries
    Run(run::RunArgs),
}
