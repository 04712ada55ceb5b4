//! # run 子命令 CLI 定义
//!
//! 本地执行作业，带收敛重试
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/run.rs`

use crate::jobs::JobTask;
use crate::models::QcProgram;
use clap::Args;
use std::path::PathBuf;

/// run 子命令参数
#[derive(Args, Debug)]
pub struct RunArgs {
    /// XYZ geometry file
    pub xyz: PathBuf,

    /// Job label; defaults to the XYZ file stem
    #[arg(long)]
    pub label: Option<String>,

    /// Quantum chemistry program
    #[arg(long, value_enum, default_value = "qchem")]
    pub program: QcProgram,

    /// Job type
    #[arg(long, value_enum, default_value = "opt")]
    pub task: JobTask,

    /// Method (functional or wavefunction model)
    #[arg(long, default_value = "B3LYP")]
    pub method: String,

    /// Basis set
    #[arg(long, default_value = "6-31G*")]
    pub basis: String,

    /// Total charge
    #[arg(long, default_value_t = 0)]
    pub charge: i32,

    /// Spin multiplicity
    #[arg(long, default_value_t = 1)]
    pub mult: u32,

    /// Number of parallel cores
    #[arg(long, default_value_t = 8)]
    pub nprocs: u32,

    /// Memory limit (e.g. '4GB')
    #[arg(long, default_value = "4GB")]
    pub mem: String,

    /// QC program executable (defaults to 'qchem' / 'g16')
    #[arg(long)]
    pub command: Option<String>,

    /// Fixed dummy-atom position 'x,y,z' re-imposed on restart geometries,
    /// first value applies to the last atom (repeatable)
    #[arg(long, value_name = "X,Y,Z")]
    pub dummy: Vec<String>,

    /// Working directory for inputs and outputs
    #[arg(long, default_value = ".")]
    pub workdir: PathBuf,

    /// Maximum optimization attempts
    #[arg(long, default_value_t = 3)]
    pub max_attempts: u32,

    /// Reject forces-only convergence
    #[arg(long, default_value_t = false)]
    pub strict: bool,

    /// Results database file
    #[arg(long, default_value = "qcflow_results.csv")]
    pub db: PathBuf,
}
