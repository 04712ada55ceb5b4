//! # submit 子命令 CLI 定义
//!
//! 模板生成作业输入与 sbatch 脚本，批量提交
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/submit.rs`

use crate::jobs::JobTask;
use crate::models::QcProgram;
use clap::Args;
use std::path::PathBuf;

/// submit 子命令参数
#[derive(Args, Debug)]
pub struct SubmitArgs {
    /// XYZ geometry file(s), one job per file
    #[arg(required = true)]
    pub xyz: Vec<PathBuf>,

    /// Quantum chemistry program
    #[arg(long, value_enum, default_value = "qchem")]
    pub program: QcProgram,

    /// Job type
    #[arg(long, value_enum, default_value = "opt")]
    pub task: JobTask,

    // ─────────────────────────────────────────────────────────────
    // Electronic structure options
    // ─────────────────────────────────────────────────────────────
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

    /// Number of parallel cores per job
    #[arg(long, default_value_t = 8)]
    pub nprocs: u32,

    /// Memory limit (e.g. '4GB')
    #[arg(long, default_value = "4GB")]
    pub mem: String,

    // ─────────────────────────────────────────────────────────────
    // Constraint options
    // ─────────────────────────────────────────────────────────────
    /// Freeze an internal coordinate at its current value
    /// (1-based atoms: '1,2' bond, '1,2,3' angle, '1,2,3,4' dihedral)
    #[arg(long = "fix", value_name = "ATOMS")]
    pub fix: Vec<String>,

    /// Drive an internal coordinate to a target value
    /// (e.g. '1,2=1.54' or '1,2,3,4=60.0'; lengths in Å, angles in degrees)
    #[arg(long = "change", value_name = "SPEC")]
    pub change: Vec<String>,

    // ─────────────────────────────────────────────────────────────
    // Slurm options
    // ─────────────────────────────────────────────────────────────
    /// Root directory for job folders
    #[arg(long, default_value = "jobs")]
    pub jobs_root: PathBuf,

    /// Slurm partition
    #[arg(long, default_value = "normal")]
    pub partition: String,

    /// Time limit (e.g. '48:00:00')
    #[arg(long, default_value = "48:00:00")]
    pub time: String,

    /// Module list (comma-separated)
    #[arg(long, default_value = "")]
    pub modules: String,

    /// Scratch root for the QC program
    #[arg(long, default_value = "/scratch")]
    pub scratch: String,

    // ─────────────────────────────────────────────────────────────
    // Execution control
    // ─────────────────────────────────────────────────────────────
    /// Only generate job files, do not submit
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    /// Submit jobs with sbatch after generation
    #[arg(long, default_value_t = false)]
    pub submit: bool,
}
