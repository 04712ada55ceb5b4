//! # hessian 子命令 CLI 定义
//!
//! 从格式化检查点重建笛卡尔 Hessian
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/hessian.rs`

use clap::Args;
use std::path::PathBuf;

/// hessian 子命令参数
#[derive(Args, Debug)]
pub struct HessianArgs {
    /// Job base path; `<job>.fchk` is read, `<job>.chk` is converted first if needed
    pub job: PathBuf,

    /// Number of real atoms; read from the checkpoint when omitted
    #[arg(long)]
    pub atoms: Option<usize>,

    /// Write the dense matrix to this file
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Diagonalize the mass-weighted Hessian and print wavenumbers
    #[arg(long, default_value_t = false)]
    pub freq: bool,

    /// Print the lowest-mode displacements from `<job>.log` (saddle points)
    #[arg(long, default_value_t = false)]
    pub imag_mode: bool,

    /// Checkpoint conversion command
    #[arg(long, default_value = "formchk")]
    pub formchk_cmd: String,
}
