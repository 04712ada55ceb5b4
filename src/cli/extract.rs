//! # extract 子命令 CLI 定义
//!
//! 批量提取 QChem/Gaussian 输出结果
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/extract.rs`

use crate::models::QcProgram;
use clap::Args;
use std::path::PathBuf;

/// extract 子命令参数
#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// Directory containing job outputs (or a single output file)
    pub job_dir: PathBuf,

    /// Generating program; auto-detected from file content when omitted
    #[arg(long, value_enum)]
    pub program: Option<QcProgram>,

    /// Comma-separated glob patterns for output files
    #[arg(long, default_value = "*.out,*.log")]
    pub pattern: String,

    /// Recurse into subdirectories
    #[arg(long, default_value_t = false)]
    pub recursive: bool,

    /// Number of parallel parser jobs (0 = all cores)
    #[arg(long, default_value_t = 0)]
    pub jobs: usize,

    /// Number of top entries to show in the table
    #[arg(long, default_value_t = 10)]
    pub top_n: usize,

    /// Filename for the full CSV ranking
    #[arg(long, default_value = "qc_results.csv")]
    pub output_csv: PathBuf,

    /// Draw an energy ranking plot
    #[arg(long, default_value_t = false)]
    pub plot: bool,

    /// Filename for the ranking plot
    #[arg(long, default_value = "qc_energies.png")]
    pub output_plot: PathBuf,
}
