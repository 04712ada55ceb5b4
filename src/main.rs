//! # qcflow - 量子化学工作流统一工具箱
//!
//! 将分散的量子化学输出解析与作业脚本用 Rust 重构，统一成
//! 单一可执行文件。
//!
//! ## 子命令
//! - `extract` - 批量提取输出结果 (能量、频率、收敛状态)
//! - `hessian` - 从检查点重建笛卡尔 Hessian
//! - `irc`     - 导出 IRC 路径轨迹
//! - `collect` - 收集作业状态入结果数据库
//! - `submit`  - 模板生成作业并提交到 Slurm
//! - `run`     - 本地执行作业（带收敛重试）
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/        (命令行参数定义)
//!   ├── commands/   (命令执行逻辑)
//!   │     ├── parsers/   (输出解析器)
//!   │     ├── analysis/  (约束与简正模式)
//!   │     ├── jobs/      (模板与重试)
//!   │     └── db/        (结果数据库)
//!   ├── batch/      (批量收集与并行解析)
//!   ├── models/     (数据模型)
//!   ├── utils/      (工具函数)
//!   └── error.rs    (错误处理)
//! ```

mod analysis;
mod batch;
mod cli;
mod commands;
mod db;
mod error;
mod jobs;
mod models;
mod parsers;
mod utils;

use clap::Parser;
use cli::Cli;

fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();

    if let Err(e) = commands::run(cli.command) {
        utils::output::print_error(&format!("{}", e));
        std::process::exit(1);
    }
}
