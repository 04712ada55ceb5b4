//! # 命令执行模块
//!
//! 实现各子命令的业务逻辑。
//!
//! ## 依赖关系
//! - 被 `main.rs` 调用
//! - 使用 `cli/`, `parsers/`, `models/`, `jobs/`, `db/`, `utils/`
//! - 子模块: extract, hessian, irc, collect, submit, run

pub mod collect;
pub mod extract;
pub mod hessian;
pub mod irc;
pub mod run;
pub mod submit;

use crate::cli::Commands;
use crate::error::Result;

/// 执行命令
pub fn run(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Extract(args) => extract::execute(args),
        Commands::Hessian(args) => hessian::execute(args),
        Commands::Irc(args) => irc::execute(args),
        Commands::Collect(args) => collect::execute(args),
        Commands::Submit(args) => submit::execute(args),
        Commands::Run(args) => run::execute(args),
    }
}
