//! # irc 子命令 CLI 定义
//!
//! 导出 IRC 路径几何结构
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/irc.rs`

use clap::Args;
use std::path::PathBuf;

/// irc 子命令参数
#[derive(Args, Debug)]
pub struct IrcArgs {
    /// QChem IRC log file
    pub logfile: PathBuf,

    /// Filename for the multi-frame XYZ trajectory
    #[arg(long, default_value = "irc_path.xyz")]
    pub output: PathBuf,
}
