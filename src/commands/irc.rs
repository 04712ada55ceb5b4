//! # irc 命令实现
//!
//! 解析 QChem IRC 输出的全部几何结构并导出多帧 XYZ 轨迹。
//!
//! ## 依赖关系
//! - 使用 `cli/irc.rs` 定义的参数
//! - 使用 `parsers/qchem.rs`
//! - 使用 `utils/output.rs`

use crate::cli::irc::IrcArgs;
use crate::error::{QcflowError, Result};
use crate::parsers::qchem;
use crate::utils::output;

use std::fs;
use std::io::Write;

/// 执行 irc 命令
pub fn execute(args: IrcArgs) -> Result<()> {
    output::print_header("IRC Path Export");

    if !args.logfile.exists() {
        return Err(QcflowError::FileNotFound {
            path: args.logfile.display().to_string(),
        });
    }

    let content = fs::read_to_string(&args.logfile).map_err(|e| QcflowError::FileReadError {
        path: args.logfile.display().to_string(),
        source: e,
    })?;

    let path = qchem::parse_irc_path(&content).map_err(|e| match e {
        QcflowError::ParseError { format, reason, .. } => QcflowError::ParseError {
            format,
            path: args.logfile.display().to_string(),
            reason,
        },
        other => other,
    })?;

    output::print_kv("Frames", &path.frames.len().to_string());
    output::print_kv("Atoms", &path.atomic_numbers.len().to_string());
    output::print_kv("Charge", &path.charge.to_string());
    output::print_kv("Multiplicity", &path.multiplicity.to_string());

    let mut file = fs::File::create(&args.output).map_err(|e| QcflowError::FileWriteError {
        path: args.output.display().to_string(),
        source: e,
    })?;

    for (i, mol) in path.to_molecules().iter().enumerate() {
        let frame = mol.to_xyz_string(&format!("IRC point {}", i + 1));
        file.write_all(frame.as_bytes())
            .map_err(|e| QcflowError::FileWriteError {
                path: args.output.display().to_string(),
                source: e,
            })?;
    }

    output::print_done(&format!(
        "Wrote {} frames to '{}'",
        path.frames.len(),
        args.output.display()
    ));

    Ok(())
}
