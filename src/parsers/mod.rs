//! # 解析器模块
//!
//! 提供 QChem/Gaussian 输出文件和格式化检查点的解析器。
//!
//! ## 依赖关系
//! - 被 `commands/` 模块使用
//! - 使用 `models/` 数据模型
//! - 子模块: qchem, gaussian, fchk

pub mod fchk;
pub mod gaussian;
pub mod qchem;

use crate::error::{QcflowError, Result};
use crate::models::{QcProgram, QcResult};
use std::fs;
use std::path::Path;

/// 从输出内容推断生成程序
///
/// 两个程序的抬头都在文件前部，只检查前 200 行。
pub fn detect_program(content: &str) -> Option<QcProgram> {
    for line in content.lines().take(200) {
        if line.contains("Welcome to Q-Chem") || line.contains("Q-Chem, Inc.") {
            return Some(QcProgram::Qchem);
        }
        if line.contains("Gaussian, Inc.") || line.contains("Entering Gaussian System") {
            return Some(QcProgram::Gaussian);
        }
    }
    None
}

/// 解析输出文件，程序类型未指定时自动探测
pub fn parse_output_file(
    path: &Path,
    job_name: &str,
    program: Option<QcProgram>,
) -> Result<QcResult> {
    let program = match program {
        Some(p) => p,
        None => {
            let content = fs::read_to_string(path).map_err(|e| QcflowError::FileReadError {
                path: path.display().to_string(),
                source: e,
            })?;
            detect_program(&content).ok_or_else(|| {
                QcflowError::UnsupportedFormat(format!(
                    "cannot determine generating program for: {}",
                    path.display()
                ))
            })?
        }
    };

    match program {
        QcProgram::Qchem => qchem::parse_output(path, job_name),
        QcProgram::Gaussian => gaussian::parse_output(path, job_name),
    }
}
