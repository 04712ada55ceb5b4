//! # 计算结果数据模型
//!
//! 存储从 QChem/Gaussian 输出提取的结果信息。
//!
//! ## 依赖关系
//! - 被 `parsers/`, `commands/extract.rs`, `commands/collect.rs` 使用
//! - 被 `db/` 作为记录来源

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// 量子化学程序类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
pub enum QcProgram {
    Qchem,
    Gaussian,
}

impl std::fmt::Display for QcProgram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QcProgram::Qchem => write!(f, "QChem"),
            QcProgram::Gaussian => write!(f, "Gaussian"),
        }
    }
}

/// 几何优化收敛状态
///
/// 优化输出的收敛表有四项判据（最大力、均方根力、最大位移、
/// 均方根位移）。全部满足为 Full；仅力收敛而位移未收敛时记为
/// ForcesOnly，平坦势能面上通常可接受。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Convergence {
    /// 力与位移均收敛
    Full,
    /// 仅力收敛
    ForcesOnly,
    /// 未收敛
    NotConverged,
}

impl Convergence {
    /// 是否可作为优化终点接受
    pub fn is_acceptable(&self, accept_forces_only: bool) -> bool {
        match self {
            Convergence::Full => true,
            Convergence::ForcesOnly => accept_forces_only,
            Convergence::NotConverged => false,
        }
    }
}

impl std::fmt::Display for Convergence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Convergence::Full => write!(f, "converged"),
            Convergence::ForcesOnly => write!(f, "forces-only"),
            Convergence::NotConverged => write!(f, "not-converged"),
        }
    }
}

/// 作业最终状态（结果数据库记录用）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Normal,
    Error,
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Normal => write!(f, "normal"),
            JobStatus::Error => write!(f, "error"),
        }
    }
}

/// 单个作业的解析结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QcResult {
    /// 作业名称
    pub job_name: String,

    /// 使用的量子化学程序
    pub program: QcProgram,

    /// 计算是否正常结束
    pub is_finished: bool,

    /// 收敛状态
    pub convergence: Convergence,

    /// 最终能量 (Hartree)
    pub energy: Option<f64>,

    /// 零点振动能
    pub zpe: Option<f64>,

    /// 振动频率 (cm⁻¹)，虚频为负值
    pub frequencies: Vec<f64>,

    /// 原子数
    pub num_atoms: Option<usize>,

    /// 输出文件路径
    pub source_file: Option<String>,
}

impl QcResult {
    pub fn new(job_name: impl Into<String>, program: QcProgram) -> Self {
        QcResult {
            job_name: job_name.into(),
            program,
            is_finished: false,
            convergence: Convergence::NotConverged,
            energy: None,
            zpe: None,
            frequencies: Vec::new(),
            num_atoms: None,
            source_file: None,
        }
    }

    /// 虚频数量（鞍点应恰为 1，极小点为 0）
    pub fn num_imaginary(&self) -> usize {
        self.frequencies.iter().filter(|f| **f < 0.0).count()
    }

    /// 零点校正能量
    pub fn energy_with_zpe(&self) -> Option<f64> {
        match (self.energy, self.zpe) {
            (Some(e), Some(z)) => Some(e + z),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convergence_acceptable() {
        assert!(Convergence::Full.is_acceptable(false));
        assert!(!Convergence::ForcesOnly.is_acceptable(false));
        assert!(Convergence::ForcesOnly.is_acceptable(true));
        assert!(!Convergence::NotConverged.is_acceptable(true));
    }

    #[test]
    fn test_num_imaginary() {
        let mut result = QcResult::new("ts1", QcProgram::Gaussian);
        result.frequencies = vec![-512.3, 88.1, 1650.0];
        assert_eq!(result.num_imaginary(), 1);
    }

    #[test]
    fn test_energy_with_zpe() {
        let mut result = QcResult::new("well0", QcProgram::Qchem);
        assert_eq!(result.energy_with_zpe(), None);
        result.energy = Some(-76.4);
        result.zpe = Some(0.021);
        assert!((result.energy_with_zpe().unwrap() - (-76.379)).abs() < 1e-12);
    }
}
