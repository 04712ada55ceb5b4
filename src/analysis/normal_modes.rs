//! # 简正模式分析
//!
//! 对质量加权 Hessian 对角化求振动波数。负特征值按惯例记为
//! 负波数（虚频）。
//!
//! ## 依赖关系
//! - 被 `commands/hessian.rs` 使用
//! - 使用 `models/molecule.rs` 的原子质量
//! - 使用 `nalgebra` 的对称特征分解

use crate::error::{QcflowError, Result};
use nalgebra::DMatrix;

/// 波数换算常数 (cm⁻¹ · sqrt(amu·Bohr²/Hartree))
///
/// Hessian 单位 Hartree/Bohr²，质量单位 amu 时，
/// ν̃ = C · sqrt(λ)。
const WAVENUMBER_FACTOR: f64 = 5140.4871;

/// 由 Hessian 与原子质量计算振动波数 (cm⁻¹)
///
/// `masses` 每原子一个值；Hessian 维度必须为 3 * 原子数。
/// 返回升序排列的波数，负值表示虚频。
pub fn wavenumbers(hessian: &DMatrix<f64>, masses: &[f64]) -> Result<Vec<f64>> {
    let n = 3 * masses.len();
    if hessian.nrows() != n || hessian.ncols() != n {
        return Err(QcflowError::InvalidArgument(format!(
            "Hessian dimension {}x{} does not match {} atoms",
            hessian.nrows(),
            hessian.ncols(),
            masses.len()
        )));
    }
    if masses.iter().any(|m| *m <= 0.0) {
        return Err(QcflowError::InvalidArgument(
            "atomic masses must be positive".to_string(),
        ));
    }

    // 质量加权: H'_ij = H_ij / sqrt(m_i m_j)
    let mut weighted = hessian.clone();
    for i in 0..n {
        for j in 0..n {
            weighted[(i, j)] /= (masses[i / 3] * masses[j / 3]).sqrt();
        }
    }

    let eigen = weighted.symmetric_eigen();
    let mut nu: Vec<f64> = eigen
        .eigenvalues
        .iter()
        .map(|lambda| lambda.signum() * WAVENUMBER_FACTOR * lambda.abs().sqrt())
        .collect();
    nu.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    Ok(nu)
}

/// 由元素符号列表求质量数组
///
/// 未知元素是错误，缺质量的模式分析没有意义。
pub fn masses_for_elements(elements: &[&str]) -> Result<Vec<f64>> {
    elements
        .iter()
        .map(|el| {
            crate::models::molecule::atomic_mass(el)
                .ok_or_else(|| QcflowError::InvalidArgument(format!("unknown element '{}'", el)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_hessian_unit_mass() {
        let hessian = DMatrix::identity(3, 3);
        let nu = wavenumbers(&hessian, &[1.0]).unwrap();
        assert_eq!(nu.len(), 3);
        for v in nu {
            assert!((v - WAVENUMBER_FACTOR).abs() < 1e-6);
        }
    }

    #[test]
    fn test_negative_eigenvalue_reported_negative() {
        let mut hessian = DMatrix::identity(3, 3);
        hessian[(0, 0)] = -1.0;
        let nu = wavenumbers(&hessian, &[1.0]).unwrap();
        assert!((nu[0] + WAVENUMBER_FACTOR).abs() < 1e-6);
        assert!(nu[1] > 0.0);
    }

    #[test]
    fn test_mass_scaling() {
        // 质量放大 4 倍，波数减半
        let hessian = DMatrix::identity(3, 3);
        let nu = wavenumbers(&hessian, &[4.0]).unwrap();
        for v in nu {
            assert!((v - WAVENUMBER_FACTOR / 2.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_zero_hessian_gives_zero_modes() {
        let hessian = DMatrix::zeros(6, 6);
        let nu = wavenumbers(&hessian, &[12.0107, 15.9994]).unwrap();
        assert!(nu.iter().all(|v| v.abs() < 1e-9));
    }

    #[test]
    fn test_dimension_mismatch() {
        let hessian = DMatrix::identity(3, 3);
        assert!(wavenumbers(&hessian, &[1.0, 1.0]).is_err());
    }

    #[test]
    fn test_masses_for_elements() {
        let masses = masses_for_elements(&["O", "H", "H"]).unwrap();
        assert_eq!(masses.len(), 3);
        assert!((masses[0] - 15.9994).abs() < 1e-6);
        assert!(masses_for_elements(&["Xx"]).is_err());
    }
}
