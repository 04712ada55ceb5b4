//! # 几何约束转换
//!
//! 将输入中的固定/扫描约束转换为优化器使用的键长、键角、
//! 二面角约束列表。输入侧原子索引从 1 开始，输出侧从 0 开始，
//! 角度输入为度，输出为弧度。
//!
//! ## 依赖关系
//! - 被 `commands/submit.rs` 使用
//! - 使用 `models/molecule.rs`

use crate::error::{QcflowError, Result};
use crate::models::Molecule;

/// 键长约束，长度单位 Å
#[derive(Debug, Clone, PartialEq)]
pub struct BondConstraint {
    pub length: f64,
    pub atoms: [usize; 2],
}

/// 键角约束，弧度
#[derive(Debug, Clone, PartialEq)]
pub struct AngleConstraint {
    pub angle: f64,
    pub atoms: [usize; 3],
}

/// 二面角约束，弧度
#[derive(Debug, Clone, PartialEq)]
pub struct DihedralConstraint {
    pub angle: f64,
    pub atoms: [usize; 4],
}

/// 优化器约束集合
#[derive(Debug, Clone, Default)]
pub struct ConstraintSet {
    pub bonds: Vec<BondConstraint>,
    pub angles: Vec<AngleConstraint>,
    pub dihedrals: Vec<DihedralConstraint>,
}

/// 目标值变更约束（扫描/驱动坐标），索引从 1 开始
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    /// 键长驱动到目标值 (Å)
    Bond(usize, usize, f64),
    /// 键角驱动到目标值 (度)
    Angle(usize, usize, usize, f64),
    /// 二面角驱动到目标值 (度)
    Dihedral(usize, usize, usize, usize, f64),
}

/// 将固定坐标列表与驱动坐标列表转换为优化器约束
///
/// `fix` 中每项为 2/3/4 个从 1 开始的原子索引，约束值取当前
/// 几何的测量值；`change` 中的目标值按给定值使用。
pub fn convert_constraints(
    mol: &Molecule,
    fix: &[Vec<usize>],
    change: &[Change],
) -> Result<ConstraintSet> {
    let mut set = ConstraintSet::default();

    for fi in fix {
        let idx = to_zero_based(mol, fi)?;
        match idx.len() {
            2 => set.bonds.push(BondConstraint {
                length: mol.distance(idx[0], idx[1]),
                atoms: [idx[0], idx[1]],
            }),
            3 => set.angles.push(AngleConstraint {
                angle: mol.angle(idx[0], idx[1], idx[2]),
                atoms: [idx[0], idx[1], idx[2]],
            }),
            4 => set.dihedrals.push(DihedralConstraint {
                angle: mol.dihedral(idx[0], idx[1], idx[2], idx[3]),
                atoms: [idx[0], idx[1], idx[2], idx[3]],
            }),
            n => {
                return Err(QcflowError::InvalidArgument(format!(
                    "fix entry must list 2, 3 or 4 atoms, got {}",
                    n
                )))
            }
        }
    }

    for ci in change {
        match *ci {
            Change::Bond(i, j, length) => {
                let idx = to_zero_based(mol, &[i, j])?;
                set.bonds.push(BondConstraint {
                    length,
                    atoms: [idx[0], idx[1]],
                });
            }
            Change::Angle(i, j, k, degrees) => {
                let idx = to_zero_based(mol, &[i, j, k])?;
                set.angles.push(AngleConstraint {
                    angle: degrees.to_radians(),
                    atoms: [idx[0], idx[1], idx[2]],
                });
            }
            Change::Dihedral(i, j, k, l, degrees) => {
                let idx = to_zero_based(mol, &[i, j, k, l])?;
                set.dihedrals.push(DihedralConstraint {
                    angle: degrees.to_radians(),
                    atoms: [idx[0], idx[1], idx[2], idx[3]],
                });
            }
        }
    }

    Ok(set)
}

/// 1 基索引转 0 基并做范围检查
fn to_zero_based(mol: &Molecule, indices: &[usize]) -> Result<Vec<usize>> {
    indices
        .iter()
        .map(|&i| {
            if i == 0 || i > mol.atoms.len() {
                Err(QcflowError::InvalidArgument(format!(
                    "atom index {} out of range (1..={})",
                    i,
                    mol.atoms.len()
                )))
            } else {
                Ok(i - 1)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Atom;

    fn square() -> Molecule {
        // 单位正方形，便于人工核对距离和角度
        Molecule::new(vec![
            Atom::new("C", [0.0, 0.0, 0.0]),
            Atom::new("C", [1.0, 0.0, 0.0]),
            Atom::new("C", [1.0, 1.0, 0.0]),
            Atom::new("C", [0.0, 1.0, 0.0]),
        ])
    }

    #[test]
    fn test_fix_bond_measures_current_length() {
        let mol = square();
        let set = convert_constraints(&mol, &[vec![1, 3]], &[]).unwrap();
        assert_eq!(set.bonds.len(), 1);
        assert_eq!(set.bonds[0].atoms, [0, 2]);
        assert!((set.bonds[0].length - 2.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_fix_angle_in_radians() {
        let mol = square();
        let set = convert_constraints(&mol, &[vec![1, 2, 3]], &[]).unwrap();
        assert_eq!(set.angles.len(), 1);
        assert!((set.angles[0].angle - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn test_fix_dihedral() {
        let mol = Molecule::new(vec![
            Atom::new("C", [0.0, 1.0, 0.0]),
            Atom::new("C", [0.0, 0.0, 0.0]),
            Atom::new("C", [1.5, 0.0, 0.0]),
            Atom::new("C", [1.5, -1.0, 0.0]),
        ]);
        let set = convert_constraints(&mol, &[vec![1, 2, 3, 4]], &[]).unwrap();
        assert!((set.dihedrals[0].angle - std::f64::consts::PI).abs() < 1e-9);
    }

    #[test]
    fn test_change_targets_use_given_values() {
        let mol = square();
        let changes = vec![
            Change::Bond(1, 2, 1.54),
            Change::Angle(1, 2, 3, 109.5),
            Change::Dihedral(1, 2, 3, 4, 60.0),
        ];
        let set = convert_constraints(&mol, &[], &changes).unwrap();
        assert!((set.bonds[0].length - 1.54).abs() < 1e-12);
        assert!((set.angles[0].angle - 109.5_f64.to_radians()).abs() < 1e-12);
        assert!((set.dihedrals[0].angle - 60.0_f64.to_radians()).abs() < 1e-12);
        assert_eq!(set.dihedrals[0].atoms, [0, 1, 2, 3]);
    }

    #[test]
    fn test_index_out_of_range() {
        let mol = square();
        assert!(convert_constraints(&mol, &[vec![1, 5]], &[]).is_err());
        assert!(convert_constraints(&mol, &[vec![0, 1]], &[]).is_err());
    }

    #[test]
    fn test_bad_fix_arity() {
        let mol = square();
        assert!(convert_constraints(&mol, &[vec![1]], &[]).is_err());
    }
}
