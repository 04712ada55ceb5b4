//! # 分子结构数据模型
//!
//! 定义统一的分子表示，由各输出解析器构造，供约束转换和
//! 简正模式分析使用。
//!
//! ## 依赖关系
//! - 被 `parsers/` 和 `analysis/` 使用
//! - 使用 `nalgebra` 做几何运算

use crate::error::{QcflowError, Result};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 原子信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Atom {
    /// 元素符号
    pub element: String,

    /// 笛卡尔坐标 (Å)
    pub position: [f64; 3],
}

impl Atom {
    pub fn new(element: impl Into<String>, position: [f64; 3]) -> Self {
        Atom {
            element: element.into(),
            position,
        }
    }

    /// 是否为占位（dummy）原子
    pub fn is_dummy(&self) -> bool {
        self.element == "X"
    }
}

/// 分子结构
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Molecule {
    /// 原子列表
    pub atoms: Vec<Atom>,

    /// 电荷
    pub charge: i32,

    /// 自旋多重度
    pub multiplicity: u32,
}

impl Molecule {
    pub fn new(atoms: Vec<Atom>) -> Self {
        Molecule {
            atoms,
            charge: 0,
            multiplicity: 1,
        }
    }

    pub fn with_charge_mult(mut self, charge: i32, multiplicity: u32) -> Self {
        self.charge = charge;
        self.multiplicity = multiplicity;
        self
    }

    /// 真实原子数（排除 dummy 原子）
    pub fn num_real_atoms(&self) -> usize {
        self.atoms.iter().filter(|a| !a.is_dummy()).count()
    }

    fn vec(&self, i: usize) -> Vector3<f64> {
        Vector3::from(self.atoms[i].position)
    }

    /// 原子间距离 (Å)，索引从 0 开始
    pub fn distance(&self, i: usize, j: usize) -> f64 {
        (self.vec(i) - self.vec(j)).norm()
    }

    /// 键角 (弧度)，j 为顶点
    pub fn angle(&self, i: usize, j: usize, k: usize) -> f64 {
        let v1 = self.vec(i) - self.vec(j);
        let v2 = self.vec(k) - self.vec(j);
        let cos = v1.dot(&v2) / (v1.norm() * v2.norm());
        cos.clamp(-1.0, 1.0).acos()
    }

    /// 二面角 (弧度)，范围 [0, 2π)
    pub fn dihedral(&self, i: usize, j: usize, k: usize, l: usize) -> f64 {
        let b1 = self.vec(j) - self.vec(i);
        let b2 = self.vec(k) - self.vec(j);
        let b3 = self.vec(l) - self.vec(k);

        let n1 = b1.cross(&b2);
        let n2 = b2.cross(&b3);
        let m1 = n1.cross(&(b2 / b2.norm()));

        let x = n1.dot(&n2);
        let y = m1.dot(&n2);

        let angle = y.atan2(x);
        if angle < 0.0 {
            angle + 2.0 * std::f64::consts::PI
        } else {
            angle
        }
    }

    /// 从 XYZ 格式文本解析
    ///
    /// 首行原子数，第二行注释，其后每行 `元素 x y z`。
    pub fn from_xyz_content(content: &str) -> Result<Molecule> {
        let mut lines = content.lines();

        let count_line = lines
            .next()
            .ok_or_else(|| QcflowError::InvalidArgument("empty XYZ content".to_string()))?;
        let count: usize =
            count_line
                .trim()
                .parse()
                .map_err(|_| QcflowError::MalformedToken {
                    token: count_line.trim().to_string(),
                    context: "XYZ atom count".to_string(),
                })?;

        lines.next(); // 注释行

        let mut atoms = Vec::with_capacity(count);
        for line in lines {
            if atoms.len() == count {
                break;
            }
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.is_empty() {
                continue;
            }
            if fields.len() < 4 {
                return Err(QcflowError::InvalidArgument(format!(
                    "short XYZ row '{}'",
                    line
                )));
            }
            let mut pos = [0.0f64; 3];
            for (k, field) in fields[1..4].iter().enumerate() {
                pos[k] = field.parse().map_err(|_| QcflowError::MalformedToken {
                    token: field.to_string(),
                    context: "XYZ coordinates".to_string(),
                })?;
            }
            atoms.push(Atom::new(fields[0], pos));
        }

        if atoms.len() != count {
            return Err(QcflowError::InvalidArgument(format!(
                "XYZ header promises {} atoms, found {}",
                count,
                atoms.len()
            )));
        }

        Ok(Molecule::new(atoms))
    }

    /// 从 XYZ 文件解析
    pub fn from_xyz_file(path: &Path) -> Result<Molecule> {
        let content =
            std::fs::read_to_string(path).map_err(|e| QcflowError::FileReadError {
                path: path.display().to_string(),
                source: e,
            })?;
        Self::from_xyz_content(&content)
    }

    /// 导出 XYZ 格式文本
    pub fn to_xyz_string(&self, comment: &str) -> String {
        let mut out = format!("{}\n{}\n", self.atoms.len(), comment);
        for atom in &self.atoms {
            out.push_str(&format!(
                "{:<3} {:>15.8} {:>15.8} {:>15.8}\n",
                atom.element, atom.position[0], atom.position[1], atom.position[2]
            ));
        }
        out
    }
}

/// 元素符号 -> 标准原子质量 (amu)
pub fn atomic_mass(element: &str) -> Option<f64> {
    let mass = match element {
        "H" => 1.00794,
        "He" => 4.002602,
        "Li" => 6.941,
        "Be" => 9.012182,
        "B" => 10.811,
        "C" => 12.0107,
        "N" => 14.0067,
        "O" => 15.9994,
        "F" => 18.9984032,
        "Ne" => 20.1797,
        "Na" => 22.98976928,
        "Mg" => 24.305,
        "Al" => 26.9815386,
        "Si" => 28.0855,
        "P" => 30.973762,
        "S" => 32.065,
        "Cl" => 35.453,
        "Ar" => 39.948,
        "K" => 39.0983,
        "Ca" => 40.078,
        "Ti" => 47.867,
        "Cr" => 51.9961,
        "Mn" => 54.938045,
        "Fe" => 55.845,
        "Ni" => 58.6934,
        "Cu" => 63.546,
        "Zn" => 65.38,
        "Br" => 79.904,
        "Kr" => 83.798,
        "I" => 126.90447,
        _ => return None,
    };
    Some(mass)
}

/// 原子序数 -> 元素符号（QChem/Gaussian 输出以序数给出原子）
pub fn atomic_number_to_symbol(num: u32) -> Option<&'static str> {
    const SYMBOLS: [&str; 36] = [
        "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", "Na", "Mg", "Al", "Si", "P", "S",
        "Cl", "Ar", "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", "Ga",
        "Ge", "As", "Se", "Br", "Kr",
    ];
    match num {
        0 => Some("X"), // dummy 原子
        1..=36 => Some(SYMBOLS[(num - 1) as usize]),
        53 => Some("I"),
        _ => None,
    }
}
