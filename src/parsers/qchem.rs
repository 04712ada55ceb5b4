//! # QChem 输出解析器
//!
//! 解析 QChem 计算输出文件，提取最终几何结构、能量、零点能、
//! 振动频率和 IRC 路径。
//!
//! ## 依赖关系
//! - 被 `commands/extract.rs`, `commands/irc.rs`, `commands/collect.rs` 使用
//! - 使用 `models/molecule.rs`, `models/result.rs`

use crate::error::{QcflowError, Result};
use crate::models::molecule::atomic_number_to_symbol;
use crate::models::{Atom, Convergence, Molecule, QcProgram, QcResult};
use std::fs;
use std::path::Path;

/// 解析 QChem 输出文件为统一结果
pub fn parse_output(path: &Path, job_name: &str) -> Result<QcResult> {
    let content = fs::read_to_string(path).map_err(|e| QcflowError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;

    let mut result = parse_output_content(&content, job_name)?;
    result.source_file = Some(path.display().to_string());
    Ok(result)
}

/// 解析 QChem 输出文本为统一结果
pub fn parse_output_content(content: &str, job_name: &str) -> Result<QcResult> {
    let mut result = QcResult::new(job_name, QcProgram::Qchem);
    result.is_finished = content.contains("Thank you very much for using Q-Chem");

    if content.contains("OPTIMIZATION CONVERGED") {
        result.convergence = Convergence::Full;
    }

    result.energy = parse_final_energy(content);
    result.zpe = parse_zpe(content)?;

    if let Some(mol) = parse_final_geometry(content)? {
        result.frequencies = parse_frequencies(content, mol.num_real_atoms())?;
        result.num_atoms = Some(mol.atoms.len());
    } else {
        result.frequencies = parse_frequencies(content, 0)?;
    }

    Ok(result)
}

/// 解析优化收敛后的最终几何结构
///
/// "OPTIMIZATION CONVERGED" 之后的坐标表，行首为原子序号的行
/// 记为一个原子，直到 "Z-matrix" 行结束。未收敛的输出返回 None。
pub fn parse_final_geometry(content: &str) -> Result<Option<Molecule>> {
    let mut reading = false;
    let mut atoms: Vec<Atom> = Vec::new();

    for line in content.lines() {
        if line.contains("OPTIMIZATION CONVERGED") {
            reading = true;
            atoms.clear();
            continue;
        }
        if !reading || line.trim().len() < 2 {
            continue;
        }
        if line.contains("Z-matrix") {
            reading = false;
            continue;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() >= 5 && fields[0].chars().all(|c| c.is_ascii_digit()) {
            let mut pos = [0.0f64; 3];
            for (k, field) in fields[2..5].iter().enumerate() {
                pos[k] = field.parse().map_err(|_| QcflowError::MalformedToken {
                    token: field.to_string(),
                    context: "final geometry block".to_string(),
                })?;
            }
            atoms.push(Atom::new(fields[1], pos));
        }
    }

    if atoms.is_empty() {
        Ok(None)
    } else {
        Ok(Some(Molecule::new(atoms)))
    }
}

/// 用调用方提供的坐标覆盖末尾的占位原子位置
///
/// 第 i 个坐标覆盖倒数第 i+1 个原子。占位原子不参与量子化学
/// 计算，其位置由上游代码维护。
pub fn apply_dummy_positions(mol: &mut Molecule, dummy: &[[f64; 3]]) {
    let n = mol.atoms.len();
    for (i, d) in dummy.iter().enumerate() {
        if i + 1 > n {
            break;
        }
        mol.atoms[n - 1 - i].position = *d;
    }
}

/// 解析零点振动能
///
/// 取最后一次出现的 "Zero point vibrational energy:" 行的数值。
pub fn parse_zpe(content: &str) -> Result<Option<f64>> {
    let mut zpe_token: Option<&str> = None;
    for line in content.lines() {
        if line.contains("Zero point vibrational energy:") {
            zpe_token = line.split_whitespace().nth(4);
        }
    }

    match zpe_token {
        None => Ok(None),
        Some(token) => token
            .parse()
            .map(Some)
            .map_err(|_| QcflowError::MalformedToken {
                token: token.to_string(),
                context: "zero point vibrational energy".to_string(),
            }),
    }
}

/// 解析振动频率 (cm⁻¹)
///
/// 收集所有 "Frequency:" 行之后的数值。双原子分子只有一个
/// 振动模式，取第一个 Frequency 行的首个数值。
pub fn parse_frequencies(content: &str, num_real_atoms: usize) -> Result<Vec<f64>> {
    let mut freqs = Vec::new();

    for line in content.lines() {
        if let Some(rest) = line.trim_start().strip_prefix("Frequency:") {
            for token in rest.split_whitespace() {
                let val: f64 = token.parse().map_err(|_| QcflowError::MalformedToken {
                    token: token.to_string(),
                    context: "frequency block".to_string(),
                })?;
                freqs.push(val);
                if num_real_atoms == 2 {
                    return Ok(freqs);
                }
            }
        }
    }

    Ok(freqs)
}

/// 解析最终能量 (Hartree)
///
/// 优先取优化输出的 "Final energy is"，否则取单点输出的
/// "Total energy in the final basis set ="。均取最后一次出现。
pub fn parse_final_energy(content: &str) -> Option<f64> {
    let mut opt_energy = None;
    let mut sp_energy = None;

    for line in content.lines() {
        if line.contains("Final energy is") {
            opt_energy = line.split_whitespace().last().and_then(|t| t.parse().ok());
        } else if line.contains("Total energy in the final basis set =") {
            sp_energy = line.split_whitespace().last().and_then(|t| t.parse().ok());
        }
    }

    opt_energy.or(sp_energy)
}

/// IRC 路径数据
#[derive(Debug, Clone)]
pub struct IrcPath {
    /// 各原子的原子序数
    pub atomic_numbers: Vec<u32>,

    /// 各帧的坐标，每帧 natom 个 [x, y, z]
    pub frames: Vec<Vec<[f64; 3]>>,

    /// 电荷
    pub charge: i32,

    /// 自旋多重度
    pub multiplicity: u32,
}

impl IrcPath {
    /// 转换为分子列表，每帧一个
    pub fn to_molecules(&self) -> Vec<Molecule> {
        self.frames
            .iter()
            .map(|frame| {
                let atoms = self
                    .atomic_numbers
                    .iter()
                    .zip(frame.iter())
                    .map(|(z, pos)| {
                        Atom::new(atomic_number_to_symbol(*z).unwrap_or("X"), *pos)
                    })
                    .collect();
                Molecule::new(atoms).with_charge_mult(self.charge, self.multiplicity)
            })
            .collect()
    }
}

/// 解析 IRC 输出中的全部几何结构
///
/// 每个 "CURRENT STRUCTURE" 块之后隔 5 行表头开始坐标表，
/// 行格式为 `序号 原子序数 x y z`，以 "-------" 分隔线结束。
pub fn parse_irc_path(content: &str) -> Result<IrcPath> {
    let lines: Vec<&str> = content.lines().collect();

    let mut charge = 0i32;
    let mut multiplicity = 1u32;
    let mut atomic_numbers: Vec<u32> = Vec::new();
    let mut frames: Vec<Vec<[f64; 3]>> = Vec::new();

    let parse_err = |reason: String| QcflowError::ParseError {
        format: "QChem IRC".to_string(),
        path: String::new(),
        reason,
    };

    for (index, line) in lines.iter().enumerate() {
        if line.contains("Charge = ") {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() >= 6 {
                charge = fields[2]
                    .parse()
                    .map_err(|_| parse_err(format!("bad charge token '{}'", fields[2])))?;
                multiplicity = fields[5]
                    .parse()
                    .map_err(|_| parse_err(format!("bad multiplicity token '{}'", fields[5])))?;
            }
        }

        if line.contains("CURRENT STRUCTURE") {
            let mut frame: Vec<[f64; 3]> = Vec::new();
            let mut numbers: Vec<u32> = Vec::new();
            let mut row = index + 6;

            loop {
                let current = lines
                    .get(row)
                    .ok_or_else(|| parse_err("structure block ends before separator".to_string()))?;
                if current.contains("-------") {
                    break;
                }

                let fields: Vec<&str> = current.split_whitespace().collect();
                if fields.len() < 5 {
                    return Err(parse_err(format!("short structure row '{}'", current)));
                }
                let z: u32 = fields[1]
                    .parse()
                    .map_err(|_| parse_err(format!("bad atomic number '{}'", fields[1])))?;
                let mut pos = [0.0f64; 3];
                for (k, field) in fields[2..5].iter().enumerate() {
                    pos[k] = field
                        .parse()
                        .map_err(|_| parse_err(format!("bad coordinate '{}'", field)))?;
                }
                numbers.push(z);
                frame.push(pos);
                row += 1;
            }

            if atomic_numbers.is_empty() {
                atomic_numbers = numbers;
            } else if numbers != atomic_numbers {
                return Err(parse_err(format!(
                    "inconsistent atom list: frame {} has {} atoms, expected {}",
                    frames.len(),
                    numbers.len(),
                    atomic_numbers.len()
                )));
            }
            frames.push(frame);
        }
    }

    if frames.is_empty() {
        return Err(parse_err("no CURRENT STRUCTURE blocks found".to_string()));
    }

    Ok(IrcPath {
        atomic_numbers,
        frames,
        charge,
        multiplicity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const OPT_LOG: &str = r#"
 Optimization Cycle:  12
                       Coordinates (Angstroms)
   **  OPTIMIZATION CONVERGED  **

                           Coordinates (Angstroms)
    ATOM                X               Y               Z
    1  C         0.0000000000    0.0000000000    0.0000000000
    2  O         1.2100000000    0.0000000000    0.0000000000
    3  H        -0.5400000000    0.9300000000    0.0000000000
  Z-matrix Print:

 Final energy is   -113.3066503
 Zero point vibrational energy:       16.432 kcal/mol
 Frequency:   1187.33  1849.25  2900.10
 Thank you very much for using Q-Chem.  Have a nice day.
"#;

    #[test]
    fn test_parse_final_geometry() {
        let mol = parse_final_geometry(OPT_LOG).unwrap().unwrap();
        assert_eq!(mol.atoms.len(), 3);
        assert_eq!(mol.atoms[1].element, "O");
        assert!((mol.atoms[1].position[0] - 1.21).abs() < 1e-9);
    }

    #[test]
    fn test_parse_final_geometry_unconverged() {
        let content = "Optimization Cycle: 3\n 1 C 0.0 0.0 0.0\n";
        assert!(parse_final_geometry(content).unwrap().is_none());
    }

    #[test]
    fn test_apply_dummy_positions() {
        let mut mol = Molecule::new(vec![
            Atom::new("C", [0.0, 0.0, 0.0]),
            Atom::new("X", [1.0, 1.0, 1.0]),
            Atom::new("X", [2.0, 2.0, 2.0]),
        ]);
        // 第一个坐标覆盖最后一个原子
        apply_dummy_positions(&mut mol, &[[9.0, 9.0, 9.0], [8.0, 8.0, 8.0]]);
        assert_eq!(mol.atoms[2].position, [9.0, 9.0, 9.0]);
        assert_eq!(mol.atoms[1].position, [8.0, 8.0, 8.0]);
        assert_eq!(mol.atoms[0].position, [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_parse_zpe() {
        let zpe = parse_zpe(OPT_LOG).unwrap().unwrap();
        assert!((zpe - 16.432).abs() < 1e-9);
    }

    #[test]
    fn test_parse_zpe_missing() {
        assert_eq!(parse_zpe("no vibrational data here").unwrap(), None);
    }

    #[test]
    fn test_parse_zpe_malformed() {
        let content = " Zero point vibrational energy:       ****** kcal/mol\n";
        assert!(matches!(
            parse_zpe(content),
            Err(QcflowError::MalformedToken { .. })
        ));
    }

    #[test]
    fn test_parse_frequencies() {
        let freqs = parse_frequencies(OPT_LOG, 3).unwrap();
        assert_eq!(freqs, vec![1187.33, 1849.25, 2900.10]);
    }

    #[test]
    fn test_parse_frequencies_diatomic_takes_first() {
        let content = " Frequency:   2169.76\n Frequency:   9999.99\n";
        let freqs = parse_frequencies(content, 2).unwrap();
        assert_eq!(freqs, vec![2169.76]);
    }

    #[test]
    fn test_parse_final_energy() {
        let e = parse_final_energy(OPT_LOG).unwrap();
        assert!((e - (-113.3066503)).abs() < 1e-9);
    }

    #[test]
    fn test_parse_final_energy_single_point() {
        let content = " Total energy in the final basis set =     -76.40331299\n";
        let e = parse_final_energy(content).unwrap();
        assert!((e - (-76.40331299)).abs() < 1e-9);
    }

    const IRC_LOG: &str = r#"
 Charge =  0 Multiplicity = 1

  IRC -- point   1
                        CURRENT STRUCTURE
 --------------------------------------------------
            Cartesian Coordinates (Angstroms)
 --------------------------------------------------
    ATOM       AN              X       Y       Z
 --------------------------------------------------
    1          6          0.000   0.000   0.000
    2          8          1.210   0.000   0.000
 --------------------------------------------------

  IRC -- point   2
                        CURRENT STRUCTURE
 --------------------------------------------------
            Cartesian Coordinates (Angstroms)
 --------------------------------------------------
    ATOM       AN              X       Y       Z
 --------------------------------------------------
    1          6          0.050   0.000   0.000
    2          8          1.180   0.000   0.000
 --------------------------------------------------
"#;

    #[test]
    fn test_parse_irc_path() {
        let path = parse_irc_path(IRC_LOG).unwrap();
        assert_eq!(path.charge, 0);
        assert_eq!(path.multiplicity, 1);
        assert_eq!(path.atomic_numbers, vec![6, 8]);
        assert_eq!(path.frames.len(), 2);
        assert!((path.frames[1][0][0] - 0.05).abs() < 1e-9);

        let mols = path.to_molecules();
        assert_eq!(mols[0].atoms[0].element, "C");
        assert_eq!(mols[1].atoms[1].element, "O");
    }

    #[test]
    fn test_parse_irc_path_empty_is_error() {
        assert!(parse_irc_path("nothing to see").is_err());
    }

    #[test]
    fn test_parse_output_aggregates() {
        let result = parse_output_content(OPT_LOG, "co_h").unwrap();
        assert!(result.is_finished);
        assert_eq!(result.convergence, Convergence::Full);
        assert_eq!(result.num_atoms, Some(3));
        assert_eq!(result.frequencies.len(), 3);
        assert!((result.energy.unwrap() - (-113.3066503)).abs() < 1e-9);
    }
}
