//! # Gaussian .log 输出解析器
//!
//! 解析 Gaussian 计算输出文件，提取最终几何结构、SCF 能量、
//! 零点校正、振动频率、收敛表和虚频振动模式。
//!
//! ## 依赖关系
//! - 被 `commands/extract.rs`, `commands/collect.rs`, `commands/run.rs` 使用
//! - 使用 `models/molecule.rs`, `models/result.rs`

use crate::error::{QcflowError, Result};
use crate::models::molecule::atomic_number_to_symbol;
use crate::models::{Atom, Convergence, Molecule, QcProgram, QcResult};
use regex::Regex;
use std::fs;
use std::path::Path;

/// 解析 Gaussian 输出文件为统一结果
pub fn parse_output(path: &Path, job_name: &str) -> Result<QcResult> {
    let content = fs::read_to_string(path).map_err(|e| QcflowError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;

    let mut result = parse_output_content(&content, job_name)?;
    result.source_file = Some(path.display().to_string());
    Ok(result)
}

/// 解析 Gaussian 输出文本为统一结果
pub fn parse_output_content(content: &str, job_name: &str) -> Result<QcResult> {
    let mut result = QcResult::new(job_name, QcProgram::Gaussian);
    result.is_finished = normal_termination(content);
    result.convergence = parse_convergence(content);
    result.energy = parse_scf_energy(content);
    result.zpe = parse_zpe(content)?;
    result.frequencies = parse_frequencies(content)?;

    if let Some(mol) = parse_final_geometry(content)? {
        result.num_atoms = Some(mol.atoms.len());
    }

    Ok(result)
}

/// 计算是否正常结束
pub fn normal_termination(content: &str) -> bool {
    content.contains("Normal termination of Gaussian")
}

/// 解析最后一个取向块中的几何结构
///
/// "Standard orientation" / "Input orientation" 之后的坐标表，
/// 行格式 `center Z type x y z`，以 "Distance matrix" 或
/// "Rotational constants" 结束。优化轨迹中取最后一个块。
pub fn parse_final_geometry(content: &str) -> Result<Option<Molecule>> {
    let row_re = Regex::new(
        r"^\s*\d+\s+(\d+)\s+-?\d+\s+(-?\d+\.\d+)\s+(-?\d+\.\d+)\s+(-?\d+\.\d+)\s*$",
    )
    .map_err(|e| QcflowError::Other(e.to_string()))?;

    let mut atoms: Vec<Atom> = Vec::new();
    let mut in_block = false;

    for line in content.lines() {
        if line.contains("Standard orientation") || line.contains("Input orientation") {
            in_block = true;
            atoms.clear();
        } else if in_block
            && (line.contains("Distance matrix") || line.contains("Rotational constants"))
        {
            in_block = false;
        } else if in_block {
            if let Some(caps) = row_re.captures(line) {
                let z: u32 = caps[1].parse().map_err(|_| QcflowError::MalformedToken {
                    token: caps[1].to_string(),
                    context: "orientation block".to_string(),
                })?;
                let symbol = atomic_number_to_symbol(z).unwrap_or("X");
                let mut pos = [0.0f64; 3];
                for k in 0..3 {
                    pos[k] = caps[k + 2]
                        .parse()
                        .map_err(|_| QcflowError::MalformedToken {
                            token: caps[k + 2].to_string(),
                            context: "orientation block".to_string(),
                        })?;
                }
                atoms.push(Atom::new(symbol, pos));
            }
        }
    }

    if atoms.is_empty() {
        Ok(None)
    } else {
        Ok(Some(Molecule::new(atoms)))
    }
}

/// 解析最后一次 SCF 能量 (Hartree)
///
/// "SCF Done:  E(RB3LYP) =  -113.309 A.U. after ..."
pub fn parse_scf_energy(content: &str) -> Option<f64> {
    let mut energy = None;
    for line in content.lines() {
        if line.contains("SCF Done") {
            if let Some(eq_pos) = line.find('=') {
                if let Some(val) = line[eq_pos + 1..].split_whitespace().next() {
                    if let Ok(e) = val.parse() {
                        energy = Some(e);
                    }
                }
            }
        }
    }
    energy
}

/// 解析零点校正 (Hartree)
///
/// "Zero-point correction=    0.023261 (Hartree/Particle)"
pub fn parse_zpe(content: &str) -> Result<Option<f64>> {
    let mut token: Option<&str> = None;
    for line in content.lines() {
        if line.contains("Zero-point correction=") {
            if let Some(eq_pos) = line.find('=') {
                token = line[eq_pos + 1..].split_whitespace().next();
            }
        }
    }

    match token {
        None => Ok(None),
        Some(t) => t.parse().map(Some).map_err(|_| QcflowError::MalformedToken {
            token: t.to_string(),
            context: "zero-point correction".to_string(),
        }),
    }
}

/// 解析振动频率 (cm⁻¹)，虚频为负值
///
/// 收集所有 "Frequencies --" 行的数值。
pub fn parse_frequencies(content: &str) -> Result<Vec<f64>> {
    let mut freqs = Vec::new();
    for line in content.lines() {
        if let Some(pos) = line.find("Frequencies --") {
            for token in line[pos + "Frequencies --".len()..].split_whitespace() {
                let val: f64 = token.parse().map_err(|_| QcflowError::MalformedToken {
                    token: token.to_string(),
                    context: "frequency block".to_string(),
                })?;
                freqs.push(val);
            }
        }
    }
    Ok(freqs)
}

/// 解析几何优化收敛表
///
/// "Item  Value  Threshold  Converged?" 表下四行依次为最大力、
/// 均方根力、最大位移、均方根位移。四项全 YES 为 Full，两项力
/// 判据 YES 为 ForcesOnly。扫描整个文件，取最好的一次。
pub fn parse_convergence(content: &str) -> Convergence {
    let lines: Vec<&str> = content.lines().collect();
    let mut best = Convergence::NotConverged;

    for (n, line) in lines.iter().enumerate() {
        if !line.contains("Item               Value     Threshold  Converged?") {
            continue;
        }

        let yes: Vec<bool> = (1..=4)
            .map(|k| lines.get(n + k).map_or(false, |l| l.contains("YES")))
            .collect();

        let status = if yes.iter().all(|y| *y) {
            Convergence::Full
        } else if yes[0] && yes[1] {
            Convergence::ForcesOnly
        } else {
            Convergence::NotConverged
        };

        if rank(status) > rank(best) {
            best = status;
        }
    }

    best
}

fn rank(c: Convergence) -> u8 {
    match c {
        Convergence::NotConverged => 0,
        Convergence::ForcesOnly => 1,
        Convergence::Full => 2,
    }
}

/// 解析虚频简正模式位移
///
/// 频率输出中第一个 "  Atom  AN" 块的前三列位移即最低模式，
/// 鞍点上就是虚频模式。非鞍点输出的首个模式意义不大，由调用方
/// 根据虚频数量判断。没有模式块时返回 None。
pub fn parse_imaginary_mode(content: &str, atom_count: usize) -> Result<Option<Vec<[f64; 3]>>> {
    let lines: Vec<&str> = content.lines().collect();

    for (idx, line) in lines.iter().enumerate() {
        if !line.starts_with("  Atom  AN") {
            continue;
        }

        let mut mode = Vec::with_capacity(atom_count);
        for n in 0..atom_count {
            let row = lines.get(idx + 1 + n).ok_or(QcflowError::TruncatedBlock {
                expected: atom_count,
                found: n,
            })?;
            let fields: Vec<&str> = row.split_whitespace().collect();
            if fields.len() < 5 {
                return Err(QcflowError::TruncatedBlock {
                    expected: atom_count,
                    found: n,
                });
            }
            let mut disp = [0.0f64; 3];
            for (k, field) in fields[2..5].iter().enumerate() {
                disp[k] = field.parse().map_err(|_| QcflowError::MalformedToken {
                    token: field.to_string(),
                    context: "normal mode block".to_string(),
                })?;
            }
            mode.push(disp);
        }
        return Ok(Some(mode));
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GAUSS_LOG: &str = r#"
                         Standard orientation:
 ---------------------------------------------------------------------
 Center     Atomic      Atomic             Coordinates (Angstroms)
 Number     Number       Type             X           Y           Z
 ---------------------------------------------------------------------
      1          6           0        0.000000    0.000000    0.000000
      2          8           0        1.210000    0.000000    0.000000
 ---------------------------------------------------------------------
 Rotational constants (GHZ):      0.000000     57.634      57.634
 SCF Done:  E(RB3LYP) =  -113.309213     A.U. after   12 cycles
         Item               Value     Threshold  Converged?
 Maximum Force            0.000012     0.000450     YES
 RMS     Force            0.000004     0.000300     YES
 Maximum Displacement     0.000205     0.001800     YES
 RMS     Displacement     0.000074     0.001200     YES
 Frequencies --   -512.3086              1820.3412              2169.7601
 Zero-point correction=                           0.023261 (Hartree/Particle)
  Atom  AN      X      Y      Z        X      Y      Z        X      Y      Z
     1   6     0.00   0.00   0.36     0.10   0.00   0.00     0.00   0.20   0.00
     2   8    -0.05   0.00  -0.27     0.00   0.10   0.00     0.00   0.00   0.20
 Normal termination of Gaussian 16 at Mon Mar  4 12:00:00 2024.
"#;

    #[test]
    fn test_parse_final_geometry() {
        let mol = parse_final_geometry(GAUSS_LOG).unwrap().unwrap();
        assert_eq!(mol.atoms.len(), 2);
        assert_eq!(mol.atoms[0].element, "C");
        assert_eq!(mol.atoms[1].element, "O");
        assert!((mol.atoms[1].position[0] - 1.21).abs() < 1e-9);
    }

    #[test]
    fn test_parse_scf_energy() {
        let e = parse_scf_energy(GAUSS_LOG).unwrap();
        assert!((e - (-113.309213)).abs() < 1e-9);
    }

    #[test]
    fn test_parse_zpe() {
        let zpe = parse_zpe(GAUSS_LOG).unwrap().unwrap();
        assert!((zpe - 0.023261).abs() < 1e-9);
    }

    #[test]
    fn test_parse_frequencies_with_imaginary() {
        let freqs = parse_frequencies(GAUSS_LOG).unwrap();
        assert_eq!(freqs.len(), 3);
        assert!(freqs[0] < 0.0);
    }

    #[test]
    fn test_parse_convergence_full() {
        assert_eq!(parse_convergence(GAUSS_LOG), Convergence::Full);
    }

    #[test]
    fn test_parse_convergence_forces_only() {
        let content = r#"
         Item               Value     Threshold  Converged?
 Maximum Force            0.000012     0.000450     YES
 RMS     Force            0.000004     0.000300     YES
 Maximum Displacement     0.002205     0.001800     NO
 RMS     Displacement     0.000774     0.001200     NO
"#;
        assert_eq!(parse_convergence(content), Convergence::ForcesOnly);
    }

    #[test]
    fn test_parse_convergence_best_table_wins() {
        let content = r#"
         Item               Value     Threshold  Converged?
 Maximum Force            0.012000     0.000450     NO
 RMS     Force            0.004000     0.000300     NO
 Maximum Displacement     0.022050     0.001800     NO
 RMS     Displacement     0.007740     0.001200     NO
         Item               Value     Threshold  Converged?
 Maximum Force            0.000012     0.000450     YES
 RMS     Force            0.000004     0.000300     YES
 Maximum Displacement     0.000205     0.001800     YES
 RMS     Displacement     0.000074     0.001200     YES
"#;
        assert_eq!(parse_convergence(content), Convergence::Full);
    }

    #[test]
    fn test_parse_convergence_missing() {
        assert_eq!(parse_convergence("no table"), Convergence::NotConverged);
    }

    #[test]
    fn test_parse_imaginary_mode() {
        let mode = parse_imaginary_mode(GAUSS_LOG, 2).unwrap().unwrap();
        assert_eq!(mode.len(), 2);
        assert!((mode[0][2] - 0.36).abs() < 1e-9);
        assert!((mode[1][0] - (-0.05)).abs() < 1e-9);
    }

    #[test]
    fn test_parse_imaginary_mode_absent() {
        assert_eq!(parse_imaginary_mode("empty log", 2).unwrap(), None);
    }

    #[test]
    fn test_parse_imaginary_mode_truncated() {
        let content = "  Atom  AN      X      Y      Z\n     1   6     0.00   0.00   0.36\n";
        assert!(matches!(
            parse_imaginary_mode(content, 2),
            Err(QcflowError::TruncatedBlock { .. })
        ));
    }

    #[test]
    fn test_parse_output_aggregates() {
        let result = parse_output_content(GAUSS_LOG, "ts_search").unwrap();
        assert!(result.is_finished);
        assert_eq!(result.convergence, Convergence::Full);
        assert_eq!(result.num_atoms, Some(2));
        assert_eq!(result.num_imaginary(), 1);
        assert!((result.energy.unwrap() - (-113.309213)).abs() < 1e-9);
    }
}
