//! # 格式化检查点 (.fchk) 解析器
//!
//! 从格式化检查点文件中重建笛卡尔力常数矩阵 (Hessian)。
//! 检查点以下三角展平形式存储对称矩阵，按行优先顺序
//! (i, 0..=i) 枚举，共 N*(N+1)/2 个值，N = 3 * 原子数。
//!
//! ## 依赖关系
//! - 被 `commands/hessian.rs` 使用
//! - 下游 `analysis/normal_modes.rs` 做对角化
//! - 使用 `nalgebra` 存储稠密矩阵

use crate::error::{QcflowError, Result};
use nalgebra::DMatrix;

/// 力常数块的标记行
const FORCE_CONSTANT_MARKER: &str = "Cartesian Force Constants";

/// Hessian 读取结果
///
/// 检查点中没有力常数块时返回全零矩阵，`found` 显式标记
/// 该情况，调用方不必用零矩阵相等性判断数据缺失。
#[derive(Debug, Clone)]
pub struct HessianRead {
    /// 是否找到力常数块
    pub found: bool,

    /// N x N 对称矩阵 (Hartree/Bohr²)，未找到时为全零
    pub matrix: DMatrix<f64>,
}

impl HessianRead {
    fn not_found(n: usize) -> Self {
        HessianRead {
            found: false,
            matrix: DMatrix::zeros(n, n),
        }
    }
}

/// 从检查点文本重建 Hessian
///
/// 取最后一个 "Cartesian Force Constants" 块（检查点被多次写入时
/// 末尾的块是最新的），从其后各行收集空白分隔的数值，凑足
/// N*(N+1)/2 个后按下三角行优先填入并镜像到上三角。
///
/// 数值不足返回 `TruncatedBlock`，数值区间内出现非数值标记
/// 返回 `MalformedToken`；标记行缺失不是错误，返回全零矩阵
/// 和 `found = false`。
pub fn reconstruct_hessian(atom_count: usize, content: &str) -> Result<HessianRead> {
    if atom_count == 0 {
        return Err(QcflowError::InvalidArgument(
            "atom count must be positive".to_string(),
        ));
    }

    let n = 3 * atom_count;
    let nvals = n * (n + 1) / 2;

    let lines: Vec<&str> = content.lines().collect();

    // 定位最后一个标记行
    let marker_idx = match lines.iter().rposition(|l| l.contains(FORCE_CONSTANT_MARKER)) {
        Some(idx) => idx,
        None => return Ok(HessianRead::not_found(n)),
    };

    // 从标记行之后收集数值，跨行直到凑足 nvals 个
    let mut flat: Vec<f64> = Vec::with_capacity(nvals);
    'outer: for (offset, line) in lines[marker_idx + 1..].iter().enumerate() {
        for token in line.split_whitespace() {
            let val: f64 = token.parse().map_err(|_| QcflowError::MalformedToken {
                token: token.to_string(),
                context: format!("force constant block, line {}", marker_idx + 2 + offset),
            })?;
            flat.push(val);
            if flat.len() == nvals {
                break 'outer;
            }
        }
    }

    if flat.len() < nvals {
        return Err(QcflowError::TruncatedBlock {
            expected: nvals,
            found: flat.len(),
        });
    }

    // 下三角行优先填充，对称镜像
    let mut matrix = DMatrix::zeros(n, n);
    let mut idx = 0;
    for i in 0..n {
        for j in 0..=i {
            matrix[(i, j)] = flat[idx];
            matrix[(j, i)] = flat[idx];
            idx += 1;
        }
    }

    Ok(HessianRead {
        found: true,
        matrix,
    })
}

/// 从检查点文本读取原子数
///
/// "Number of atoms   I   N" 行的末尾整数。
pub fn parse_atom_count(content: &str) -> Result<usize> {
    for line in content.lines() {
        if line.starts_with("Number of atoms") {
            let token = line.split_whitespace().last().unwrap_or("");
            return token.parse().map_err(|_| QcflowError::MalformedToken {
                token: token.to_string(),
                context: "atom count field".to_string(),
            });
        }
    }
    Err(QcflowError::ParseError {
        format: "fchk".to_string(),
        path: String::new(),
        reason: "'Number of atoms' field not found".to_string(),
    })
}

/// 从检查点文本读取各原子的原子序数
///
/// "Atomic numbers  I  N= count" 之后的整数序列。
pub fn parse_atomic_numbers(content: &str, atom_count: usize) -> Result<Vec<u32>> {
    let lines: Vec<&str> = content.lines().collect();
    let marker_idx = lines
        .iter()
        .position(|l| l.starts_with("Atomic numbers"))
        .ok_or_else(|| QcflowError::ParseError {
            format: "fchk".to_string(),
            path: String::new(),
            reason: "'Atomic numbers' field not found".to_string(),
        })?;

    let mut numbers = Vec::with_capacity(atom_count);
    'outer: for line in &lines[marker_idx + 1..] {
        for token in line.split_whitespace() {
            let z: u32 = token.parse().map_err(|_| QcflowError::MalformedToken {
                token: token.to_string(),
                context: "atomic numbers block".to_string(),
            })?;
            numbers.push(z);
            if numbers.len() == atom_count {
                break 'outer;
            }
        }
    }

    if numbers.len() < atom_count {
        return Err(QcflowError::TruncatedBlock {
            expected: atom_count,
            found: numbers.len(),
        });
    }

    Ok(numbers)
}

/// 将对称矩阵按下三角行优先展平（测试与导出用，与重建顺序互逆）
pub fn flatten_lower_triangular(matrix: &DMatrix<f64>) -> Vec<f64> {
    let n = matrix.nrows();
    let mut flat = Vec::with_capacity(n * (n + 1) / 2);
    for i in 0..n {
        for j in 0..=i {
            flat.push(matrix[(i, j)]);
        }
    }
    flat
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dump_with_values(values: &[f64], per_line: usize) -> String {
        let mut out = String::from("Number of atoms                            I                1\n");
        out.push_str("Cartesian Force Constants                  R   N=           6\n");
        for chunk in values.chunks(per_line) {
            let line: Vec<String> = chunk.iter().map(|v| format!("{:16.8E}", v)).collect();
            out.push_str(&line.join(" "));
            out.push('\n');
        }
        out.push_str("Dipole Moment                              R   N=           3\n");
        out
    }

    #[test]
    fn test_concrete_single_atom() {
        // 1 原子 -> N = 3, nvals = 6
        let dump = dump_with_values(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 5);
        let read = reconstruct_hessian(1, &dump).unwrap();
        assert!(read.found);

        let expected = [
            [1.0, 2.0, 4.0],
            [2.0, 3.0, 5.0],
            [4.0, 5.0, 6.0],
        ];
        for i in 0..3 {
            for j in 0..3 {
                assert_eq!(read.matrix[(i, j)], expected[i][j]);
            }
        }
    }

    #[test]
    fn test_symmetry() {
        // 2 原子 -> N = 6, nvals = 21
        let values: Vec<f64> = (1..=21).map(|v| v as f64 * 0.1).collect();
        let dump = dump_with_values(&values, 5);
        let read = reconstruct_hessian(2, &dump).unwrap();
        assert!(read.found);

        for i in 0..6 {
            for j in 0..6 {
                assert_eq!(read.matrix[(i, j)], read.matrix[(j, i)]);
            }
        }
    }

    #[test]
    fn test_flatten_then_reconstruct_identity() {
        let values: Vec<f64> = (1..=21).map(|v| v as f64).collect();
        let dump = dump_with_values(&values, 4);
        let read = reconstruct_hessian(2, &dump).unwrap();

        let flat = flatten_lower_triangular(&read.matrix);
        assert_eq!(flat, values);

        let dump2 = dump_with_values(&flat, 7);
        let read2 = reconstruct_hessian(2, &dump2).unwrap();
        assert_eq!(read.matrix, read2.matrix);
    }

    #[test]
    fn test_missing_marker_returns_zeros() {
        let dump = "Number of atoms  I  1\nTotal Energy   R  -76.4\n";
        let read = reconstruct_hessian(1, dump).unwrap();
        assert!(!read.found);
        assert_eq!(read.matrix.nrows(), 3);
        assert_eq!(read.matrix.ncols(), 3);
        assert!(read.matrix.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_truncated_block_is_error() {
        // nvals = 6，只给 5 个
        let dump = dump_with_values(&[1.0, 2.0, 3.0, 4.0, 5.0], 5);
        // chunk 后的 "Dipole Moment" 行会先触发 MalformedToken，
        // 构造纯截断输入需要去掉尾部区块
        let truncated: String = dump
            .lines()
            .take_while(|l| !l.starts_with("Dipole"))
            .map(|l| format!("{}\n", l))
            .collect();
        let err = reconstruct_hessian(1, &truncated).unwrap_err();
        match err {
            QcflowError::TruncatedBlock { expected, found } => {
                assert_eq!(expected, 6);
                assert_eq!(found, 5);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_malformed_token_is_error() {
        let dump = "Cartesian Force Constants  R   N= 6\n1.0 2.0 oops 4.0 5.0 6.0\n";
        let err = reconstruct_hessian(1, dump).unwrap_err();
        match err {
            QcflowError::MalformedToken { token, .. } => assert_eq!(token, "oops"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_header_line_inside_span_is_error() {
        // 数值区间内混入字段头行，按 MalformedToken 处理而不是猜测跳过
        let dump = "Cartesian Force Constants  R   N= 6\n1.0 2.0 3.0\nDipole Moment R N= 3\n4.0 5.0 6.0\n";
        assert!(matches!(
            reconstruct_hessian(1, dump),
            Err(QcflowError::MalformedToken { .. })
        ));
    }

    #[test]
    fn test_last_marker_block_wins() {
        let stale = dump_with_values(&[9.0; 6], 5);
        let fresh = dump_with_values(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 5);
        let dump = format!("{}{}", stale, fresh);
        let read = reconstruct_hessian(1, &dump).unwrap();
        assert_eq!(read.matrix[(0, 0)], 1.0);
        assert_eq!(read.matrix[(2, 2)], 6.0);
    }

    #[test]
    fn test_parse_atom_count() {
        let content = "Number of atoms                            I                3\n";
        assert_eq!(parse_atom_count(content).unwrap(), 3);
        assert!(parse_atom_count("no such field").is_err());
    }

    #[test]
    fn test_parse_atomic_numbers() {
        let content = "Atomic numbers                             I   N=           3\n\
                       8 1 1\n";
        assert_eq!(parse_atomic_numbers(content, 3).unwrap(), vec![8, 1, 1]);
        assert!(matches!(
            parse_atomic_numbers(content, 4),
            Err(QcflowError::TruncatedBlock { .. })
        ));
    }

    #[test]
    fn test_exponent_notation() {
        let dump = "Cartesian Force Constants  R   N= 6\n\
                    1.00000000E-01 -2.50000000E+00 3.0E0\n\
                    4.0 5.0 6.0\n";
        let read = reconstruct_hessian(1, dump).unwrap();
        assert!((read.matrix[(0, 0)] - 0.1).abs() < 1e-12);
        assert!((read.matrix[(1, 0)] + 2.5).abs() < 1e-12);
    }
}
