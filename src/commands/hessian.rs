//! # hessian 命令实现
//!
//! 从格式化检查点重建笛卡尔力常数矩阵，可选做简正模式分析。
//! 只有二进制检查点时先调用外部转换命令生成文本形式；数值
//! 重建本身不碰外部状态。
//!
//! ## 依赖关系
//! - 使用 `cli/hessian.rs` 定义的参数
//! - 使用 `parsers/fchk.rs`, `analysis/normal_modes.rs`
//! - 使用 `utils/output.rs`

use crate::analysis::normal_modes;
use crate::cli::hessian::HessianArgs;
use crate::error::{QcflowError, Result};
use crate::models::molecule::atomic_number_to_symbol;
use crate::parsers::{fchk, gaussian};
use crate::utils::output;

use nalgebra::DMatrix;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

/// 执行 hessian 命令
pub fn execute(args: HessianArgs) -> Result<()> {
    output::print_header("Hessian Reconstruction");

    let fchk_path = ensure_fchk(&args.job, &args.formchk_cmd)?;
    output::print_info(&format!("Reading '{}'", fchk_path.display()));

    let content = fs::read_to_string(&fchk_path).map_err(|e| QcflowError::FileReadError {
        path: fchk_path.display().to_string(),
        source: e,
    })?;

    let atom_count = match args.atoms {
        Some(n) => n,
        None => fchk::parse_atom_count(&content)?,
    };
    if atom_count == 0 {
        return Err(QcflowError::InvalidArgument(
            "atom count must be positive".to_string(),
        ));
    }

    let read = fchk::reconstruct_hessian(atom_count, &content)?;

    output::print_kv("Atoms", &atom_count.to_string());
    output::print_kv(
        "Dimension",
        &format!("{} x {}", read.matrix.nrows(), read.matrix.ncols()),
    );

    if !read.found {
        output::print_warning(
            "No 'Cartesian Force Constants' block in checkpoint; matrix is all zeros.",
        );
    } else {
        output::print_success("Force constant block reconstructed.");
    }

    if let Some(ref out_path) = args.output {
        write_matrix(&read.matrix, out_path)?;
        output::print_done(&format!("Matrix written to '{}'", out_path.display()));
    }

    if args.freq {
        if !read.found {
            output::print_warning("Skipping normal mode analysis: no force constants.");
            return Ok(());
        }
        print_wavenumbers(&content, atom_count, &read.matrix)?;
    }

    if args.imag_mode {
        print_imag_mode(&args.job, atom_count)?;
    }

    Ok(())
}

/// 打印 `<job>.log` 中最低模式的位移（鞍点上即虚频模式）
fn print_imag_mode(job: &Path, atom_count: usize) -> Result<()> {
    let log_path = job.with_extension("log");
    if !log_path.exists() {
        return Err(QcflowError::FileNotFound {
            path: log_path.display().to_string(),
        });
    }

    let content = fs::read_to_string(&log_path).map_err(|e| QcflowError::FileReadError {
        path: log_path.display().to_string(),
        source: e,
    })?;

    match gaussian::parse_imaginary_mode(&content, atom_count)? {
        Some(mode) => {
            output::print_header("Lowest Mode Displacements");
            for (i, d) in mode.iter().enumerate() {
                println!("  {:>4} {:>8.3} {:>8.3} {:>8.3}", i + 1, d[0], d[1], d[2]);
            }
        }
        None => output::print_warning(&format!(
            "No normal mode block in '{}'",
            log_path.display()
        )),
    }

    Ok(())
}

/// 确保文本检查点存在
///
/// `<job>.fchk` 已存在时直接使用；否则对 `<job>.chk` 调用
/// 转换命令。直接给出 .fchk 路径也可以。
fn ensure_fchk(job: &Path, formchk_cmd: &str) -> Result<PathBuf> {
    if job.extension().and_then(|e| e.to_str()) == Some("fchk") {
        if job.exists() {
            return Ok(job.to_path_buf());
        }
        return Err(QcflowError::FileNotFound {
            path: job.display().to_string(),
        });
    }

    let fchk = job.with_extension("fchk");
    if fchk.exists() {
        return Ok(fchk);
    }

    let chk = job.with_extension("chk");
    if !chk.exists() {
        return Err(QcflowError::FileNotFound {
            path: fchk.display().to_string(),
        });
    }

    output::print_info(&format!(
        "Converting '{}' with {}...",
        chk.display(),
        formchk_cmd
    ));

    let converted = Command::new(formchk_cmd)
        .arg(&chk)
        .output()
        .map_err(|_| QcflowError::CommandNotFound {
            command: formchk_cmd.to_string(),
        })?;

    if !converted.status.success() {
        return Err(QcflowError::CommandFailed {
            command: format!("{} {}", formchk_cmd, chk.display()),
            stderr: String::from_utf8_lossy(&converted.stderr).to_string(),
        });
    }

    if fchk.exists() {
        Ok(fchk)
    } else {
        Err(QcflowError::FileNotFound {
            path: fchk.display().to_string(),
        })
    }
}

/// 写出稠密矩阵，每行一个矩阵行
fn write_matrix(matrix: &DMatrix<f64>, path: &Path) -> Result<()> {
    let mut file = fs::File::create(path).map_err(|e| QcflowError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })?;

    for i in 0..matrix.nrows() {
        let row: Vec<String> = (0..matrix.ncols())
            .map(|j| format!("{:16.8E}", matrix[(i, j)]))
            .collect();
        writeln!(file, "{}", row.join(" ")).map_err(|e| QcflowError::FileWriteError {
            path: path.display().to_string(),
            source: e,
        })?;
    }

    Ok(())
}

/// 打印简正模式波数
fn print_wavenumbers(content: &str, atom_count: usize, matrix: &DMatrix<f64>) -> Result<()> {
    let numbers = fchk::parse_atomic_numbers(content, atom_count)?;
    let elements = numbers
        .iter()
        .map(|z| {
            atomic_number_to_symbol(*z).ok_or_else(|| {
                QcflowError::InvalidArgument(format!("unknown atomic number {}", z))
            })
        })
        .collect::<Result<Vec<_>>>()?;
    let masses = normal_modes::masses_for_elements(&elements)?;

    let nu = normal_modes::wavenumbers(matrix, &masses)?;

    output::print_header("Normal Mode Wavenumbers (cm⁻¹)");
    for chunk in nu.chunks(6) {
        let row: Vec<String> = chunk.iter().map(|v| format!("{:>10.2}", v)).collect();
        println!("  {}", row.join(" "));
    }

    let n_imag = nu.iter().filter(|v| **v < -1.0).count();
    output::print_kv("Imaginary modes", &n_imag.to_string());

    Ok(())
}
