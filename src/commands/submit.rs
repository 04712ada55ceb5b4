//! # submit 命令实现
//!
//! 由 XYZ 几何文件批量生成量子化学作业目录：渲染输入文件与
//! sbatch 脚本，可选直接提交。
//!
//! ## 功能
//! - 读取 XYZ 几何
//! - 渲染 QChem/Gaussian 输入文件
//! - 生成 sbatch 脚本
//! - 可选自动提交
//!
//! ## 依赖关系
//! - 使用 `cli/submit.rs` 定义的参数
//! - 使用 `jobs/template.rs`, `jobs/slurm.rs`
//! - 使用 `utils/output.rs`

use crate::analysis::constraints::{convert_constraints, Change, ConstraintSet};
use crate::cli::submit::SubmitArgs;
use crate::error::{QcflowError, Result};
use crate::jobs::slurm::{default_exec_command, generate_sbatch_script, SlurmConfig};
use crate::jobs::template::{input_extension, output_extension, render_input, JobSpec};
use crate::models::{Molecule, QcProgram};
use crate::utils::output;

use std::fs;
use std::path::Path;
use std::process::Command;

/// 执行 submit 命令
pub fn execute(args: SubmitArgs) -> Result<()> {
    output::print_header("Batch Job Submission");

    fs::create_dir_all(&args.jobs_root).map_err(|e| QcflowError::FileWriteError {
        path: args.jobs_root.display().to_string(),
        source: e,
    })?;

    let mut generated = 0usize;
    let mut submitted = 0usize;

    for xyz in &args.xyz {
        if !xyz.exists() {
            output::print_warning(&format!("No such geometry file: {}", xyz.display()));
            continue;
        }

        let label = xyz
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("job")
            .to_string();

        let mol = match Molecule::from_xyz_file(xyz) {
            Ok(m) => m.with_charge_mult(args.charge, args.mult),
            Err(e) => {
                output::print_warning(&format!("Skipping {}: {}", xyz.display(), e));
                continue;
            }
        };

        let spec = JobSpec {
            label: label.clone(),
            method: args.method.clone(),
            basis: args.basis.clone(),
            charge: args.charge,
            multiplicity: args.mult,
            nprocs: args.nprocs,
            mem: args.mem.clone(),
        };

        let job_dir = args.jobs_root.join(&label);
        fs::create_dir_all(&job_dir).map_err(|e| QcflowError::FileWriteError {
            path: job_dir.display().to_string(),
            source: e,
        })?;
        fs::create_dir_all(job_dir.join("slurm_logs")).ok();

        // 输入文件
        let input_name = format!("{}.{}", label, input_extension(args.program));
        let output_name = format!("{}.{}", label, output_extension(args.program));
        let mut input_content = render_input(args.program, args.task, &spec, &mol)?;

        // 约束段
        if !args.fix.is_empty() || !args.change.is_empty() {
            let constraints = build_constraints(&mol, &args.fix, &args.change)?;
            match args.program {
                QcProgram::Qchem => {
                    input_content.push('\n');
                    input_content.push_str(&qchem_constraint_block(&constraints));
                }
                QcProgram::Gaussian => {
                    output::print_warning(
                        "Constraints are only rendered for QChem inputs; ignoring for Gaussian.",
                    );
                }
            }
        }

        write_file(&job_dir.join(&input_name), &input_content)?;

        // sbatch 脚本
        let slurm = SlurmConfig {
            job_name: label.clone(),
            partition: args.partition.clone(),
            ntasks: args.nprocs,
            mem: args.mem.clone(),
            time_limit: args.time.clone(),
            modules: args
                .modules
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            scratch_root: args.scratch.clone(),
        };
        let exec_cmd =
            default_exec_command(args.program, &input_name, &output_name, args.nprocs);
        let script = generate_sbatch_script(&slurm, args.program, &job_dir, &exec_cmd);
        let sbatch_path = job_dir.join("job.sbatch");
        write_file(&sbatch_path, &script)?;

        generated += 1;
        output::print_success(&format!(
            "Generated {} job '{}' in {}",
            args.program,
            label,
            job_dir.display()
        ));

        if args.submit && !args.dry_run {
            match sbatch(&sbatch_path) {
                Ok(job_id) => {
                    submitted += 1;
                    output::print_info(&format!("Submitted '{}' as {}", label, job_id));
                }
                Err(e) => output::print_warning(&format!("Submit failed for '{}': {}", label, e)),
            }
        }
    }

    if generated == 0 {
        return Err(QcflowError::Other(
            "no job could be generated from the given geometries".to_string(),
        ));
    }

    if args.dry_run {
        output::print_info("Dry run: no jobs submitted.");
    }
    output::print_done(&format!(
        "Generated {} jobs, submitted {}",
        generated, submitted
    ));

    Ok(())
}

/// 解析 --fix/--change 规格并转换为优化器约束
fn build_constraints(mol: &Molecule, fix: &[String], change: &[String]) -> Result<ConstraintSet> {
    let fix_lists: Vec<Vec<usize>> = fix
        .iter()
        .map(|spec| parse_index_list(spec))
        .collect::<Result<_>>()?;
    let changes: Vec<Change> = change
        .iter()
        .map(|spec| parse_change_spec(spec))
        .collect::<Result<_>>()?;
    convert_constraints(mol, &fix_lists, &changes)
}

/// 解析 '1,2,3' 风格的 1 基索引列表
fn parse_index_list(spec: &str) -> Result<Vec<usize>> {
    spec.split(',')
        .map(|s| {
            s.trim()
                .parse()
                .map_err(|_| QcflowError::InvalidArgument(format!("bad atom index '{}'", s)))
        })
        .collect()
}

/// 解析 '1,2=1.54' 风格的驱动坐标规格
fn parse_change_spec(spec: &str) -> Result<Change> {
    let (atoms_part, value_part) = spec.split_once('=').ok_or_else(|| {
        QcflowError::InvalidArgument(format!("change spec '{}' is missing '=target'", spec))
    })?;
    let idx = parse_index_list(atoms_part)?;
    let value: f64 = value_part.trim().parse().map_err(|_| {
        QcflowError::InvalidArgument(format!("bad target value '{}'", value_part))
    })?;

    match idx.len() {
        2 => Ok(Change::Bond(idx[0], idx[1], value)),
        3 => Ok(Change::Angle(idx[0], idx[1], idx[2], value)),
        4 => Ok(Change::Dihedral(idx[0], idx[1], idx[2], idx[3], value)),
        n => Err(QcflowError::InvalidArgument(format!(
            "change spec must list 2, 3 or 4 atoms, got {}",
            n
        ))),
    }
}

/// 渲染 QChem $opt CONSTRAINT 段（1 基索引，角度为度）
fn qchem_constraint_block(set: &ConstraintSet) -> String {
    let mut out = String::from("$opt\nCONSTRAINT\n");
    for b in &set.bonds {
        out.push_str(&format!(
            "stre {} {} {:.6}\n",
            b.atoms[0] + 1,
            b.atoms[1] + 1,
            b.length
        ));
    }
    for a in &set.angles {
        out.push_str(&format!(
            "bend {} {} {} {:.4}\n",
            a.atoms[0] + 1,
            a.atoms[1] + 1,
            a.atoms[2] + 1,
            a.angle.to_degrees()
        ));
    }
    for d in &set.dihedrals {
        out.push_str(&format!(
            "tors {} {} {} {} {:.4}\n",
            d.atoms[0] + 1,
            d.atoms[1] + 1,
            d.atoms[2] + 1,
            d.atoms[3] + 1,
            d.angle.to_degrees()
        ));
    }
    out.push_str("ENDCONSTRAINT\n$end\n");
    out
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content).map_err(|e| QcflowError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })
}

/// 调用 sbatch 提交脚本，返回作业号
fn sbatch(script: &Path) -> Result<String> {
    let result = Command::new("sbatch")
        .arg(script)
        .current_dir(script.parent().unwrap_or(Path::new(".")))
        .output()
        .map_err(|_| QcflowError::CommandNotFound {
            command: "sbatch".to_string(),
        })?;

    if result.status.success() {
        Ok(String::from_utf8_lossy(&result.stdout).trim().to_string())
    } else {
        Err(QcflowError::CommandFailed {
            command: format!("sbatch {}", script.display()),
            stderr: String::from_utf8_lossy(&result.stderr).to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Atom;

    #[test]
    fn test_parse_change_spec() {
        assert_eq!(parse_change_spec("1,2=1.54").unwrap(), Change::Bond(1, 2, 1.54));
        assert_eq!(
            parse_change_spec("1,2,3,4=60.0").unwrap(),
            Change::Dihedral(1, 2, 3, 4, 60.0)
        );
        assert!(parse_change_spec("1,2").is_err());
        assert!(parse_change_spec("1=1.0").is_err());
        assert!(parse_change_spec("1,2=fast").is_err());
    }

    #[test]
    fn test_qchem_constraint_block() {
        let mol = Molecule::new(vec![
            Atom::new("C", [0.0, 0.0, 0.0]),
            Atom::new("O", [1.21, 0.0, 0.0]),
            Atom::new("H", [0.0, 1.0, 0.0]),
        ]);
        let set = build_constraints(
            &mol,
            &["1,2".to_string()],
            &["1,2,3=104.5".to_string()],
        )
        .unwrap();

        let block = qchem_constraint_block(&set);
        assert!(block.starts_with("$opt\nCONSTRAINT\n"));
        assert!(block.contains("stre 1 2 1.210000"));
        assert!(block.contains("bend 1 2 3 104.5000"));
        assert!(block.ends_with("ENDCONSTRAINT\n$end\n"));
    }
}
