//! # run 命令实现
//!
//! 本地执行一个量子化学作业并在不收敛时重试。每次重试从上次
//! 输出中解析到的最终几何继续。结束后结果写入数据库，日志
//! 末尾追加 done 标记。
//!
//! ## 依赖关系
//! - 使用 `cli/run.rs` 定义的参数
//! - 使用 `jobs/template.rs`, `jobs/retry.rs`
//! - 使用 `parsers/`, `db/`
//! - 使用 `utils/output.rs`, `utils/progress.rs`

use crate::cli::run::RunArgs;
use crate::db::{JobRecord, ResultsDb};
use crate::error::{QcflowError, Result};
use crate::jobs::retry::{run_with_retry, AttemptRunner, RetryOutcome, RetryPolicy};
use crate::jobs::template::{input_extension, output_extension, render_input, JobSpec, JobTask};
use crate::models::{JobStatus, Molecule, QcProgram, QcResult};
use crate::parsers::{gaussian, qchem};
use crate::utils::{output, progress};

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// 执行 run 命令
pub fn execute(args: RunArgs) -> Result<()> {
    output::print_header("Local Job Execution");

    let label = match &args.label {
        Some(l) => l.clone(),
        None => args
            .xyz
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("job")
            .to_string(),
    };

    let mol = Molecule::from_xyz_file(&args.xyz)?.with_charge_mult(args.charge, args.mult);

    fs::create_dir_all(&args.workdir).map_err(|e| QcflowError::FileWriteError {
        path: args.workdir.display().to_string(),
        source: e,
    })?;

    let command = args.command.clone().unwrap_or_else(|| {
        match args.program {
            QcProgram::Qchem => "qchem",
            QcProgram::Gaussian => "g16",
        }
        .to_string()
    });

    let spec = JobSpec {
        label: label.clone(),
        method: args.method.clone(),
        basis: args.basis.clone(),
        charge: args.charge,
        multiplicity: args.mult,
        nprocs: args.nprocs,
        mem: args.mem.clone(),
    };

    let dummy_positions = args
        .dummy
        .iter()
        .map(|spec| parse_position(spec))
        .collect::<Result<Vec<_>>>()?;

    let mut runner = LocalJobRunner {
        program: args.program,
        task: args.task,
        spec,
        workdir: args.workdir.clone(),
        command,
        mol,
        dummy_positions,
        last_logfile: None,
    };

    let policy = RetryPolicy {
        max_attempts: args.max_attempts,
        accept_forces_only: !args.strict,
    };

    output::print_info(&format!(
        "Running '{}' with {} (max {} attempts)...",
        label, args.program, policy.max_attempts
    ));

    let mut db = ResultsDb::open(&args.db)?;
    if let Some(existing) = db.get(&label) {
        output::print_info(&format!(
            "Previous record for '{}' ({}) will be overwritten",
            label, existing.status
        ));
    }

    let outcome = run_with_retry(&mut runner, &policy);

    // 作业结束标记，下游轮询据此判断完成
    if let Some(ref logfile) = runner.last_logfile {
        append_done_marker(logfile);
    }
    let record = match &outcome {
        RetryOutcome::Converged { attempts, result } => {
            output::print_success(&format!(
                "'{}' converged ({}) after {} attempt(s), E = {}",
                label,
                result.convergence,
                attempts,
                result
                    .energy
                    .map(|e| format!("{:.8}", e))
                    .unwrap_or_else(|| "n/a".to_string())
            ));
            JobRecord::new(&label, JobStatus::Normal)
                .with_energy(result.energy)
                .with_attempts(*attempts)
        }
        RetryOutcome::GaveUp {
            attempts,
            last: Some(result),
            ..
        } => {
            // 未收敛但有可用的最终几何与能量，按可继续状态记录
            output::print_warning(&format!(
                "'{}' did not converge after {} attempts; keeping last geometry",
                label, attempts
            ));
            JobRecord::new(&label, JobStatus::Normal)
                .with_energy(result.energy)
                .with_attempts(*attempts)
        }
        RetryOutcome::GaveUp {
            attempts,
            last: None,
            last_error,
        } => {
            output::print_error(&format!(
                "'{}' failed after {} attempts: {}",
                label,
                attempts,
                last_error.as_deref().unwrap_or("no parsable output")
            ));
            JobRecord::new(&label, JobStatus::Error).with_attempts(*attempts)
        }
    };
    db.upsert(record);
    db.save()?;

    output::print_done(&format!("Result recorded in '{}'", args.db.display()));
    Ok(())
}

/// 本地作业执行器
///
/// 每次尝试渲染新的输入文件并调用外部程序；上次输出中解析到
/// 最终几何时以其为下次尝试的起点。
struct LocalJobRunner {
    program: QcProgram,
    task: JobTask,
    spec: JobSpec,
    workdir: PathBuf,
    command: String,
    mol: Molecule,
    dummy_positions: Vec<[f64; 3]>,
    last_logfile: Option<PathBuf>,
}

impl AttemptRunner for LocalJobRunner {
    fn attempt(&mut self, attempt: u32) -> Result<QcResult> {
        let label = if attempt == 1 {
            self.spec.label.clone()
        } else {
            format!("{}_try{}", self.spec.label, attempt)
        };

        let mut spec = self.spec.clone();
        spec.label = label.clone();

        let input_path = self
            .workdir
            .join(format!("{}.{}", label, input_extension(self.program)));
        let output_path = self
            .workdir
            .join(format!("{}.{}", label, output_extension(self.program)));

        let input_content = render_input(self.program, self.task, &spec, &self.mol)?;
        fs::write(&input_path, input_content).map_err(|e| QcflowError::FileWriteError {
            path: input_path.display().to_string(),
            source: e,
        })?;

        let spinner = progress::create_spinner(&format!("attempt {} ({})", attempt, label));
        let run_result = self.launch(&input_path, &output_path);
        spinner.finish_and_clear();
        run_result?;

        self.last_logfile = Some(output_path.clone());

        let content =
            fs::read_to_string(&output_path).map_err(|e| QcflowError::FileReadError {
                path: output_path.display().to_string(),
                source: e,
            })?;

        let result = match self.program {
            QcProgram::Qchem => qchem::parse_output_content(&content, &label)?,
            QcProgram::Gaussian => gaussian::parse_output_content(&content, &label)?,
        };

        // 续算起点：输出里最后打印的几何
        let continued = match self.program {
            QcProgram::Qchem => qchem::parse_final_geometry(&content)?,
            QcProgram::Gaussian => gaussian::parse_final_geometry(&content)?,
        };
        if let Some(mol) = continued {
            let mut mol = mol.with_charge_mult(self.spec.charge, self.spec.multiplicity);
            // 程序不回写占位原子，重新施加其固定位置
            qchem::apply_dummy_positions(&mut mol, &self.dummy_positions);
            self.mol = mol;
        }

        Ok(result)
    }
}

impl LocalJobRunner {
    /// 调用外部量子化学程序
    fn launch(&self, input: &Path, output: &Path) -> Result<()> {
        let status = match self.program {
            QcProgram::Qchem => Command::new(&self.command)
                .arg("-nt")
                .arg(self.spec.nprocs.to_string())
                .arg(input)
                .arg(output)
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status(),
            QcProgram::Gaussian => {
                let stdin = fs::File::open(input).map_err(|e| QcflowError::FileReadError {
                    path: input.display().to_string(),
                    source: e,
                })?;
                let stdout =
                    fs::File::create(output).map_err(|e| QcflowError::FileWriteError {
                        path: output.display().to_string(),
                        source: e,
                    })?;
                Command::new(&self.command)
                    .stdin(stdin)
                    .stdout(stdout)
                    .stderr(Stdio::null())
                    .status()
            }
        }
        .map_err(|_| QcflowError::CommandNotFound {
            command: self.command.clone(),
        })?;

        // 量子化学程序失败时也常留下可解析的部分输出，
        // 不在这里中断，交给解析与重试逻辑
        if !status.success() {
            output::print_warning(&format!(
                "{} exited with status {}",
                self.command, status
            ));
        }

        Ok(())
    }
}

/// 解析 'x,y,z' 坐标规格
fn parse_position(spec: &str) -> Result<[f64; 3]> {
    let fields: Vec<&str> = spec.split(',').map(|s| s.trim()).collect();
    if fields.len() != 3 {
        return Err(QcflowError::InvalidArgument(format!(
            "position spec '{}' must be 'x,y,z'",
            spec
        )));
    }
    let mut pos = [0.0f64; 3];
    for (k, field) in fields.iter().enumerate() {
        pos[k] = field.parse().map_err(|_| {
            QcflowError::InvalidArgument(format!("bad coordinate '{}' in '{}'", field, spec))
        })?;
    }
    Ok(pos)
}

/// 追加 done 标记，失败不致命
fn append_done_marker(logfile: &Path) {
    if let Ok(mut f) = OpenOptions::new().append(true).open(logfile) {
        f.write_all(b"done\n").ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_position() {
        assert_eq!(parse_position("1.0, -2.5, 0.0").unwrap(), [1.0, -2.5, 0.0]);
        assert!(parse_position("1.0,2.0").is_err());
        assert!(parse_position("a,b,c").is_err());
    }
}
