//! # Slurm 脚本生成工具
//!
//! 生成量子化学作业的 sbatch 提交脚本。
//!
//! ## 依赖关系
//! - 被 `commands/submit.rs` 使用
//! - 使用 `models/result.rs` 选择执行命令

use crate::models::QcProgram;
use std::path::Path;

/// Slurm 作业配置
pub struct SlurmConfig {
    pub job_name: String,
    pub partition: String,
    pub ntasks: u32,
    pub mem: String,
    pub time_limit: String,
    pub modules: Vec<String>,
    pub scratch_root: String,
}

impl Default for SlurmConfig {
    fn default() -> Self {
        SlurmConfig {
            job_name: "qc_job".to_string(),
            partition: "normal".to_string(),
            ntasks: 8,
            mem: "16G".to_string(),
            time_limit: "48:00:00".to_string(),
            modules: vec![],
            scratch_root: "/scratch".to_string(),
        }
    }
}

/// 量子化学程序的默认执行命令
pub fn default_exec_command(program: QcProgram, input: &str, output: &str, ntasks: u32) -> String {
    match program {
        QcProgram::Qchem => format!("qchem -nt {} {} {}", ntasks, input, output),
        QcProgram::Gaussian => format!("g16 < {} > {}", input, output),
    }
}

/// 生成 sbatch 脚本内容
pub fn generate_sbatch_script(
    config: &SlurmConfig,
    program: QcProgram,
    workdir: &Path,
    exec_cmd: &str,
) -> String {
    let module_loads = config
        .modules
        .iter()
        .map(|m| format!("module load {}", m))
        .collect::<Vec<_>>()
        .join("\n");

    // QChem 与 Gaussian 各自的 scratch 环境变量
    let scratch_export = match program {
        QcProgram::Qchem => format!(
            "export QCSCRATCH=\"{}/$SLURM_JOBID\"\nmkdir -p \"$QCSCRATCH\"",
            config.scratch_root
        ),
        QcProgram::Gaussian => format!(
            "export GAUSS_SCRDIR=\"{}/$SLURM_JOBID\"\nmkdir -p \"$GAUSS_SCRDIR\"",
            config.scratch_root
        ),
    };

    format!(
        r#"#!/bin/bash
#SBATCH --partition {}
#SBATCH --ntasks {}
#SBATCH --mem {}
#SBATCH --time {}
#SBATCH -J {}
#SBATCH -o slurm_logs/%x.out
#SBATCH -e slurm_logs/%x.err

set -euo pipefail

module purge 2>&1
{}

{}

cd "{}"
echo "PWD=$(pwd)"
echo "Running: {}"
{}
"#,
        config.partition,
        config.ntasks,
        config.mem,
        config.time_limit,
        config.job_name,
        module_loads,
        scratch_export,
        workdir.display(),
        exec_cmd,
        exec_cmd,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_generate_sbatch_script() {
        let config = SlurmConfig {
            job_name: "ts1".to_string(),
            modules: vec!["qchem/6.1".to_string()],
            ..Default::default()
        };
        let cmd = default_exec_command(QcProgram::Qchem, "ts1.in", "ts1.out", 8);
        let script =
            generate_sbatch_script(&config, QcProgram::Qchem, &PathBuf::from("/work/ts1"), &cmd);

        assert!(script.starts_with("#!/bin/bash"));
        assert!(script.contains("#SBATCH -J ts1"));
        assert!(script.contains("module load qchem/6.1"));
        assert!(script.contains("export QCSCRATCH"));
        assert!(script.contains("qchem -nt 8 ts1.in ts1.out"));
    }

    #[test]
    fn test_gaussian_scratch_env() {
        let config = SlurmConfig::default();
        let cmd = default_exec_command(QcProgram::Gaussian, "a.com", "a.log", 8);
        let script =
            generate_sbatch_script(&config, QcProgram::Gaussian, &PathBuf::from("/w"), &cmd);
        assert!(script.contains("GAUSS_SCRDIR"));
        assert!(script.contains("g16 < a.com > a.log"));
    }
}
