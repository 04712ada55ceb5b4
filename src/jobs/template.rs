//! # 输入文件模板渲染
//!
//! 以 `{key}` 占位符渲染 QChem/Gaussian 输入文件，`{{` 与 `}}`
//! 转义为字面花括号。内置各任务类型的输入模板。
//!
//! ## 依赖关系
//! - 被 `commands/submit.rs`, `commands/run.rs` 使用
//! - 使用 `models/molecule.rs`, `models/result.rs`

use crate::error::{QcflowError, Result};
use crate::models::{Molecule, QcProgram};
use clap::ValueEnum;
use std::collections::HashMap;

/// 作业任务类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum JobTask {
    /// 几何优化
    Opt,
    /// 频率计算
    Freq,
    /// 内禀反应坐标
    Irc,
    /// 单点能
    Sp,
}

impl JobTask {
    fn qchem_jobtype(&self) -> &'static str {
        match self {
            JobTask::Opt => "opt",
            JobTask::Freq => "freq",
            JobTask::Irc => "rpath",
            JobTask::Sp => "sp",
        }
    }

    fn gaussian_route(&self) -> &'static str {
        match self {
            JobTask::Opt => "opt=(calcfc,maxcycles=100)",
            JobTask::Freq => "freq",
            JobTask::Irc => "irc=(calcfc,maxpoints=30,stepsize=10)",
            JobTask::Sp => "",
        }
    }
}

/// 作业参数
#[derive(Debug, Clone)]
pub struct JobSpec {
    /// 作业标签，决定输入/输出文件名
    pub label: String,
    /// 方法 (如 B3LYP, wB97X-D)
    pub method: String,
    /// 基组 (如 6-31G*, cc-pVDZ)
    pub basis: String,
    /// 电荷
    pub charge: i32,
    /// 自旋多重度
    pub multiplicity: u32,
    /// 并行核数
    pub nprocs: u32,
    /// 内存限额 (如 "4GB")
    pub mem: String,
}

/// 渲染 `{key}` 占位符模板
///
/// `{{` 和 `}}` 为字面花括号。未提供的键和不成对的花括号
/// 是错误。
pub fn render(template: &str, vars: &HashMap<&str, String>) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' => {
                if chars.peek() == Some(&'{') {
                    chars.next();
                    out.push('{');
                    continue;
                }
                let mut key = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(k) => key.push(k),
                        None => {
                            return Err(QcflowError::InvalidArgument(
                                "unclosed '{' in template".to_string(),
                            ))
                        }
                    }
                }
                let value = vars.get(key.as_str()).ok_or_else(|| {
                    QcflowError::InvalidArgument(format!("unknown template key '{}'", key))
                })?;
                out.push_str(value);
            }
            '}' => {
                if chars.peek() == Some(&'}') {
                    chars.next();
                    out.push('}');
                } else {
                    return Err(QcflowError::InvalidArgument(
                        "unmatched '}' in template".to_string(),
                    ));
                }
            }
            other => out.push(other),
        }
    }

    Ok(out)
}

/// QChem 输入模板
const QCHEM_INPUT_TEMPLATE: &str = r#"$molecule
{charge} {multiplicity}
{geometry}$end

$rem
   JOBTYPE       {jobtype}
   METHOD        {method}
   BASIS         {basis}
   MEM_TOTAL     {mem_mb}
$end
"#;

/// Gaussian 输入模板
const GAUSSIAN_INPUT_TEMPLATE: &str = r#"%nprocshared={nprocs}
%mem={mem}
%chk={label}.chk
#p {method}/{basis} {route}

{label}

{charge} {multiplicity}
{geometry}
"#;

/// 几何块：每行 `元素 x y z`
fn geometry_block(mol: &Molecule) -> String {
    let mut out = String::new();
    for atom in &mol.atoms {
        out.push_str(&format!(
            "{:<3} {:>14.8} {:>14.8} {:>14.8}\n",
            atom.element, atom.position[0], atom.position[1], atom.position[2]
        ));
    }
    out
}

/// 渲染程序输入文件
pub fn render_input(
    program: QcProgram,
    task: JobTask,
    spec: &JobSpec,
    mol: &Molecule,
) -> Result<String> {
    let mut vars: HashMap<&str, String> = HashMap::new();
    vars.insert("label", spec.label.clone());
    vars.insert("method", spec.method.clone());
    vars.insert("basis", spec.basis.clone());
    vars.insert("charge", spec.charge.to_string());
    vars.insert("multiplicity", spec.multiplicity.to_string());
    vars.insert("nprocs", spec.nprocs.to_string());
    vars.insert("mem", spec.mem.clone());
    vars.insert("geometry", geometry_block(mol));

    match program {
        QcProgram::Qchem => {
            vars.insert("jobtype", task.qchem_jobtype().to_string());
            vars.insert("mem_mb", mem_to_mb(&spec.mem)?.to_string());
            render(QCHEM_INPUT_TEMPLATE, &vars)
        }
        QcProgram::Gaussian => {
            vars.insert("route", task.gaussian_route().to_string());
            render(GAUSSIAN_INPUT_TEMPLATE, &vars)
        }
    }
}

/// 输入文件扩展名
pub fn input_extension(program: QcProgram) -> &'static str {
    match program {
        QcProgram::Qchem => "in",
        QcProgram::Gaussian => "com",
    }
}

/// 输出文件扩展名
pub fn output_extension(program: QcProgram) -> &'static str {
    match program {
        QcProgram::Qchem => "out",
        QcProgram::Gaussian => "log",
    }
}

/// "4GB"/"512MB" 风格的内存限额换算为 MB
fn mem_to_mb(mem: &str) -> Result<u64> {
    let upper = mem.trim().to_uppercase();
    let (digits, factor) = if let Some(d) = upper.strip_suffix("GB") {
        (d.to_string(), 1024u64)
    } else if let Some(d) = upper.strip_suffix("MB") {
        (d.to_string(), 1u64)
    } else {
        (upper.clone(), 1u64)
    };

    digits
        .trim()
        .parse::<u64>()
        .map(|v| v * factor)
        .map_err(|_| QcflowError::InvalidArgument(format!("cannot parse memory limit '{}'", mem)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Atom;

    fn co() -> Molecule {
        Molecule::new(vec![
            Atom::new("C", [0.0, 0.0, 0.0]),
            Atom::new("O", [1.21, 0.0, 0.0]),
        ])
    }

    fn spec() -> JobSpec {
        JobSpec {
            label: "co_opt".to_string(),
            method: "B3LYP".to_string(),
            basis: "6-31G*".to_string(),
            charge: 0,
            multiplicity: 1,
            nprocs: 4,
            mem: "4GB".to_string(),
        }
    }

    #[test]
    fn test_render_basic() {
        let mut vars = HashMap::new();
        vars.insert("name", "co_opt".to_string());
        let out = render("job {name} done", &vars).unwrap();
        assert_eq!(out, "job co_opt done");
    }

    #[test]
    fn test_render_escapes() {
        let vars = HashMap::new();
        let out = render("literal {{braces}}", &vars).unwrap();
        assert_eq!(out, "literal {braces}");
    }

    #[test]
    fn test_render_unknown_key() {
        let vars = HashMap::new();
        assert!(render("{missing}", &vars).is_err());
    }

    #[test]
    fn test_render_unclosed_brace() {
        let vars = HashMap::new();
        assert!(render("{oops", &vars).is_err());
        assert!(render("oops}", &vars).is_err());
    }

    #[test]
    fn test_render_qchem_input() {
        let input = render_input(QcProgram::Qchem, JobTask::Opt, &spec(), &co()).unwrap();
        assert!(input.contains("$molecule"));
        assert!(input.contains("0 1"));
        assert!(input.contains("JOBTYPE       opt"));
        assert!(input.contains("BASIS         6-31G*"));
        assert!(input.contains("MEM_TOTAL     4096"));
        assert!(input.contains("C  "));
        assert!(input.contains("O  "));
    }

    #[test]
    fn test_render_gaussian_input() {
        let input = render_input(QcProgram::Gaussian, JobTask::Irc, &spec(), &co()).unwrap();
        assert!(input.starts_with("%nprocshared=4"));
        assert!(input.contains("%chk=co_opt.chk"));
        assert!(input.contains("#p B3LYP/6-31G* irc=(calcfc,maxpoints=30,stepsize=10)"));
        assert!(input.contains("\n0 1\n"));
    }

    #[test]
    fn test_mem_to_mb() {
        assert_eq!(mem_to_mb("4GB").unwrap(), 4096);
        assert_eq!(mem_to_mb("512MB").unwrap(), 512);
        assert_eq!(mem_to_mb("800").unwrap(), 800);
        assert!(mem_to_mb("lots").is_err());
    }
}
