//! # collect 命令实现
//!
//! 扫描作业目录，解析输出状态与能量，写入结果数据库。
//! 成功收集的日志末尾追加 done 标记，下游轮询据此跳过。
//!
//! ## 功能
//! - 扫描每个作业子目录中的输出文件
//! - 解析正常结束/收敛状态与能量
//! - 记录 label/status/energy 到 CSV 结果数据库
//!
//! ## 依赖关系
//! - 使用 `cli/collect.rs` 定义的参数
//! - 使用 `parsers/`, `db/`
//! - 使用 `utils/output.rs`, `utils/progress.rs`

use crate::cli::collect::CollectArgs;
use crate::db::{JobRecord, ResultsDb};
use crate::error::{QcflowError, Result};
use crate::models::JobStatus;
use crate::parsers;
use crate::utils::{output, progress};

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// 执行 collect 命令
pub fn execute(args: CollectArgs) -> Result<()> {
    output::print_header("Collecting Job Results");

    if !args.jobs_dir.exists() {
        return Err(QcflowError::DirectoryNotFound {
            path: args.jobs_dir.display().to_string(),
        });
    }

    let entries: Vec<_> = fs::read_dir(&args.jobs_dir)
        .map_err(|e| QcflowError::FileReadError {
            path: args.jobs_dir.display().to_string(),
            source: e,
        })?
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_dir())
        .collect();

    output::print_info(&format!("Scanning {} job directories...", entries.len()));

    let mut db = ResultsDb::open(&args.db)?;
    let pb = progress::create_progress_bar(entries.len() as u64, "Collecting");

    let mut collected = 0usize;
    let mut errors = 0usize;

    for entry in &entries {
        let label = entry.file_name().to_string_lossy().to_string();
        let job_dir = entry.path();

        if let Some(logfile) = find_output_file(&job_dir, &label) {
            match parsers::parse_output_file(&logfile, &label, args.program) {
                Ok(result) => {
                    let status = if result.is_finished {
                        JobStatus::Normal
                    } else {
                        JobStatus::Error
                    };
                    if status == JobStatus::Normal {
                        collected += 1;
                        if !args.no_done {
                            append_done_marker(&logfile);
                        }
                    } else {
                        errors += 1;
                    }
                    db.upsert(JobRecord::new(&label, status).with_energy(result.energy));
                }
                Err(e) => {
                    errors += 1;
                    pb.suspend(|| {
                        output::print_warning(&format!("Failed to parse {}: {}", label, e));
                    });
                    db.upsert(JobRecord::new(&label, JobStatus::Error));
                }
            }
        }

        pb.inc(1);
    }

    pb.finish_and_clear();
    db.save()?;

    output::print_done(&format!(
        "Recorded {} normal and {} error jobs into '{}' ({} records total)",
        collected,
        errors,
        args.db.display(),
        db.len()
    ));

    Ok(())
}

/// 在作业目录中查找输出文件
///
/// 优先 `<label>.out` / `<label>.log`，否则取目录中第一个
/// 匹配扩展名的文件。
fn find_output_file(job_dir: &Path, label: &str) -> Option<PathBuf> {
    for ext in ["out", "log"] {
        let candidate = job_dir.join(format!("{}.{}", label, ext));
        if candidate.exists() {
            return Some(candidate);
        }
    }

    fs::read_dir(job_dir)
        .ok()?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .find(|p| {
            matches!(
                p.extension().and_then(|e| e.to_str()),
                Some("out") | Some("log")
            )
        })
}

/// 追加 done 标记，失败不致命
fn append_done_marker(logfile: &Path) {
    if let Ok(content) = fs::read_to_string(logfile) {
        if content.lines().last() == Some("done") {
            return;
        }
    }
    if let Ok(mut f) = OpenOptions::new().append(true).open(logfile) {
        f.write_all(b"done\n").ok();
    }
}
