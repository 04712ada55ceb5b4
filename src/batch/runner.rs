//! # 批量执行器
//!
//! 并行解析输出文件并汇总结果。
//!
//! ## 功能
//! - 基于 rayon 的并行迭代
//! - 进度条显示
//! - 解析结果与失败信息汇总
//!
//! ## 依赖关系
//! - 被 `commands/extract.rs` 调用
//! - 使用 `utils/progress.rs` 创建进度条
//! - 使用 `rayon` 进行并行解析

use crate::models::QcResult;
use crate::utils::progress;

use rayon::prelude::*;
use std::path::PathBuf;

/// 单个文件处理结果
#[derive(Debug, Clone)]
pub enum ProcessResult {
    /// 解析成功
    Parsed(Box<QcResult>),
    /// 跳过（如无法识别的程序）
    Skipped(String),
    /// 解析失败
    Failed(String, String), // (文件路径, 错误信息)
}

/// 批量解析汇总
#[derive(Debug, Default)]
pub struct BatchSummary {
    /// 成功解析的结果
    pub results: Vec<QcResult>,
    /// 跳过的文件
    pub skipped: Vec<String>,
    /// 失败详情
    pub failures: Vec<(String, String)>,
}

impl BatchSummary {
    fn merge(&mut self, result: ProcessResult) {
        match result {
            ProcessResult::Parsed(r) => self.results.push(*r),
            ProcessResult::Skipped(path) => self.skipped.push(path),
            ProcessResult::Failed(path, err) => self.failures.push((path, err)),
        }
    }

    /// 总处理数量
    pub fn total(&self) -> usize {
        self.results.len() + self.skipped.len() + self.failures.len()
    }
}

/// 批量执行器
pub struct BatchRunner {
    /// 并行作业数
    jobs: usize,
}

impl BatchRunner {
    /// 创建新的批量执行器，0 表示使用全部核
    pub fn new(jobs: usize) -> Self {
        let jobs = if jobs == 0 { num_cpus::get() } else { jobs };
        Self { jobs }
    }

    /// 并行处理文件列表
    pub fn run<F>(&self, files: Vec<PathBuf>, processor: F) -> BatchSummary
    where
        F: Fn(&PathBuf) -> ProcessResult + Sync + Send,
    {
        let pb = progress::create_progress_bar(files.len() as u64, "Parsing");

        let pool = match rayon::ThreadPoolBuilder::new().num_threads(self.jobs).build() {
            Ok(pool) => pool,
            Err(_) => {
                // 线程池创建失败时退化为串行
                let mut summary = BatchSummary::default();
                for file in &files {
                    summary.merge(processor(file));
                    pb.inc(1);
                }
                pb.finish_and_clear();
                return summary;
            }
        };

        let results: Vec<ProcessResult> = pool.install(|| {
            files
                .par_iter()
                .map(|file| {
                    let result = processor(file);
                    pb.inc(1);
                    result
                })
                .collect()
        });

        pb.finish_and_clear();

        let mut summary = BatchSummary::default();
        for result in results {
            summary.merge(result);
        }
        summary
    }
}
