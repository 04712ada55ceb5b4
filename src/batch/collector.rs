//! # 文件收集器
//!
//! 根据输入路径和模式收集待解析的输出文件列表。
//!
//! ## 依赖关系
//! - 被 `commands/extract.rs` 调用
//! - 使用 `walkdir` 遍历目录，`glob` 做模式匹配

use crate::error::{QcflowError, Result};
use glob::Pattern;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 文件收集器
pub struct FileCollector {
    /// 输入路径（单文件或目录）
    input: PathBuf,
    /// 匹配模式列表
    patterns: Vec<Pattern>,
    /// 是否递归
    recursive: bool,
}

impl FileCollector {
    /// 创建收集器，默认匹配 QChem/Gaussian 输出扩展名
    pub fn new(input: PathBuf) -> Result<Self> {
        Self::with_pattern(input, "*.out,*.log")
    }

    /// 以逗号分隔的多模式创建收集器
    pub fn with_pattern(input: PathBuf, pattern: &str) -> Result<Self> {
        let patterns = pattern
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| {
                Pattern::new(s).map_err(|e| {
                    QcflowError::InvalidArgument(format!("bad glob pattern '{}': {}", s, e))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        if patterns.is_empty() {
            return Err(QcflowError::InvalidArgument(
                "empty file pattern".to_string(),
            ));
        }

        Ok(Self {
            input,
            patterns,
            recursive: false,
        })
    }

    /// 设置是否递归搜索
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// 收集所有匹配的文件，按路径排序
    pub fn collect(&self) -> Vec<PathBuf> {
        if self.input.is_file() {
            return vec![self.input.clone()];
        }

        if !self.input.is_dir() {
            return vec![];
        }

        let max_depth = if self.recursive { usize::MAX } else { 2 };

        let mut files: Vec<PathBuf> = WalkDir::new(&self.input)
            .max_depth(max_depth)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| self.matches(e.path()))
            .map(|e| e.path().to_path_buf())
            .collect();

        files.sort();
        files
    }

    fn matches(&self, path: &Path) -> bool {
        let filename = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name,
            None => return false,
        };
        self.patterns.iter().any(|p| p.matches(filename))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_matching() {
        let collector =
            FileCollector::with_pattern(PathBuf::from("."), "*.out, *.log").unwrap();
        assert!(collector.matches(Path::new("jobs/ts1.out")));
        assert!(collector.matches(Path::new("jobs/ts1.log")));
        assert!(!collector.matches(Path::new("jobs/ts1.fchk")));
    }

    #[test]
    fn test_bad_pattern_is_error() {
        assert!(FileCollector::with_pattern(PathBuf::from("."), "[").is_err());
        assert!(FileCollector::with_pattern(PathBuf::from("."), " , ").is_err());
    }

    #[test]
    fn test_collect_missing_dir_is_empty() {
        let collector = FileCollector::new(PathBuf::from("/nonexistent/qcflow")).unwrap();
        assert!(collector.collect().is_empty());
    }
}
