//! # 结果数据库
//!
//! 以 CSV 文件持久化各作业的最终状态与能量，供后续流程查询。
//! 记录以标签为键，重复写入时后写的覆盖先写的。
//!
//! ## 依赖关系
//! - 被 `commands/collect.rs`, `commands/run.rs` 使用
//! - 使用 `serde` + `csv` 做持久化

use crate::error::{QcflowError, Result};
use crate::models::JobStatus;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 单条作业记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    /// 作业标签
    pub label: String,

    /// 最终状态
    pub status: JobStatus,

    /// 最终能量 (Hartree)
    pub energy: Option<f64>,

    /// 收敛前的尝试次数
    pub attempts: u32,
}

impl JobRecord {
    pub fn new(label: impl Into<String>, status: JobStatus) -> Self {
        JobRecord {
            label: label.into(),
            status,
            energy: None,
            attempts: 1,
        }
    }

    pub fn with_energy(mut self, energy: Option<f64>) -> Self {
        self.energy = energy;
        self
    }

    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }
}

/// CSV 结果数据库
#[derive(Debug)]
pub struct ResultsDb {
    path: PathBuf,
    records: Vec<JobRecord>,
}

impl ResultsDb {
    /// 打开数据库，文件存在时载入已有记录
    pub fn open(path: &Path) -> Result<Self> {
        let mut records = Vec::new();

        if path.exists() {
            let mut reader = csv::Reader::from_path(path)?;
            for row in reader.deserialize() {
                let record: JobRecord = row?;
                records.push(record);
            }
        }

        Ok(ResultsDb {
            path: path.to_path_buf(),
            records,
        })
    }

    /// 按标签查询
    pub fn get(&self, label: &str) -> Option<&JobRecord> {
        self.records.iter().find(|r| r.label == label)
    }

    /// 插入或覆盖同标签的记录
    pub fn upsert(&mut self, record: JobRecord) {
        match self.records.iter_mut().find(|r| r.label == record.label) {
            Some(existing) => *existing = record,
            None => self.records.push(record),
        }
    }

    /// 写回 CSV 文件
    pub fn save(&self) -> Result<()> {
        let mut writer = csv::Writer::from_path(&self.path).map_err(QcflowError::CsvError)?;
        for record in &self.records {
            writer.serialize(record)?;
        }
        writer.flush().map_err(|e| QcflowError::FileWriteError {
            path: self.path.display().to_string(),
            source: e,
        })?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_db_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("qcflow_db_{}_{}.csv", std::process::id(), name))
    }

    #[test]
    fn test_upsert_replaces_by_label() {
        let path = temp_db_path("upsert");
        let mut db = ResultsDb::open(&path).unwrap();

        db.upsert(JobRecord::new("ts1", JobStatus::Error));
        db.upsert(JobRecord::new("well0", JobStatus::Normal).with_energy(Some(-76.4)));
        db.upsert(
            JobRecord::new("ts1", JobStatus::Normal)
                .with_energy(Some(-113.3))
                .with_attempts(2),
        );

        assert_eq!(db.len(), 2);
        let ts1 = db.get("ts1").unwrap();
        assert_eq!(ts1.status, JobStatus::Normal);
        assert_eq!(ts1.attempts, 2);
    }

    #[test]
    fn test_save_and_reload() {
        let path = temp_db_path("reload");
        let _ = std::fs::remove_file(&path);

        {
            let mut db = ResultsDb::open(&path).unwrap();
            db.upsert(JobRecord::new("irc_f", JobStatus::Normal).with_energy(Some(-113.30665)));
            db.upsert(JobRecord::new("irc_r", JobStatus::Error));
            db.save().unwrap();
        }

        let db = ResultsDb::open(&path).unwrap();
        assert_eq!(db.len(), 2);
        let f = db.get("irc_f").unwrap();
        assert_eq!(f.status, JobStatus::Normal);
        assert!((f.energy.unwrap() - (-113.30665)).abs() < 1e-12);
        assert_eq!(db.get("irc_r").unwrap().energy, None);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_open_missing_file_is_empty() {
        let path = temp_db_path("missing");
        let _ = std::fs::remove_file(&path);
        let db = ResultsDb::open(&path).unwrap();
        assert!(db.is_empty());
    }
}
