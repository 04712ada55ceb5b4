//! # 数据模型模块
//!
//! 定义统一的分子结构和计算结果数据模型。
//!
//! ## 依赖关系
//! - 被 `parsers/` 和 `commands/` 使用
//! - 子模块: molecule, result

pub mod molecule;
pub mod result;

pub use molecule::{Atom, Molecule};
pub use result::{Convergence, JobStatus, QcProgram, QcResult};
