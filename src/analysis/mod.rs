//! # 分析模块
//!
//! 几何约束转换与简正模式分析。
//!
//! ## 依赖关系
//! - 被 `commands/` 模块使用
//! - 使用 `models/molecule.rs`
//! - 子模块: constraints, normal_modes

pub mod constraints;
pub mod normal_modes;

pub use constraints::{Change, ConstraintSet};
