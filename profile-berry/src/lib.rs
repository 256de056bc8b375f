#![warn(missing_docs)] // <= 合适时移除它.

//! 核心库. 对细胞核轮廓导出的环形 profile 做分段, 对齐, 以及数据集级的一致性校验.
//!
//! 该 crate 只提供 `safe` 接口.
//!
//! # 注意
//!
//! 1. 输入是已经追踪好的有序轮廓点. 图像读取与轮廓追踪不属于本 crate.
//! 2. 参数错误 (例如窗口半径为 0) 会直接 panic; 数据本身的问题一律以 `Result` 返回,
//!   单个细胞核的失败不会中断整个数据集的处理.
//!
//! # 开发计划
//!
//! ### 环形 profile 与分段数据模型 ✅
//!
//! `Profile`, `Segment`, `SegmentedProfile`, 群体聚合 `ProfileCollection`.
//!
//! 实现位于 `profile-berry/src/data`.
//!
//! ### 声明式标志点规则 ✅
//!
//! 规则按 profile 长度的比例描述下标, 同一份定义适用于任意长度的实例.
//!
//! 实现位于 `profile-berry/src/rules`.
//!
//! ### 模板分段与逐实例拟合 ✅
//!
//! 1. 在群体代表 profile 上检测断点生成模板; ✅
//! 2. 按比例缩放的拟合器; ✅
//! 3. 局部搜索的迭代拟合器. ✅
//!
//! 实现位于 `profile-berry/src/fitting`.
//!
//! ### 群体代表 profile 与 franken-profile 标志点传递 ✅
//!
//! 实现位于 `profile-berry/src/align`.
//!
//! ### 数据集流程 ✅
//!
//! profile 计算, 参考点强制对齐, NEW/REFINE 两种分段模式 (可取消, 容忍部分失败, 并行),
//! 以及一致性校验.
//!
//! 实现位于 `profile-berry/src/dataset`.
//!
//! ### 拟合策略消融实验 ✅
//!
//! 实现位于 `ablations/segfit`.

/// 二维平面点 `(x, y)`.
pub type Point2d = (f64, f64);

pub mod consts;

pub mod data;

pub mod rules;

pub mod fitting;

pub mod align;

pub mod dataset;

pub mod prelude;
