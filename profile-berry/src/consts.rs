//! 通用常量.

/// 任意分段允许的最短长度 (以 profile 下标计).
///
/// 全圆默认分段不受该限制: 当 profile 本身短于该值时, 唯一的默认分段仍然合法.
pub const MINIMUM_SEGMENT_LENGTH: usize = 10;

/// 可被分析的最短 profile 长度. 边缘点少于该值的细胞核不会生成 profile.
pub const MINIMUM_PROFILE_LENGTH: usize = 3;

/// 参考点强制对齐到中位 profile 时, 最多尝试的轮数.
pub const MAX_COERCION_ATTEMPTS: usize = 50;

/// 浮点比较容差.
pub const EPSILON: f64 = 1e-9;

/// 分段器默认参数.
pub mod segmenter {
    /// 候选断点检测前的平滑窗口半径.
    pub const SMOOTH_WINDOW: usize = 2;

    /// 局部极值检测的窗口半径.
    pub const EXTREMA_WINDOW: usize = 5;

    /// 差分窗口半径.
    pub const DELTA_WINDOW: usize = 2;

    /// 二阶差分强度阈值, 以二阶差分 profile 值域的比例计.
    pub const MIN_RATE_OF_CHANGE: f64 = 0.02;

    /// 默认最多允许的分段个数.
    pub const MAX_SEGMENTS: usize = 8;
}

/// 拟合器默认参数.
pub mod fitter {
    /// 单个断点每轮迭代在目标 profile 上的搜索半径.
    pub const SEARCH_WINDOW: usize = 10;

    /// 迭代上限.
    pub const MAX_ITERATIONS: usize = 20;
}

/// 数据集 profile 计算的默认参数.
pub mod profiling {
    /// 角度 profile 的邻域半径, 以轮廓点数的比例计.
    pub const ANGLE_WINDOW_FRACTION: f64 = 0.05;
}
