//! 边缘标志点与 profile 类型.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 具名的边缘标志点. 每个实例上的具体下标由规则解析得到, 可随时重算.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Landmark {
    /// 参考点. 所有实例的分段都以它为下标原点.
    ReferencePoint,

    /// 朝向点.
    OrientationPoint,

    /// 竖直方向上端点.
    TopVertical,

    /// 竖直方向下端点.
    BottomVertical,

    /// 用户自定义标志点.
    Custom(String),
}

impl Landmark {
    /// 是否是参考点.
    #[inline]
    pub fn is_reference(&self) -> bool {
        matches!(self, Self::ReferencePoint)
    }
}

impl fmt::Display for Landmark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReferencePoint => write!(f, "reference point"),
            Self::OrientationPoint => write!(f, "orientation point"),
            Self::TopVertical => write!(f, "top vertical"),
            Self::BottomVertical => write!(f, "bottom vertical"),
            Self::Custom(name) => write!(f, "{name}"),
        }
    }
}

/// 由边缘导出的 profile 种类.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ProfileType {
    /// 每个边缘点处的内角 (度).
    Angle,

    /// 每个边缘点到质心的距离.
    Radius,

    /// 每个边缘点经过质心到对侧边缘的距离.
    Diameter,
}

impl ProfileType {
    /// 所有 profile 种类.
    pub const ALL: [ProfileType; 3] = [Self::Angle, Self::Radius, Self::Diameter];
}

impl fmt::Display for ProfileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Angle => write!(f, "angle"),
            Self::Radius => write!(f, "radius"),
            Self::Diameter => write!(f, "diameter"),
        }
    }
}
