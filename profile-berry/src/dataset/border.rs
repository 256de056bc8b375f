//! 从有序轮廓点导出 profile.
//!
//! 所有 profile 只依赖点与点之间的相对位置, 因此与坐标平移无关.

use crate::data::{Profile, ProfileType};
use crate::Point2d;

/// 轮廓点的质心 (各点坐标平均值).
pub fn centroid(border: &[Point2d]) -> Point2d {
    let n = border.len().max(1) as f64;
    let (sx, sy) = border
        .iter()
        .fold((0.0, 0.0), |(sx, sy), (x, y)| (sx + x, sy + y));
    (sx / n, sy / n)
}

/// 多边形有向面积的两倍. 逆时针为正.
fn signed_area2(border: &[Point2d]) -> f64 {
    let n = border.len();
    (0..n)
        .map(|i| {
            let (x0, y0) = border[i];
            let (x1, y1) = border[(i + 1) % n];
            x0 * y1 - x1 * y0
        })
        .sum()
}

#[inline]
fn sub(a: Point2d, b: Point2d) -> Point2d {
    (a.0 - b.0, a.1 - b.1)
}

#[inline]
fn norm(v: Point2d) -> f64 {
    v.0.hypot(v.1)
}

/// 角度 profile.
///
/// 点 `i` 的取值是前后各 `window` 个点构成的内角 (度): 凸处小于 180, 凹处大于 180.
pub fn angle_profile(border: &[Point2d], window: usize) -> Vec<f64> {
    let n = border.len();
    let w = window.max(1);
    let orientation = if signed_area2(border) >= 0.0 { 1.0 } else { -1.0 };
    (0..n)
        .map(|i| {
            let p = border[i];
            let a = border[(i + n - w % n) % n];
            let b = border[(i + w) % n];
            let (u, v) = (sub(a, p), sub(b, p));
            let denom = norm(u) * norm(v);
            if denom == 0.0 {
                return 180.0;
            }
            let cos = ((u.0 * v.0 + u.1 * v.1) / denom).clamp(-1.0, 1.0);
            let theta = cos.acos().to_degrees();
            // 沿轮廓方向的转向: 与多边形方向一致为凸.
            let (d0, d1) = (sub(p, a), sub(b, p));
            let turn = d0.0 * d1.1 - d0.1 * d1.0;
            if turn * orientation >= 0.0 {
                theta
            } else {
                360.0 - theta
            }
        })
        .collect()
}

/// 半径 profile: 每个点到质心的距离.
pub fn radius_profile(border: &[Point2d]) -> Vec<f64> {
    let c = centroid(border);
    border.iter().map(|p| norm(sub(*p, c))).collect()
}

/// 直径 profile: 每个点到质心的距离, 加上质心到对侧最接近反方向的轮廓点的距离.
pub fn diameter_profile(border: &[Point2d]) -> Vec<f64> {
    let c = centroid(border);
    let rays: Vec<(Point2d, f64)> = border
        .iter()
        .map(|p| {
            let v = sub(*p, c);
            let r = norm(v);
            if r == 0.0 {
                ((0.0, 0.0), 0.0)
            } else {
                ((v.0 / r, v.1 / r), r)
            }
        })
        .collect();
    rays.iter()
        .map(|(u, r)| {
            // 与 -u 夹角最小, 即与 u 点积最小.
            let opposite = rays
                .iter()
                .map(|(v, rv)| (u.0 * v.0 + u.1 * v.1, *rv))
                .fold((f64::INFINITY, 0.0), |best, cur| {
                    if cur.0 < best.0 {
                        cur
                    } else {
                        best
                    }
                });
            r + opposite.1
        })
        .collect()
}

/// 计算给定种类的 profile. `angle_window` 只用于角度 profile.
pub fn derive_profile(
    border: &[Point2d],
    profile_type: ProfileType,
    angle_window: usize,
) -> Option<Profile> {
    let values = match profile_type {
        ProfileType::Angle => angle_profile(border, angle_window),
        ProfileType::Radius => radius_profile(border),
        ProfileType::Diameter => diameter_profile(border),
    };
    Profile::new(values).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn f64_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-8
    }

    fn circle(n: usize, r: f64, center: Point2d) -> Vec<Point2d> {
        (0..n)
            .map(|i| {
                let t = 2.0 * PI * i as f64 / n as f64;
                (center.0 + r * t.cos(), center.1 + r * t.sin())
            })
            .collect()
    }

    /// 圆上半径恒定, 直径为两倍半径.
    #[test]
    fn test_circle_radius_and_diameter() {
        let b = circle(64, 10.0, (3.0, -4.0));
        assert!(f64_eq(centroid(&b).0, 3.0));
        assert!(radius_profile(&b).iter().all(|r| f64_eq(*r, 10.0)));
        assert!(diameter_profile(&b).iter().all(|d| f64_eq(*d, 20.0)));
    }

    /// 正多边形的内角, 与点的走向无关.
    #[test]
    fn test_square_angles() {
        let ccw = vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)];
        assert!(angle_profile(&ccw, 1).iter().all(|a| f64_eq(*a, 90.0)));
        let cw: Vec<Point2d> = ccw.iter().rev().copied().collect();
        assert!(angle_profile(&cw, 1).iter().all(|a| f64_eq(*a, 90.0)));
    }

    /// 凹处的内角大于 180 度.
    #[test]
    fn test_concave_angle() {
        // 箭头形: 下标 3 处向内凹.
        let b = vec![(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (2.0, 2.0), (0.0, 4.0)];
        let a = angle_profile(&b, 1);
        assert!(f64_eq(a[3], 270.0), "{}", a[3]);
        assert!(a[0] < 180.0 && a[1] < 180.0);
    }

    /// 平移不改变 profile.
    #[test]
    fn test_profiles_shift_invariant() {
        let b = circle(50, 7.0, (0.0, 0.0));
        let shifted: Vec<Point2d> = b.iter().map(|(x, y)| (x + 123.5, y - 77.25)).collect();
        for t in ProfileType::ALL {
            let p = derive_profile(&b, t, 3).unwrap();
            let q = derive_profile(&shifted, t, 3).unwrap();
            assert!(p.iter().zip(q.iter()).all(|(x, y)| (x - y).abs() < 1e-6));
        }
    }
}
