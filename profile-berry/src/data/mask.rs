//! 下标布尔掩码.

use std::ops::Index;

/// 与某个 profile 等长的布尔掩码. 规则匹配结果以该形式表示.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BooleanMask {
    data: Vec<bool>,
}

impl BooleanMask {
    /// 构造长度为 `len`, 所有值均为 `value` 的掩码.
    #[inline]
    pub fn new(len: usize, value: bool) -> Self {
        Self {
            data: vec![value; len],
        }
    }

    /// 由 `Vec<bool>` 构造.
    #[inline]
    pub fn from_vec(data: Vec<bool>) -> Self {
        Self { data }
    }

    /// 掩码长度.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// 掩码是否为空 (长度为 0).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// 获取下标 `i` 处的值. 越界时 panic.
    #[inline]
    pub fn get(&self, i: usize) -> bool {
        self.data[i]
    }

    /// 设置下标 `i` 处的值. 越界时 panic.
    #[inline]
    pub fn set(&mut self, i: usize, value: bool) {
        self.data[i] = value;
    }

    fn zip_with<F: Fn(bool, bool) -> bool>(&self, other: &Self, f: F) -> Self {
        assert_eq!(self.len(), other.len(), "掩码长度不一致");
        self.data
            .iter()
            .zip(other.data.iter())
            .map(|(a, b)| f(*a, *b))
            .collect()
    }

    /// 逻辑与. 长度不同时 panic.
    pub fn and(&self, other: &Self) -> Self {
        self.zip_with(other, |a, b| a && b)
    }

    /// 逻辑或. 长度不同时 panic.
    pub fn or(&self, other: &Self) -> Self {
        self.zip_with(other, |a, b| a || b)
    }

    /// 逻辑非.
    pub fn invert(&self) -> Self {
        self.data.iter().map(|v| !v).collect()
    }

    /// 为真的下标个数.
    #[inline]
    pub fn count(&self) -> usize {
        self.data.iter().filter(|v| **v).count()
    }

    /// 第一个为真的下标.
    #[inline]
    pub fn first_true(&self) -> Option<usize> {
        self.data.iter().position(|v| *v)
    }

    /// 最后一个为真的下标.
    #[inline]
    pub fn last_true(&self) -> Option<usize> {
        self.data.iter().rposition(|v| *v)
    }

    /// 所有为真的下标, 升序.
    pub fn true_indexes(&self) -> Vec<usize> {
        self.data
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.then_some(i))
            .collect()
    }

    /// 只保留下标 `index` 为真 (若原本为真) 的掩码.
    pub(crate) fn only(&self, index: Option<usize>) -> Self {
        let mut out = Self::new(self.len(), false);
        if let Some(i) = index {
            out.data[i] = self.data[i];
        }
        out
    }
}

impl Index<usize> for BooleanMask {
    type Output = bool;

    #[inline]
    fn index(&self, index: usize) -> &Self::Output {
        &self.data[index]
    }
}

impl FromIterator<bool> for BooleanMask {
    fn from_iter<T: IntoIterator<Item = bool>>(iter: T) -> Self {
        Self {
            data: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::BooleanMask;

    /// 基本逻辑运算.
    #[test]
    fn test_mask_logic() {
        let a = BooleanMask::from_vec(vec![true, true, false, false]);
        let b = BooleanMask::from_vec(vec![true, false, true, false]);
        assert_eq!(a.and(&b).true_indexes(), vec![0]);
        assert_eq!(a.or(&b).true_indexes(), vec![0, 1, 2]);
        assert_eq!(a.invert().true_indexes(), vec![2, 3]);
        assert_eq!(b.first_true(), Some(0));
        assert_eq!(b.last_true(), Some(2));
        assert_eq!(b.only(b.last_true()).true_indexes(), vec![2]);
        assert_eq!(BooleanMask::new(3, false).first_true(), None);
    }

    /// 长度不一致时 panic.
    #[test]
    #[should_panic]
    fn test_mask_len_mismatch() {
        let _ = BooleanMask::new(2, true).and(&BooleanMask::new(3, true));
    }
}
