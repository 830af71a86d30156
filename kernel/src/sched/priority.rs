//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 调度优先级
//!
//! 四个级别 0..=3，3 最高。级别越低，时间片越长：
//! `quantum(L) = QUANTUM_BASE + QUANTUM_STEP * (3 - L)`，
//! 默认配置下依次为 8、12、16、20 个 tick。

use core::fmt;

use crate::config::{NLEVELS, QUANTUM_BASE, QUANTUM_STEP};
use crate::errno::Errno;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Priority(u8);

impl Priority {
    pub const LOWEST: Priority = Priority(0);
    pub const HIGHEST: Priority = Priority((NLEVELS - 1) as u8);

    /// 队列下标
    #[inline]
    pub const fn level(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn as_i32(self) -> i32 {
        self.0 as i32
    }

    /// 本级别的时间片长度（tick）
    pub const fn quantum(self) -> u32 {
        QUANTUM_BASE + QUANTUM_STEP * (Self::HIGHEST.0 - self.0) as u32
    }

    /// 从最高到最低遍历所有级别
    pub fn descending() -> impl Iterator<Item = Priority> {
        (0..NLEVELS as u8).rev().map(Priority)
    }
}

impl TryFrom<i32> for Priority {
    type Error = Errno;

    fn try_from(value: i32) -> Result<Self, Errno> {
        if (0..NLEVELS as i32).contains(&value) {
            Ok(Priority(value as u8))
        } else {
            Err(Errno::InvalidArgument)
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantum_law() {
        for p in Priority::descending() {
            let expected = QUANTUM_BASE + QUANTUM_STEP * (3 - p.level() as u32);
            assert_eq!(p.quantum(), expected);
        }
        assert_eq!(Priority::HIGHEST.quantum(), QUANTUM_BASE);
    }

    #[test]
    fn test_range_check() {
        assert_eq!(Priority::try_from(0), Ok(Priority::LOWEST));
        assert_eq!(Priority::try_from(3), Ok(Priority::HIGHEST));
        assert_eq!(Priority::try_from(-1), Err(Errno::InvalidArgument));
        assert_eq!(Priority::try_from(4), Err(Errno::InvalidArgument));
        assert_eq!(Priority::try_from(7), Err(Errno::InvalidArgument));
    }

    #[test]
    fn test_descending_order() {
        let levels: Vec<usize> = Priority::descending().map(Priority::level).collect();
        assert_eq!(levels, [3, 2, 1, 0]);
    }
}
