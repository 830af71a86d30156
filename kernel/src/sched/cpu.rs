//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 每 CPU 状态
//!
//! 对应 xv6 的 struct cpu：当前进程、调度器上下文、中断嵌套计数。

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::hal::Platform;
use crate::process::SlotId;

/// `proc` 字段的空值
const NO_PROC: usize = usize::MAX;

pub struct Cpu<P: Platform> {
    /// 正在运行的进程槽位
    proc: AtomicUsize,
    /// swtch() 到这里进入调度器循环
    scheduler: UnsafeCell<P::Context>,
    /// push_off 嵌套深度
    noff: AtomicUsize,
    /// 最外层 push_off 之前是否开中断
    intena: AtomicBool,
}

// 只有本 CPU 访问 scheduler 上下文，且访问时已关中断
unsafe impl<P: Platform> Sync for Cpu<P> {}

impl<P: Platform> Cpu<P> {
    pub fn new() -> Self {
        Self {
            proc: AtomicUsize::new(NO_PROC),
            scheduler: UnsafeCell::new(P::Context::default()),
            noff: AtomicUsize::new(0),
            intena: AtomicBool::new(false),
        }
    }

    pub fn proc(&self) -> Option<SlotId> {
        match self.proc.load(Ordering::Acquire) {
            NO_PROC => None,
            slot => Some(slot),
        }
    }

    pub fn set_proc(&self, slot: Option<SlotId>) {
        self.proc.store(slot.unwrap_or(NO_PROC), Ordering::Release);
    }

    pub fn scheduler_ptr(&self) -> *mut P::Context {
        self.scheduler.get()
    }

    #[inline]
    pub fn noff(&self) -> usize {
        self.noff.load(Ordering::Relaxed)
    }

    pub(crate) fn inc_noff(&self) {
        self.noff.fetch_add(1, Ordering::Relaxed);
    }

    /// 返回减一之后的值
    pub(crate) fn dec_noff(&self) -> usize {
        self.noff.fetch_sub(1, Ordering::Relaxed) - 1
    }

    /// 直接设置嵌套深度，只用于从失败的上下文切换中恢复
    #[cfg(test)]
    pub(crate) fn set_noff(&self, n: usize) {
        self.noff.store(n, Ordering::Relaxed);
    }

    #[inline]
    pub fn intena(&self) -> bool {
        self.intena.load(Ordering::Relaxed)
    }

    pub fn set_intena(&self, on: bool) {
        self.intena.store(on, Ordering::Relaxed);
    }
}

impl<P: Platform> Default for Cpu<P> {
    fn default() -> Self {
        Self::new()
    }
}
