//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 关中断自旋锁
//!
//! 在 `spin::Mutex` 外包一层中断控制：加锁前 `push_off`，解锁后 `pop_off`，
//! 并记录持锁 CPU，供 `holding` 检查。
//!
//! 调度时锁的所有权跨越上下文切换：调度器加锁后切换到进程，
//! 由进程负责释放；进程加锁后切回调度器，由调度器释放。

use core::mem::ManuallyDrop;
use core::ops::{Deref, DerefMut};
use core::sync::atomic::{AtomicUsize, Ordering};

/// 无持有者
const NO_HOLDER: usize = 0;

/// 每 CPU 的中断嵌套控制，由内核实现
pub trait InterruptControl {
    /// 关中断并增加嵌套计数
    fn push_off(&self);

    /// 减少嵌套计数，归零时恢复最外层之前的中断状态
    fn pop_off(&self);

    /// 当前 CPU 编号，调用时必须已关中断
    fn current_cpu(&self) -> usize;
}

pub struct SpinLock<T> {
    name: &'static str,
    /// 持锁 CPU 编号 + 1
    holder: AtomicUsize,
    inner: spin::Mutex<T>,
}

impl<T> SpinLock<T> {
    pub const fn new(name: &'static str, value: T) -> Self {
        Self {
            name,
            holder: AtomicUsize::new(NO_HOLDER),
            inner: spin::Mutex::new(value),
        }
    }

    /// 获取锁，持锁期间本 CPU 关中断
    pub fn lock<'a, C: InterruptControl>(&'a self, irq: &'a C) -> SpinLockGuard<'a, T, C> {
        irq.push_off();
        if self.holding(irq) {
            panic!("acquire {}: already held", self.name);
        }
        let guard = self.inner.lock();
        self.holder.store(irq.current_cpu() + 1, Ordering::Release);
        SpinLockGuard {
            lock: self,
            irq,
            guard: ManuallyDrop::new(guard),
        }
    }

    /// 尝试获取锁，失败时恢复中断状态
    pub fn try_lock<'a, C: InterruptControl>(&'a self, irq: &'a C) -> Option<SpinLockGuard<'a, T, C>> {
        irq.push_off();
        match self.inner.try_lock() {
            Some(guard) => {
                self.holder.store(irq.current_cpu() + 1, Ordering::Release);
                Some(SpinLockGuard {
                    lock: self,
                    irq,
                    guard: ManuallyDrop::new(guard),
                })
            }
            None => {
                irq.pop_off();
                None
            }
        }
    }

    /// 当前 CPU 是否持有此锁
    pub fn holding<C: InterruptControl>(&self, irq: &C) -> bool {
        irq.push_off();
        let held = self.inner.is_locked()
            && self.holder.load(Ordering::Acquire) == irq.current_cpu() + 1;
        irq.pop_off();
        held
    }

    /// 释放由另一个执行流获取、guard 不在当前栈上的锁
    ///
    /// # Safety
    ///
    /// 锁必须由当前 CPU 持有，且对应的 guard 不会再被使用。
    pub unsafe fn force_release<C: InterruptControl>(&self, irq: &C) {
        self.holder.store(NO_HOLDER, Ordering::Release);
        unsafe { self.inner.force_unlock() };
        irq.pop_off();
    }

    /// 释放 guard 并返回锁本身，用于稍后重新获取
    pub fn unlock<'a, C: InterruptControl>(guard: SpinLockGuard<'a, T, C>) -> &'a SpinLock<T> {
        let lock = guard.lock;
        drop(guard);
        lock
    }
}

pub struct SpinLockGuard<'a, T, C: InterruptControl> {
    lock: &'a SpinLock<T>,
    irq: &'a C,
    guard: ManuallyDrop<spin::MutexGuard<'a, T>>,
}

impl<T, C: InterruptControl> Deref for SpinLockGuard<'_, T, C> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.guard
    }
}

impl<T, C: InterruptControl> DerefMut for SpinLockGuard<'_, T, C> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.guard
    }
}

impl<T, C: InterruptControl> Drop for SpinLockGuard<'_, T, C> {
    fn drop(&mut self) {
        self.lock.holder.store(NO_HOLDER, Ordering::Release);
        // guard 只在这里释放一次
        unsafe { ManuallyDrop::drop(&mut self.guard) };
        self.irq.pop_off();
    }
}
