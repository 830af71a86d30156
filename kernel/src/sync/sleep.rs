//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! sleep / wakeup
//!
//! 对应 xv6 的 sleep()/wakeup()。进程在某个通道上睡眠，
//! 条件满足方在同一通道上唤醒。
//!
//! 丢失唤醒：调用者持有与条件相关的锁 `lk`。sleep 先获取进程表锁，
//! 再释放 `lk`；wakeup 总是持有进程表锁运行，所以在两者之间
//! 不存在 wakeup 能够插入的窗口。

use crate::hal::Platform;
use crate::kernel::{Kernel, TableGuard};
use crate::sync::spinlock::{SpinLock, SpinLockGuard};

/// 等待条件标识
///
/// 只用于相等比较，通常取被等待对象的地址。
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Channel(usize);

impl Channel {
    /// 以对象地址作为通道
    pub fn of<T>(obj: &T) -> Self {
        Channel(obj as *const T as usize)
    }

    pub const fn from_raw(raw: usize) -> Self {
        Channel(raw)
    }
}

impl<P: Platform> Kernel<P> {
    /// 在 `chan` 上睡眠，释放并在返回前重新获取调用者持有的锁
    ///
    /// 调用者持有的锁不能是进程表锁，进程表锁请使用 [`Kernel::sleep_locked`]。
    pub fn sleep<'a, T>(
        &'a self,
        chan: Channel,
        guard: SpinLockGuard<'a, T, Kernel<P>>,
    ) -> SpinLockGuard<'a, T, Kernel<P>> {
        if self.myproc().is_none() {
            panic!("sleep");
        }

        // 先拿进程表锁，再放调用者的锁
        let t = self.ptable.lock(self);
        let lk: &'a SpinLock<T> = SpinLock::unlock(guard);

        let t = self.sleep_locked(chan, t);

        drop(t);
        lk.lock(self)
    }

    /// 持有进程表锁时在 `chan` 上睡眠
    pub(crate) fn sleep_locked<'a>(&'a self, chan: Channel, mut t: TableGuard<'a, P>) -> TableGuard<'a, P> {
        let Some(slot) = self.myproc() else {
            panic!("sleep");
        };

        t.procs[slot].chan = Some(chan);
        t.procs[slot].state = crate::process::ProcState::Sleeping;

        let mut t = self.sched(t);

        t.procs[slot].chan = None;
        t
    }

    /// 唤醒在 `chan` 上睡眠的所有进程，返回被唤醒的数量
    pub fn wakeup(&self, chan: Channel) -> usize {
        let mut t = self.ptable.lock(self);
        t.wakeup(chan)
    }
}
