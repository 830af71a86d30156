//! 同步原语 (Synchronization Primitives)
//!
//! - `spinlock`: 关中断的自旋锁，进程表锁即为其实例
//! - `sleep`: 基于通道 (channel) 的 sleep / wakeup
//!
//! 核心概念：
//! - 持有自旋锁期间本 CPU 关中断，嵌套次数记录在每 CPU 的 `noff` 中
//! - sleep 在进程表锁保护下改变状态，wakeup 同样持有进程表锁，因此不会丢失唤醒

pub mod sleep;
pub mod spinlock;

pub use sleep::Channel;
pub use spinlock::{InterruptControl, SpinLock, SpinLockGuard};
