//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! Tern 进程核心
//!
//! 小型教学内核的进程生命周期与调度部分：
//! - 固定大小的进程表，由一把全局锁保护
//! - 四级优先级就绪队列，多处理器共享
//! - fork / exit / wait 生命周期与 sleep / wakeup 同步
//!
//! 内存管理、文件系统、上下文切换原语和中断处理都由 [`hal::Platform`] 提供。

#![cfg_attr(not(test), no_std)]

extern crate log;

pub mod config;
pub mod errno;
pub mod hal;
pub mod kernel;
pub mod process;
pub mod sched;
pub mod sync;
pub mod syscall;

#[cfg(test)]
mod tests;

pub use errno::Errno;
pub use hal::Platform;
pub use kernel::Kernel;
pub use process::{Pid, ProcState, SlotId};
pub use sched::{PStat, Priority};
pub use sync::{Channel, SpinLock, SpinLockGuard};
