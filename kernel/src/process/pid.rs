//! PID 分配
//!
//! 对应 Linux 内核的 alloc_pid() (kernel/pid.c)，简化为单调递增计数器：
//! 在内核生命周期内 PID 永不复用，持有旧 PID 的引用不会误指向新进程。
//!
//! 计数器只在持有进程表锁时访问。

use crate::process::proc::Pid;

/// 最大 PID 数值 (与 Linux 一致: /proc/sys/kernel/pid_max)
pub const PID_MAX_LIMIT: Pid = 4194304;

/// 第一个进程的 PID
pub const PID_INIT: Pid = 1;

pub struct PidAllocator {
    next: Pid,
}

impl PidAllocator {
    pub const fn new() -> Self {
        Self { next: PID_INIT }
    }

    /// 分配一个新的 PID，空间耗尽时返回 None
    pub fn alloc(&mut self) -> Option<Pid> {
        if self.next >= PID_MAX_LIMIT {
            return None;
        }
        let pid = self.next;
        self.next += 1;
        Some(pid)
    }

    /// 下一个将被分配的 PID
    pub fn peek(&self) -> Pid {
        self.next
    }
}

impl Default for PidAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monotonic() {
        let mut pids = PidAllocator::new();
        assert_eq!(pids.alloc(), Some(PID_INIT));
        assert_eq!(pids.alloc(), Some(2));
        assert_eq!(pids.peek(), 3);
    }

    #[test]
    fn test_exhaustion() {
        let mut pids = PidAllocator { next: PID_MAX_LIMIT - 1 };
        assert_eq!(pids.alloc(), Some(PID_MAX_LIMIT - 1));
        assert_eq!(pids.alloc(), None);
        assert_eq!(pids.alloc(), None);
    }
}
