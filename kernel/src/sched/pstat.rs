//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! getpinfo 的用户态布局

use crate::config::{NLEVELS, NPROC};

/// 整张进程表的调度统计快照
///
/// 每行对应一个槽位，行序与进程表布局一致。
#[repr(C)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PStat {
    /// 槽位是否在用 (pid != 0)
    pub inuse: [i32; NPROC],
    pub pid: [i32; NPROC],
    /// 尚未放入队列时为 -1
    pub priority: [i32; NPROC],
    /// ProcState 的数值
    pub state: [i32; NPROC],
    pub ticks: [[i32; NLEVELS]; NPROC],
    pub qtail: [[i32; NLEVELS]; NPROC],
}

impl PStat {
    pub const fn new() -> Self {
        Self {
            inuse: [0; NPROC],
            pid: [0; NPROC],
            priority: [0; NPROC],
            state: [0; NPROC],
            ticks: [[0; NLEVELS]; NPROC],
            qtail: [[0; NLEVELS]; NPROC],
        }
    }
}

impl Default for PStat {
    fn default() -> Self {
        Self::new()
    }
}
