//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 进程控制块
//!
//! 对应 xv6 的 struct proc。调度相关字段只能在持有进程表锁时修改；
//! 地址空间、内核栈、上下文、打开文件和工作目录属于外部协作者，
//! 这里只保存句柄。

use core::fmt;

use crate::config::{NLEVELS, NOFILE, PROC_NAME_LEN};
use crate::hal::Platform;
use crate::sched::priority::Priority;
use crate::sync::sleep::Channel;

/// 进程 ID，0 表示槽位未分配
pub type Pid = i32;

/// 进程表槽位下标
pub type SlotId = usize;

/// 进程状态
///
/// 数值即 getpinfo 报告给用户态的状态码
#[repr(u32)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ProcState {
    Unused = 0,
    Embryo = 1,
    Sleeping = 2,
    Runnable = 3,
    Running = 4,
    Zombie = 5,
}

impl ProcState {
    /// procdump 中的定宽显示
    pub const fn as_str(self) -> &'static str {
        match self {
            ProcState::Unused => "unused",
            ProcState::Embryo => "embryo",
            ProcState::Sleeping => "sleep ",
            ProcState::Runnable => "runble",
            ProcState::Running => "run   ",
            ProcState::Zombie => "zombie",
        }
    }
}

/// 定长进程名，以 NUL 结尾
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct ProcName([u8; PROC_NAME_LEN]);

impl ProcName {
    pub const EMPTY: ProcName = ProcName([0; PROC_NAME_LEN]);

    /// 超长部分被截断，始终保留一个 NUL
    pub fn new(name: &str) -> Self {
        let mut buf = [0u8; PROC_NAME_LEN];
        let len = name.len().min(PROC_NAME_LEN - 1);
        buf[..len].copy_from_slice(&name.as_bytes()[..len]);
        ProcName(buf)
    }

    pub fn as_bytes(&self) -> &[u8] {
        let len = self.0.iter().position(|&b| b == 0).unwrap_or(PROC_NAME_LEN);
        &self.0[..len]
    }

    pub fn as_str(&self) -> &str {
        // 截断可能切在多字节字符中间
        match core::str::from_utf8(self.as_bytes()) {
            Ok(s) => s,
            Err(e) => core::str::from_utf8(&self.as_bytes()[..e.valid_up_to()]).unwrap_or(""),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0[0] == 0
    }
}

impl fmt::Debug for ProcName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

pub struct Proc<P: Platform> {
    pub(crate) state: ProcState,
    pub(crate) pid: Pid,
    /// None 表示刚分配、尚未放入任何队列
    pub(crate) priority: Option<Priority>,
    /// 当前时间片内已运行的 tick
    pub(crate) time_slice: u32,
    /// 每个级别累计运行的 tick
    pub(crate) ticks: [u32; NLEVELS],
    /// 每个级别累计入队次数
    pub(crate) qtail: [u32; NLEVELS],
    pub(crate) parent: Option<SlotId>,
    pub(crate) killed: bool,
    /// 仅在 Sleeping 时有值
    pub(crate) chan: Option<Channel>,

    /// 用户内存大小（字节）
    pub(crate) sz: usize,
    pub(crate) pgdir: Option<P::PageTable>,
    pub(crate) kstack: Option<P::KernelStack>,
    pub(crate) tf: P::TrapFrame,
    pub(crate) context: P::Context,
    pub(crate) ofile: [Option<P::File>; NOFILE],
    pub(crate) cwd: Option<P::Inode>,
    pub(crate) name: ProcName,
}

impl<P: Platform> Proc<P> {
    pub fn new() -> Self {
        Self {
            state: ProcState::Unused,
            pid: 0,
            priority: None,
            time_slice: 0,
            ticks: [0; NLEVELS],
            qtail: [0; NLEVELS],
            parent: None,
            killed: false,
            chan: None,
            sz: 0,
            pgdir: None,
            kstack: None,
            tf: P::TrapFrame::default(),
            context: P::Context::default(),
            ofile: core::array::from_fn(|_| None),
            cwd: None,
            name: ProcName::EMPTY,
        }
    }

    #[inline]
    pub fn state(&self) -> ProcState {
        self.state
    }

    #[inline]
    pub fn pid(&self) -> Pid {
        self.pid
    }

    #[inline]
    pub fn priority(&self) -> Option<Priority> {
        self.priority
    }

    pub fn time_slice(&self) -> u32 {
        self.time_slice
    }

    pub fn ticks(&self) -> &[u32; NLEVELS] {
        &self.ticks
    }

    pub fn qtail(&self) -> &[u32; NLEVELS] {
        &self.qtail
    }

    pub fn parent(&self) -> Option<SlotId> {
        self.parent
    }

    pub fn killed(&self) -> bool {
        self.killed
    }

    pub fn name(&self) -> &ProcName {
        &self.name
    }

    pub fn trapframe(&self) -> &P::TrapFrame {
        &self.tf
    }

    pub fn size(&self) -> usize {
        self.sz
    }
}

impl<P: Platform> Default for Proc<P> {
    fn default() -> Self {
        Self::new()
    }
}
