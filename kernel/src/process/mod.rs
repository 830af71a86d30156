//! 进程管理模块
//!
//! - `proc`: 进程控制块 (xv6 struct proc)
//! - `pid`: PID 分配
//! - `table`: 进程表与就绪队列
//! - `fork`: 进程创建 (allocproc/userinit/fork/growproc)
//! - `wait`: 进程退出与回收 (exit/wait/kill)
//! - `dump`: 调试输出 (procdump)

pub mod dump;
pub mod fork;
pub mod pid;
pub mod proc;
pub mod table;
pub mod wait;

pub use proc::{Pid, Proc, ProcName, ProcState, SlotId};
pub use table::ProcTable;

use crate::hal::Platform;
use crate::kernel::Kernel;

impl<P: Platform> Kernel<P> {
    /// 当前进程的 PID
    pub fn getpid(&self) -> Pid {
        let Some(slot) = self.myproc() else {
            panic!("getpid: no current process");
        };
        self.ptable.lock(self).pid_of(slot)
    }

    /// 当前进程是否已被 kill
    ///
    /// 陷入返回路径在回到用户态之前检查，为真时调用 exit。
    pub fn killed(&self) -> bool {
        match self.myproc() {
            Some(slot) => self.ptable.lock(self).procs[slot].killed,
            None => false,
        }
    }
}
