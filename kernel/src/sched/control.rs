//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 优先级控制接口：getpri / setpri / getpinfo

use crate::errno::Errno;
use crate::hal::Platform;
use crate::kernel::Kernel;
use crate::process::Pid;
use crate::sched::priority::Priority;
use crate::sched::pstat::PStat;

impl<P: Platform> Kernel<P> {
    /// 查询进程优先级
    ///
    /// pid < 1、pid 不存在或进程尚未放入队列时返回 EINVAL
    pub fn get_priority(&self, pid: Pid) -> Result<Priority, Errno> {
        if pid < 1 {
            return Err(Errno::InvalidArgument);
        }
        let t = self.ptable.lock(self);
        let slot = t.find(pid).ok_or(Errno::InvalidArgument)?;
        t.procs[slot].priority.ok_or(Errno::InvalidArgument)
    }

    /// 修改进程优先级，返回新的优先级
    pub fn set_priority(&self, pid: Pid, priority: i32) -> Result<Priority, Errno> {
        let prio = Priority::try_from(priority)?;
        if pid < 1 {
            return Err(Errno::InvalidArgument);
        }
        let mut t = self.ptable.lock(self);
        let slot = t.find(pid).ok_or(Errno::InvalidArgument)?;
        let old = t.procs[slot].priority;
        let new = t.set_priority(slot, prio);
        log::debug!("setpri: pid {} {:?} -> {}", pid, old, new);
        Ok(new)
    }

    /// 整张进程表的快照
    pub fn snapshot(&self, out: Option<&mut PStat>) -> Result<(), Errno> {
        let out = out.ok_or(Errno::BadAddress)?;
        self.ptable.lock(self).snapshot(out);
        Ok(())
    }
}
