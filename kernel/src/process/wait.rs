//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 进程退出与回收
//!
//! - `exit`: 关闭文件、过继子进程、变为僵尸并永久交出 CPU
//! - `wait`: 等待子进程退出并回收其槽位
//! - `kill`: 设置终止标志，由进程自己在返回用户态前检查
//!
//! 父进程在自己的 PCB 通道上睡眠，子进程 exit 时唤醒该通道。

use crate::config::NOFILE;
use crate::errno::Errno;
use crate::hal::Platform;
use crate::kernel::Kernel;
use crate::process::proc::{Pid, ProcState};

impl<P: Platform> Kernel<P> {
    /// 退出当前进程，不会返回
    ///
    /// 进程保持僵尸状态，直到父进程调用 wait。
    pub fn exit(&self) -> ! {
        let Some(cur) = self.myproc() else {
            panic!("exit: no current process");
        };

        let (files, cwd) = {
            let mut t = self.ptable.lock(self);
            if t.init == Some(cur) {
                panic!("init exiting");
            }
            let p = &mut t.procs[cur];
            let files: [Option<P::File>; NOFILE] = core::array::from_fn(|fd| p.ofile[fd].take());
            (files, p.cwd.take())
        };

        // 关闭文件和释放 inode 可能睡眠，不能持有进程表锁
        for file in files.into_iter().flatten() {
            self.platform().file_close(file);
        }
        if let Some(cwd) = cwd {
            self.platform().inode_put(cwd);
        }

        let mut t = self.ptable.lock(self);

        // 父进程可能正在 wait() 中睡眠
        if let Some(parent) = t.procs[cur].parent {
            let chan = t.chan_of(parent);
            t.wakeup(chan);
        }

        // 子进程过继给 init
        if let Some(init) = t.init {
            if t.reparent_children(cur, init) {
                let chan = t.chan_of(init);
                t.wakeup(chan);
            }
        }

        t.procs[cur].state = ProcState::Zombie;
        log::debug!("exit: pid {}", t.procs[cur].pid);

        let _t = self.sched(t);
        panic!("zombie exit");
    }

    /// 等待一个子进程退出，返回其 PID
    ///
    /// 没有子进程，或者等待期间自己被 kill 时返回 ECHILD。
    pub fn wait(&self) -> Result<Pid, Errno> {
        let Some(cur) = self.myproc() else {
            panic!("wait: no current process");
        };

        let mut t = self.ptable.lock(self);
        loop {
            let mut havekids = false;
            let mut zombie = None;
            for (slot, p) in t.procs.iter().enumerate() {
                if p.parent != Some(cur) {
                    continue;
                }
                havekids = true;
                if p.state == ProcState::Zombie {
                    zombie = Some(slot);
                    break;
                }
            }

            if let Some(slot) = zombie {
                let reaped = t.reap(slot);
                drop(t);

                if let Some(kstack) = reaped.kstack {
                    self.platform().free_kstack(kstack);
                }
                if let Some(pgdir) = reaped.pgdir {
                    self.platform().free_vm(pgdir);
                }
                log::debug!("wait: reaped pid {}", reaped.pid);
                return Ok(reaped.pid);
            }

            if !havekids || t.procs[cur].killed {
                return Err(Errno::NoChild);
            }

            // 等子进程 exit 唤醒
            let chan = t.chan_of(cur);
            t = self.sleep_locked(chan, t);
        }
    }

    /// 终止指定进程
    ///
    /// 只设置标志；睡眠中的进程被放回就绪队列，以便尽快观察到标志。
    pub fn kill(&self, pid: Pid) -> Result<(), Errno> {
        let mut t = self.ptable.lock(self);
        let slot = t.find(pid).ok_or(Errno::NoSuchProcess)?;
        t.procs[slot].killed = true;
        if t.procs[slot].state == ProcState::Sleeping {
            t.make_runnable(slot);
        }
        log::debug!("kill: pid {}", pid);
        Ok(())
    }
}
