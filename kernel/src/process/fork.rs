//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 进程创建
//!
//! 对应 xv6 proc.c 中的 allocproc/userinit/fork/growproc
//!
//! fork 流程:
//! 1. 分配 PCB 与内核栈 (alloc_proc)
//! 2. 复制父进程地址空间 (copy_uvm)，失败时撤销第 1 步
//! 3. 复制陷入帧，子进程的返回值寄存器清零
//! 4. 复制打开文件、工作目录和进程名
//! 5. 置为 Runnable，按优先级放入就绪队列

use crate::config::{KERNEL_NAME, KERNEL_VERSION, NOFILE};
use crate::errno::Errno;
use crate::hal::Platform;
use crate::kernel::Kernel;
use crate::process::proc::{Pid, ProcName, ProcState, SlotId};
use crate::sched::priority::Priority;

impl<P: Platform> Kernel<P> {
    /// 分配一个 Embryo 槽位并准备好内核栈和初始上下文
    ///
    /// 新上下文第一次运行时进入 forkret。
    pub(crate) fn alloc_proc(&self) -> Result<SlotId, Errno> {
        let slot = self.ptable.lock(self).allocate().ok_or(Errno::TryAgain)?;

        let Some(mut kstack) = self.platform().alloc_kstack() else {
            self.ptable.lock(self).abandon_embryo(slot);
            return Err(Errno::OutOfMemory);
        };
        let context = self.platform().new_context(&mut kstack);

        let mut t = self.ptable.lock(self);
        let p = &mut t.procs[slot];
        p.kstack = Some(kstack);
        p.context = context;
        p.tf = P::TrapFrame::default();
        Ok(slot)
    }

    /// 创建第一个用户进程
    ///
    /// 优先级 3，直接放入最高级别队列。整个内核生命周期只调用一次。
    pub fn userinit(&self) -> Pid {
        if self.ptable.lock(self).init.is_some() {
            panic!("userinit: init process already exists");
        }

        let slot = match self.alloc_proc() {
            Ok(slot) => slot,
            Err(e) => panic!("userinit: {:?}", e),
        };
        let Some(mut pgdir) = self.platform().setup_kvm() else {
            panic!("userinit: out of memory?");
        };
        let sz = self.platform().init_uvm(&mut pgdir, self.initcode);
        let tf = self.platform().user_trapframe(sz);
        let cwd = self.platform().root_inode();

        let mut t = self.ptable.lock(self);
        let p = &mut t.procs[slot];
        p.pgdir = Some(pgdir);
        p.sz = sz;
        p.tf = tf;
        p.name = ProcName::new("initcode");
        p.cwd = Some(cwd);
        p.priority = Some(Priority::HIGHEST);
        let pid = p.pid;

        t.init = Some(slot);
        t.make_runnable(slot);

        log::info!("{} {}: init pid {} ({} bytes)", KERNEL_NAME, KERNEL_VERSION, pid, sz);
        pid
    }

    /// 创建子进程，继承当前进程的优先级
    pub fn fork(&self) -> Result<Pid, Errno> {
        self.do_fork(None)
    }

    /// 创建子进程并指定优先级，优先级超出 0..=3 时不创建进程
    pub fn fork_with_priority(&self, priority: i32) -> Result<Pid, Errno> {
        let prio = Priority::try_from(priority)?;
        self.do_fork(Some(prio))
    }

    fn do_fork(&self, priority: Option<Priority>) -> Result<Pid, Errno> {
        let Some(cur) = self.myproc() else {
            panic!("fork: no current process");
        };
        let child = self.alloc_proc()?;

        let mut t = self.ptable.lock(self);
        let copied = {
            let parent = &t.procs[cur];
            parent
                .pgdir
                .as_ref()
                .and_then(|pgdir| self.platform().copy_uvm(pgdir, parent.sz))
        };
        let Some(pgdir) = copied else {
            let (kstack, _) = t.abandon_embryo(child);
            drop(t);
            if let Some(kstack) = kstack {
                self.platform().free_kstack(kstack);
            }
            log::debug!("fork: copy_uvm failed");
            return Err(Errno::OutOfMemory);
        };

        let parent = &t.procs[cur];
        let Some(prio) = priority.or(parent.priority) else {
            panic!("fork: parent pid {} has no priority", parent.pid);
        };
        let sz = parent.sz;
        let name = parent.name;
        let mut tf = parent.tf.clone();
        // 子进程中 fork 返回 0
        self.platform().set_return_value(&mut tf, 0);
        let ofile: [Option<P::File>; NOFILE] = core::array::from_fn(|fd| {
            parent.ofile[fd]
                .as_ref()
                .map(|file| self.platform().file_dup(file))
        });
        let cwd = parent.cwd.as_ref().map(|cwd| self.platform().inode_dup(cwd));
        let parent_pid = parent.pid;

        let c = &mut t.procs[child];
        c.pgdir = Some(pgdir);
        c.sz = sz;
        c.tf = tf;
        c.ofile = ofile;
        c.cwd = cwd;
        c.name = name;
        c.parent = Some(cur);
        let pid = c.pid;

        // 以未入队状态置为 Runnable，由 set_priority 放入队列
        c.state = ProcState::Runnable;
        c.priority = None;
        t.set_priority(child, prio);

        log::debug!("fork: pid {} -> child pid {} (pri {})", parent_pid, pid, prio);
        Ok(pid)
    }

    /// 调整当前进程的用户内存，`n` 为正时扩展、为负时收缩
    ///
    /// 返回调整之前的大小，失败时大小不变。
    pub fn growproc(&self, n: isize) -> Result<usize, Errno> {
        let Some(cur) = self.myproc() else {
            panic!("growproc: no current process");
        };
        let mut t = self.ptable.lock(self);
        let p = &mut t.procs[cur];
        let old = p.sz;

        let target = if n >= 0 {
            old.checked_add(n.unsigned_abs())
        } else {
            old.checked_sub(n.unsigned_abs())
        }
        .ok_or(Errno::OutOfMemory)?;

        let Some(pgdir) = p.pgdir.as_mut() else {
            panic!("growproc: pid {} has no address space", p.pid);
        };
        let sz = match n {
            0 => Some(old),
            n if n > 0 => self.platform().alloc_uvm(pgdir, old, target),
            _ => self.platform().dealloc_uvm(pgdir, old, target),
        }
        .ok_or(Errno::OutOfMemory)?;
        p.sz = sz;

        if let (Some(pgdir), Some(kstack)) = (p.pgdir.as_ref(), p.kstack.as_ref()) {
            self.platform().switch_uvm(pgdir, kstack);
        }
        Ok(old)
    }
}
