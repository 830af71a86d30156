//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 进程相关系统调用
//!
//! 参数以寄存器原值传入，返回值为非负结果或负的 errno，
//! 由陷入层写回返回值寄存器。系统调用号分发不在这里。

use crate::errno::Errno;
use crate::hal::Platform;
use crate::kernel::Kernel;
use crate::sched::pstat::PStat;

/// 把 Result 转换为系统调用返回值
#[inline]
fn ret(result: Result<isize, Errno>) -> u64 {
    match result {
        Ok(v) => v as u64,
        Err(e) => e.as_neg_isize() as u64,
    }
}

impl<P: Platform> Kernel<P> {
    pub fn sys_fork(&self, _args: [u64; 6]) -> u64 {
        ret(self.fork().map(|pid| pid as isize))
    }

    /// fork2(priority)
    pub fn sys_fork2(&self, args: [u64; 6]) -> u64 {
        let priority = args[0] as i32;
        ret(self.fork_with_priority(priority).map(|pid| pid as isize))
    }

    pub fn sys_exit(&self, _args: [u64; 6]) -> ! {
        self.exit()
    }

    pub fn sys_wait(&self, _args: [u64; 6]) -> u64 {
        ret(self.wait().map(|pid| pid as isize))
    }

    pub fn sys_kill(&self, args: [u64; 6]) -> u64 {
        let pid = args[0] as i32;
        ret(self.kill(pid).map(|()| 0))
    }

    pub fn sys_getpid(&self, _args: [u64; 6]) -> u64 {
        self.getpid() as u64
    }

    /// sbrk(n)：返回调整之前的堆顶
    pub fn sys_sbrk(&self, args: [u64; 6]) -> u64 {
        let n = args[0] as i64 as isize;
        ret(self.growproc(n).map(|old| old as isize))
    }

    /// setpri(pid, priority)：返回新的优先级
    pub fn sys_setpri(&self, args: [u64; 6]) -> u64 {
        let pid = args[0] as i32;
        let priority = args[1] as i32;
        ret(self.set_priority(pid, priority).map(|p| p.as_i32() as isize))
    }

    pub fn sys_getpri(&self, args: [u64; 6]) -> u64 {
        let pid = args[0] as i32;
        ret(self.get_priority(pid).map(|p| p.as_i32() as isize))
    }

    /// getpinfo(struct pstat *)
    ///
    /// # Safety
    ///
    /// `args[0]` 为 0 或者指向一个可写的 [`PStat`]。
    pub unsafe fn sys_getpinfo(&self, args: [u64; 6]) -> u64 {
        let st = args[0] as usize as *mut PStat;
        let out = unsafe { st.as_mut() };
        ret(self.snapshot(out).map(|()| 0))
    }
}
