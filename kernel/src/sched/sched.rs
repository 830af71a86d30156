//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 调度器核心
//!
//! 每个 CPU 在完成初始化后进入 [`Kernel::scheduler`]，永不返回。
//! 一轮调度：开中断，拿进程表锁，整理队列，选出最高级别的可运行进程，
//! 切换过去；进程通过 [`Kernel::sched`] 交回 CPU 后做时间片记账。
//!
//! 进程表锁跨越上下文切换：调度器持锁切入进程，进程负责释放；
//! 进程持锁 (sched) 切回调度器，调度器负责释放。

use core::sync::atomic::Ordering;

use crate::hal::Platform;
use crate::kernel::{Kernel, TableGuard};
use crate::process::ProcState;

impl<P: Platform> Kernel<P> {
    /// 每 CPU 调度器循环
    ///
    /// 对应 xv6 的 scheduler()。没有可运行进程时原地自旋。
    pub fn scheduler(&self) -> ! {
        log::debug!("cpu{}: scheduler starting", self.cpuid());
        loop {
            if !self.schedule_once() {
                core::hint::spin_loop();
            }
        }
    }

    /// 进行一轮调度，没有可运行进程时返回 false
    pub fn schedule_once(&self) -> bool {
        // 空转时也要让中断进来
        self.platform().intr_on();

        let mut t = self.ptable.lock(self);
        t.compact();

        let Some(slot) = t.select() else {
            return false;
        };

        let cpu = self.mycpu();
        cpu.set_proc(Some(slot));
        {
            let p = &t.procs[slot];
            if let (Some(pgdir), Some(kstack)) = (p.pgdir.as_ref(), p.kstack.as_ref()) {
                self.platform().switch_uvm(pgdir, kstack);
            }
        }
        t.begin_run(slot);

        #[cfg(feature = "debug_log")]
        log::trace!(
            "cpu{}: run pid {} (pri {:?}, slice {})",
            self.platform().cpu_id(),
            t.procs[slot].pid,
            t.procs[slot].priority,
            t.procs[slot].time_slice
        );

        let next = &t.procs[slot].context as *const P::Context;
        // 持有进程表锁，中断已关
        unsafe { self.platform().switch(cpu.scheduler_ptr(), next) };

        // 进程已经交回 CPU，锁仍由本 CPU 持有
        self.platform().switch_kvm();
        t.finish_run(slot);

        #[cfg(feature = "debug_log")]
        log::trace!(
            "cpu{}: pid {} back as {:?}, slice {}",
            self.platform().cpu_id(),
            t.procs[slot].pid,
            t.procs[slot].state,
            t.procs[slot].time_slice
        );

        cpu.set_proc(None);
        true
    }

    /// 从当前进程切回本 CPU 的调度器
    ///
    /// 调用者必须只持有进程表锁，并且已经把自己的状态改为非 Running。
    /// 返回时进程表锁仍然持有，但可能已经换到了另一个 CPU 上。
    ///
    /// intena 属于这个内核线程而不是 CPU，所以跨切换保存和恢复。
    pub(crate) fn sched<'a>(&'a self, mut t: TableGuard<'a, P>) -> TableGuard<'a, P> {
        let cpu = self.mycpu();
        let Some(slot) = cpu.proc() else {
            panic!("sched no proc");
        };

        if !self.ptable.holding(self) {
            panic!("sched ptable.lock");
        }
        if cpu.noff() != 1 {
            panic!("sched locks");
        }
        if t.procs[slot].state == ProcState::Running {
            panic!("sched running");
        }
        if self.platform().intr_get() {
            panic!("sched interruptible");
        }

        let intena = cpu.intena();
        let ctx = &mut t.procs[slot].context as *mut P::Context;
        unsafe { self.platform().switch(ctx, cpu.scheduler_ptr()) };
        self.mycpu().set_intena(intena);
        t
    }

    /// 主动让出 CPU，对应 xv6 的 yield()
    pub fn yield_now(&self) {
        let Some(slot) = self.myproc() else {
            return;
        };
        let mut t = self.ptable.lock(self);
        t.procs[slot].state = ProcState::Runnable;
        let t = self.sched(t);
        drop(t);
    }

    /// 新进程第一次被调度时执行
    ///
    /// 释放调度器切换前获取的进程表锁；内核生命周期内第一次调用时
    /// 执行平台在进程上下文中的初始化（可能睡眠，不能放在 main 中）。
    pub fn forkret(&self) {
        // 锁是调度器拿的，guard 在调度器栈上
        unsafe { self.ptable.force_release(self) };

        if !self.first_run_done.swap(true, Ordering::AcqRel) {
            log::debug!("forkret: running first-process initialisation");
            self.platform().first_run();
        }
    }
}
