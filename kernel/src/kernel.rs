//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 内核实例
//!
//! 进程表、每 CPU 状态和平台接口集中在一个 [`Kernel`] 中。
//! 嵌入方通常把它放在 `static` 里，每个 CPU 启动后调用 [`Kernel::scheduler`]。

use core::sync::atomic::AtomicBool;

use crate::config::MAX_CPUS;
use crate::hal::Platform;
use crate::process::table::ProcTable;
use crate::process::SlotId;
use crate::sched::cpu::Cpu;
use crate::sync::spinlock::{InterruptControl, SpinLock, SpinLockGuard};

/// 持有进程表锁的 guard
pub(crate) type TableGuard<'a, P> = SpinLockGuard<'a, ProcTable<P>, Kernel<P>>;

pub struct Kernel<P: Platform> {
    platform: P,
    /// 进程表与就绪队列，一把锁保护
    pub(crate) ptable: SpinLock<ProcTable<P>>,
    pub(crate) cpus: [Cpu<P>; MAX_CPUS],
    /// 第一个进程装入的用户程序
    pub(crate) initcode: &'static [u8],
    /// forkret 中的一次性初始化是否已经执行
    pub(crate) first_run_done: AtomicBool,
}

impl<P: Platform> Kernel<P> {
    pub fn new(platform: P, initcode: &'static [u8]) -> Self {
        Self {
            platform,
            ptable: SpinLock::new("ptable", ProcTable::new()),
            cpus: core::array::from_fn(|_| Cpu::new()),
            initcode,
            first_run_done: AtomicBool::new(false),
        }
    }

    #[inline]
    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// 当前 CPU，必须在关中断时调用
    ///
    /// 对应 xv6 的 mycpu()
    pub(crate) fn mycpu(&self) -> &Cpu<P> {
        if self.platform.intr_get() {
            panic!("mycpu called with interrupts enabled");
        }
        self.cpu_at(self.platform.cpu_id())
    }

    pub(crate) fn cpu_at(&self, id: usize) -> &Cpu<P> {
        match self.cpus.get(id) {
            Some(cpu) => cpu,
            None => panic!("unknown cpu {}", id),
        }
    }

    /// 当前 CPU 编号
    pub fn cpuid(&self) -> usize {
        self.push_off();
        let id = self.platform.cpu_id();
        self.pop_off();
        id
    }

    /// 当前 CPU 上运行的进程槽位
    ///
    /// 读取期间关中断，防止在读取过程中被调度到别的 CPU。
    pub fn myproc(&self) -> Option<SlotId> {
        self.push_off();
        let slot = self.mycpu().proc();
        self.pop_off();
        slot
    }
}

/// push_off/pop_off 嵌套计数
///
/// 两次 push_off 需要两次 pop_off 才能恢复；
/// 如果最外层 push_off 之前中断是关闭的，pop_off 之后仍然关闭。
impl<P: Platform> InterruptControl for Kernel<P> {
    fn push_off(&self) {
        let old = self.platform.intr_get();
        self.platform.intr_off();
        let cpu = self.mycpu();
        if cpu.noff() == 0 {
            cpu.set_intena(old);
        }
        cpu.inc_noff();
    }

    fn pop_off(&self) {
        if self.platform.intr_get() {
            panic!("pop_off - interruptible");
        }
        let cpu = self.mycpu();
        if cpu.noff() < 1 {
            panic!("pop_off");
        }
        if cpu.dec_noff() == 0 && cpu.intena() {
            self.platform.intr_on();
        }
    }

    fn current_cpu(&self) -> usize {
        self.platform.cpu_id()
    }
}
