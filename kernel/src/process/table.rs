//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 进程表
//!
//! 固定大小的 PCB 数组加上四级就绪队列，整体由 `Kernel::ptable` 一把锁保护。
//! 这里的所有方法都假定调用者已持有该锁。
//!
//! 队列成员关系：
//! - Runnable 的进程恰好在一条队列中，且级别等于其 priority
//! - 其他状态的进程不在任何队列中
//! - 例外：进程被选中运行时先出队再置为 Running，运行结束后由
//!   `finish_run` 决定放回队头还是队尾

use crate::config::NPROC;
use crate::hal::Platform;
use crate::process::pid::PidAllocator;
use crate::process::proc::{Pid, Proc, ProcName, ProcState, SlotId};
use crate::sched::priority::Priority;
use crate::sched::pstat::PStat;
use crate::sched::queue::ReadyQueues;
use crate::sync::sleep::Channel;

pub struct ProcTable<P: Platform> {
    pub(crate) procs: [Proc<P>; NPROC],
    pub(crate) queues: ReadyQueues,
    pids: PidAllocator,
    /// 第一个进程，孤儿进程的收养者
    pub(crate) init: Option<SlotId>,
}

/// 回收僵尸进程时从槽位中取出的资源，由调用者在放锁后释放
pub(crate) struct Reaped<P: Platform> {
    pub pid: Pid,
    pub kstack: Option<P::KernelStack>,
    pub pgdir: Option<P::PageTable>,
}

impl<P: Platform> ProcTable<P> {
    pub fn new() -> Self {
        Self {
            procs: core::array::from_fn(|_| Proc::new()),
            queues: ReadyQueues::new(),
            pids: PidAllocator::new(),
            init: None,
        }
    }

    /// 找一个 Unused 槽位，置为 Embryo 并分配新 PID
    ///
    /// 对应 xv6 allocproc() 中持锁的部分
    pub fn allocate(&mut self) -> Option<SlotId> {
        let slot = self.procs.iter().position(|p| p.state == ProcState::Unused)?;
        let pid = self.pids.alloc()?;

        let p = &mut self.procs[slot];
        p.state = ProcState::Embryo;
        p.pid = pid;
        p.priority = None;
        p.time_slice = 0;
        p.ticks = Default::default();
        p.qtail = Default::default();
        p.parent = None;
        p.killed = false;
        p.chan = None;
        p.sz = 0;
        p.name = ProcName::EMPTY;
        Some(slot)
    }

    /// 槽位重新变为 Unused
    ///
    /// 资源必须已经取走。
    pub fn release(&mut self, slot: SlotId) {
        if self.queues.remove(slot).is_some() {
            panic!("release: slot {} still queued", slot);
        }
        let p = &mut self.procs[slot];
        p.pid = 0;
        p.parent = None;
        p.name = ProcName::EMPTY;
        p.killed = false;
        p.chan = None;
        p.priority = None;
        p.time_slice = 0;
        p.sz = 0;
        p.state = ProcState::Unused;
    }

    /// 撤销一个尚未运行过的 Embryo，返回已分配的内核栈和页表
    pub fn abandon_embryo(&mut self, slot: SlotId) -> (Option<P::KernelStack>, Option<P::PageTable>) {
        let p = &mut self.procs[slot];
        if p.state != ProcState::Embryo {
            panic!("abandon_embryo: slot {} is {:?}", slot, p.state);
        }
        let resources = (p.kstack.take(), p.pgdir.take());
        self.release(slot);
        resources
    }

    /// 按 PID 查找在用槽位
    pub fn find(&self, pid: Pid) -> Option<SlotId> {
        if pid < 1 {
            return None;
        }
        self.procs
            .iter()
            .position(|p| p.pid == pid && p.state != ProcState::Unused)
    }

    #[inline]
    pub fn proc(&self, slot: SlotId) -> &Proc<P> {
        &self.procs[slot]
    }

    pub fn pid_of(&self, slot: SlotId) -> Pid {
        self.procs[slot].pid
    }

    /// 进程的等待通道：以 PCB 地址区分
    pub fn chan_of(&self, slot: SlotId) -> Channel {
        Channel::of(&self.procs[slot])
    }

    /// 置为 Runnable 并挂到所在级别的队尾，时间片清零
    pub fn make_runnable(&mut self, slot: SlotId) {
        let p = &mut self.procs[slot];
        let Some(prio) = p.priority else {
            panic!("make_runnable: pid {} has no priority", p.pid);
        };
        p.state = ProcState::Runnable;
        p.time_slice = 0;
        p.chan = None;
        if !self.queues.contains(slot) {
            self.enqueue_tail(slot, prio);
        }
    }

    fn enqueue_tail(&mut self, slot: SlotId, prio: Priority) {
        self.queues.push_back(slot, prio);
        self.procs[slot].qtail[prio.level()] += 1;
    }

    /// 修改优先级
    ///
    /// Runnable 的进程从原队列摘除并挂到新队列队尾；其他状态只改字段，
    /// 下次变为 Runnable 时自然进入正确的队列。级别改变时时间片清零。
    pub fn set_priority(&mut self, slot: SlotId, prio: Priority) -> Priority {
        let p = &mut self.procs[slot];
        if p.priority == Some(prio) {
            return prio;
        }
        p.priority = Some(prio);
        p.time_slice = 0;

        if p.state == ProcState::Runnable {
            self.queues.remove(slot);
            self.enqueue_tail(slot, prio);
        }
        prio
    }

    /// 唤醒在 `chan` 上睡眠的所有进程，对应 xv6 的 wakeup1()
    pub fn wakeup(&mut self, chan: Channel) -> usize {
        let mut woken = 0;
        for slot in 0..NPROC {
            let p = &self.procs[slot];
            if p.state == ProcState::Sleeping && p.chan == Some(chan) {
                self.make_runnable(slot);
                woken += 1;
            }
        }
        woken
    }

    /// 丢弃队头的非 Runnable 项
    pub fn compact(&mut self) -> usize {
        let procs = &self.procs;
        self.queues
            .compact(|slot| procs[slot].state != ProcState::Runnable)
    }

    /// 下一个要运行的进程
    pub fn select(&self) -> Option<SlotId> {
        self.queues
            .select(|slot| self.procs[slot].state == ProcState::Runnable)
            .map(|(_, slot)| slot)
    }

    /// 选中的进程出队并置为 Running
    pub fn begin_run(&mut self, slot: SlotId) {
        let p = &mut self.procs[slot];
        if p.state != ProcState::Runnable {
            panic!("begin_run: pid {} is {:?}", p.pid, p.state);
        }
        p.state = ProcState::Running;
        self.queues.remove(slot);
    }

    /// 进程交回 CPU 后的记账
    ///
    /// 记一个 tick。仍为 Runnable 时：用完时间片则清零并挂到本级别队尾，
    /// 否则放回队头；不再 Runnable 则不入队。
    pub fn finish_run(&mut self, slot: SlotId) {
        let p = &mut self.procs[slot];
        let Some(prio) = p.priority else {
            panic!("finish_run: pid {} has no priority", p.pid);
        };
        p.time_slice += 1;
        p.ticks[prio.level()] += 1;

        if p.state != ProcState::Runnable {
            return;
        }
        if p.time_slice >= prio.quantum() {
            p.time_slice = 0;
            self.enqueue_tail(slot, prio);
        } else {
            self.queues.push_front(slot, prio);
        }
    }

    /// 把 `from` 的所有子进程过继给 `to`，返回其中是否有僵尸进程
    pub fn reparent_children(&mut self, from: SlotId, to: SlotId) -> bool {
        let mut zombie = false;
        for p in self.procs.iter_mut() {
            if p.parent == Some(from) {
                p.parent = Some(to);
                zombie |= p.state == ProcState::Zombie;
            }
        }
        zombie
    }

    /// 取出僵尸进程的资源并释放槽位
    pub(crate) fn reap(&mut self, slot: SlotId) -> Reaped<P> {
        let p = &mut self.procs[slot];
        if p.state != ProcState::Zombie {
            panic!("reap: pid {} is {:?}", p.pid, p.state);
        }
        let reaped = Reaped {
            pid: p.pid,
            kstack: p.kstack.take(),
            pgdir: p.pgdir.take(),
        };
        self.release(slot);
        reaped
    }

    /// 填充 getpinfo 快照
    pub fn snapshot(&self, out: &mut PStat) {
        for (i, p) in self.procs.iter().enumerate() {
            out.inuse[i] = (p.pid != 0) as i32;
            out.pid[i] = p.pid;
            out.priority[i] = p.priority.map_or(-1, Priority::as_i32);
            out.state[i] = p.state as i32;
            for l in 0..p.ticks.len() {
                out.ticks[i][l] = p.ticks[l] as i32;
                out.qtail[i][l] = p.qtail[l] as i32;
            }
        }
    }
}

impl<P: Platform> Default for ProcTable<P> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::sim::Sim;

    fn table() -> Box<ProcTable<Sim>> {
        Box::new(ProcTable::new())
    }

    fn prio(level: i32) -> Priority {
        Priority::try_from(level).unwrap()
    }

    /// 按 PID 列出某级别队列
    fn queue(t: &ProcTable<Sim>, level: i32) -> Vec<Pid> {
        t.queues.iter(prio(level)).map(|s| t.pid_of(s)).collect()
    }

    fn spawn(t: &mut ProcTable<Sim>, level: i32) -> SlotId {
        let slot = t.allocate().unwrap();
        t.procs[slot].priority = Some(prio(level));
        t.make_runnable(slot);
        slot
    }

    /// 模拟一次调度：选中、运行一个 tick、交回
    fn tick(t: &mut ProcTable<Sim>) -> Option<Pid> {
        t.compact();
        let slot = t.select()?;
        t.begin_run(slot);
        t.procs[slot].state = ProcState::Runnable;
        t.finish_run(slot);
        Some(t.pid_of(slot))
    }

    #[test]
    fn test_allocate_and_release() {
        let mut t = table();
        let a = t.allocate().unwrap();
        let b = t.allocate().unwrap();
        assert_ne!(a, b);
        assert_eq!(t.proc(a).state(), ProcState::Embryo);
        assert_eq!(t.pid_of(a), 1);
        assert_eq!(t.pid_of(b), 2);

        t.release(a);
        assert_eq!(t.proc(a).state(), ProcState::Unused);
        assert_eq!(t.find(1), None);

        // 槽位复用，PID 不复用
        let c = t.allocate().unwrap();
        assert_eq!(c, a);
        assert_eq!(t.pid_of(c), 3);
    }

    #[test]
    fn test_table_full() {
        let mut t = table();
        for _ in 0..NPROC {
            assert!(t.allocate().is_some());
        }
        assert_eq!(t.allocate(), None);
    }

    #[test]
    fn test_find_rejects_non_positive() {
        let mut t = table();
        t.allocate().unwrap();
        assert_eq!(t.find(0), None);
        assert_eq!(t.find(-5), None);
        assert_eq!(t.find(1), Some(0));
    }

    #[test]
    fn test_priority_move_scenario() {
        let mut t = table();
        // 让接下来的三个进程拿到 10、11、12
        for _ in 1..10 {
            let s = t.allocate().unwrap();
            t.release(s);
        }
        let a = spawn(&mut t, 3);
        let b = spawn(&mut t, 3);
        let _c = spawn(&mut t, 3);
        assert_eq!(t.pid_of(a), 10);
        assert_eq!(queue(&t, 3), [10, 11, 12]);

        t.set_priority(b, prio(0));
        assert_eq!(queue(&t, 3), [10, 12]);
        assert_eq!(queue(&t, 0), [11]);
        assert_eq!(t.proc(b).qtail()[0], 1);

        // 10 用完 8 个 tick 的时间片后回到队尾
        for _ in 0..8 {
            assert_eq!(tick(&mut t), Some(10));
        }
        assert_eq!(queue(&t, 3), [12, 10]);
        assert_eq!(t.proc(a).time_slice(), 0);
        assert_eq!(t.proc(a).ticks()[3], 8);
        assert_eq!(t.proc(a).qtail()[3], 2);
    }

    #[test]
    fn test_quantum_per_level() {
        let mut t = table();
        let s = spawn(&mut t, 1);
        let other = spawn(&mut t, 1);

        for _ in 0..prio(1).quantum() - 1 {
            assert_eq!(tick(&mut t), Some(t.pid_of(s)));
        }
        assert_eq!(t.queues.front(prio(1)), Some(s));
        assert_eq!(tick(&mut t), Some(t.pid_of(s)));
        assert_eq!(t.queues.front(prio(1)), Some(other));
        assert_eq!(t.proc(s).time_slice(), 0);
    }

    #[test]
    fn test_set_priority_not_runnable() {
        let mut t = table();
        let s = spawn(&mut t, 2);
        t.begin_run(s);
        t.procs[s].state = ProcState::Sleeping;
        t.finish_run(s);
        assert!(!t.queues.contains(s));

        t.set_priority(s, prio(1));
        assert!(!t.queues.contains(s));
        assert_eq!(t.proc(s).priority(), Some(prio(1)));
    }

    #[test]
    fn test_set_priority_resets_time_slice() {
        let mut t = table();
        let s = spawn(&mut t, 0);
        let other = spawn(&mut t, 3);
        t.begin_run(other);
        t.procs[other].state = ProcState::Sleeping;
        t.finish_run(other);

        for _ in 0..15 {
            assert_eq!(tick(&mut t), Some(t.pid_of(s)));
        }
        assert_eq!(t.proc(s).time_slice(), 15);

        // 升到 3 级后拿到完整的 8 个 tick
        t.set_priority(s, prio(3));
        assert_eq!(t.proc(s).time_slice(), 0);
        t.make_runnable(other);
        assert_eq!(queue(&t, 3), [t.pid_of(s), t.pid_of(other)]);
        for _ in 0..prio(3).quantum() {
            assert_eq!(tick(&mut t), Some(t.pid_of(s)));
        }
        assert_eq!(queue(&t, 3), [t.pid_of(other), t.pid_of(s)]);

        // 同级别设置不清零
        tick(&mut t);
        assert_eq!(t.proc(other).time_slice(), 1);
        t.set_priority(other, prio(3));
        assert_eq!(t.proc(other).time_slice(), 1);
    }


    #[test]
    fn test_wakeup_fresh_quantum() {
        let mut t = table();
        let s = spawn(&mut t, 3);
        tick(&mut t);
        tick(&mut t);
        assert_eq!(t.proc(s).time_slice(), 2);

        t.begin_run(s);
        let chan = Channel::from_raw(0x1000);
        t.procs[s].chan = Some(chan);
        t.procs[s].state = ProcState::Sleeping;
        t.finish_run(s);
        assert_eq!(queue(&t, 3), Vec::<Pid>::new());

        assert_eq!(t.wakeup(Channel::from_raw(0x2000)), 0);
        assert_eq!(t.wakeup(chan), 1);
        assert_eq!(t.proc(s).state(), ProcState::Runnable);
        assert_eq!(t.proc(s).time_slice(), 0);
        assert_eq!(queue(&t, 3), [t.pid_of(s)]);
    }

    #[test]
    fn test_compact_drops_stale_heads() {
        let mut t = table();
        let a = spawn(&mut t, 3);
        let b = spawn(&mut t, 3);
        // 绕过 finish_run 直接改状态，留下失效的队头
        t.procs[a].state = ProcState::Sleeping;
        assert_eq!(t.compact(), 1);
        assert_eq!(t.queues.front(prio(3)), Some(b));
    }

    #[test]
    fn test_reparent_reports_zombie() {
        let mut t = table();
        let init = t.allocate().unwrap();
        let parent = t.allocate().unwrap();
        let kid1 = t.allocate().unwrap();
        let kid2 = t.allocate().unwrap();
        t.procs[kid1].parent = Some(parent);
        t.procs[kid2].parent = Some(parent);

        assert!(!t.reparent_children(parent, init));
        assert_eq!(t.proc(kid1).parent(), Some(init));

        t.procs[kid2].state = ProcState::Zombie;
        t.procs[kid2].parent = Some(parent);
        assert!(t.reparent_children(parent, init));
    }

    #[test]
    fn test_snapshot_rows() {
        let mut t = table();
        let s = spawn(&mut t, 2);
        let e = t.allocate().unwrap();
        let mut st = Box::new(PStat::new());
        t.snapshot(&mut st);

        assert_eq!(st.inuse[s], 1);
        assert_eq!(st.pid[s], t.pid_of(s));
        assert_eq!(st.priority[s], 2);
        assert_eq!(st.state[s], ProcState::Runnable as i32);
        assert_eq!(st.qtail[s][2], 1);
        assert_eq!(st.priority[e], -1);
        assert_eq!(st.state[e], ProcState::Embryo as i32);
        assert_eq!(st.inuse[NPROC - 1], 0);
    }
}
