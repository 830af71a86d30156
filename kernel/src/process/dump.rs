//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! procdump：列出进程表，用于控制台调试（xv6 中由 ^P 触发）

use core::fmt;

use crate::hal::Platform;
use crate::kernel::Kernel;
use crate::process::proc::ProcState;
use crate::sched::priority::Priority;

impl<P: Platform> Kernel<P> {
    /// 每个在用槽位输出一行 `pid state name pri`
    ///
    /// 不等待进程表锁，系统卡死时也能使用。
    pub fn procdump(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        let Some(t) = self.ptable.try_lock(self) else {
            return writeln!(out, "procdump: ptable busy");
        };
        for p in t.procs.iter().filter(|p| p.state != ProcState::Unused) {
            writeln!(
                out,
                "{} {} {} pri={}",
                p.pid,
                p.state.as_str(),
                p.name.as_str(),
                p.priority.map_or(-1, Priority::as_i32)
            )?;
        }
        Ok(())
    }
}
