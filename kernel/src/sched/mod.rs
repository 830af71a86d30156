//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 调度器模块
//!
//! 四级优先级调度 (0 最低，3 最高)：
//! - 每级一条就绪队列，所有 CPU 共享
//! - 总是先运行最高非空级别的队头进程
//! - 同级别内时间片轮转，时间片用完回到本级别队尾，不降级
//! - 调度入口: scheduler() -> 切换到进程 -> sched() -> 回到 scheduler()

pub mod control;
pub mod cpu;
pub mod priority;
pub mod pstat;
pub mod queue;
pub mod sched;

pub use priority::Priority;
pub use pstat::PStat;
pub use queue::ReadyQueues;
