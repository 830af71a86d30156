//! 场景测试
//!
//! 在主机上用 [`sim::Sim`] 平台运行真实的调度器循环。
//! 每个文件覆盖一个方面：
//! - `scheduler`: 优先级选择、时间片与队列顺序
//! - `fork`: 进程创建、优先级继承、失败回滚
//! - `wait`: 回收僵尸进程、ECHILD
//! - `process_tree`: 孤儿进程过继给 init
//! - `sleep_wakeup`: 条件等待与 kill 唤醒
//! - `smp_schedule`: 多个 CPU 同时调度
//! - `boundary`: 参数检查与致命错误
//!
//! 运行测试：
//! ```bash
//! cargo test --package tern
//! ```


mod smp_schedule;
mod wait;
