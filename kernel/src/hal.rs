//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 平台接口
//!
//! 进程核心不直接操作硬件，也不实现内存管理和文件系统。
//! 它依赖的外部协作者全部通过 [`Platform`] 提供：
//! - CPU 标识与中断开关
//! - 上下文切换原语 (swtch)
//! - 内核栈分配
//! - 地址空间创建/复制/伸缩/销毁/激活
//! - 打开文件与工作目录的引用计数
//!
//! PCB 中由协作者拥有的字段以关联类型表示，核心只转交或复制，不解释其内容。

/// 外部协作者集合
pub trait Platform: Sync + Sized {
    /// 内核上下文（被调用者保存寄存器），swtch 的保存/恢复单位
    type Context: Default + Send;

    /// 用户态陷入帧
    type TrapFrame: Clone + Default + Send;

    /// 用户地址空间（页目录）
    type PageTable: Send;

    /// 内核栈
    type KernelStack: Send;

    /// 打开文件句柄
    type File: Send;

    /// inode 句柄（工作目录）
    type Inode: Send;

    // ------------------------------------------------------------------
    // CPU
    // ------------------------------------------------------------------

    /// 当前 CPU 编号，必须在关中断时调用
    fn cpu_id(&self) -> usize;

    fn intr_on(&self);

    fn intr_off(&self);

    /// 当前 CPU 是否开中断
    fn intr_get(&self) -> bool;

    // ------------------------------------------------------------------
    // 上下文切换
    // ------------------------------------------------------------------

    /// 保存当前寄存器到 `old`，从 `new` 恢复
    ///
    /// 只有当别的执行流切换回 `old` 时才返回。
    ///
    /// # Safety
    ///
    /// 两个指针都必须在切换期间有效；调用者必须已关中断。
    unsafe fn switch(&self, old: *mut Self::Context, new: *const Self::Context);

    /// 为新进程准备内核栈上的初始上下文
    ///
    /// 新上下文第一次被切换到时，必须先调用 `Kernel::forkret`，
    /// 然后按照陷入帧返回用户态。
    fn new_context(&self, kstack: &mut Self::KernelStack) -> Self::Context;

    /// 在第一个进程上下文中执行一次的初始化（可能睡眠）
    fn first_run(&self) {}

    // ------------------------------------------------------------------
    // 内核栈
    // ------------------------------------------------------------------

    fn alloc_kstack(&self) -> Option<Self::KernelStack>;

    fn free_kstack(&self, kstack: Self::KernelStack);

    // ------------------------------------------------------------------
    // 地址空间
    // ------------------------------------------------------------------

    /// 创建只含内核映射的页表
    fn setup_kvm(&self) -> Option<Self::PageTable>;

    /// 装入启动程序，返回用户内存大小
    fn init_uvm(&self, pgdir: &mut Self::PageTable, image: &[u8]) -> usize;

    /// 复制父进程 `sz` 字节的用户内存
    fn copy_uvm(&self, pgdir: &Self::PageTable, sz: usize) -> Option<Self::PageTable>;

    /// 把用户内存从 `old_sz` 扩展到 `new_sz`，返回新大小
    fn alloc_uvm(&self, pgdir: &mut Self::PageTable, old_sz: usize, new_sz: usize)
        -> Option<usize>;

    /// 把用户内存从 `old_sz` 收缩到 `new_sz`，返回新大小
    fn dealloc_uvm(&self, pgdir: &mut Self::PageTable, old_sz: usize, new_sz: usize)
        -> Option<usize>;

    fn free_vm(&self, pgdir: Self::PageTable);

    /// 切换到进程地址空间
    fn switch_uvm(&self, pgdir: &Self::PageTable, kstack: &Self::KernelStack);

    /// 切换回内核地址空间
    fn switch_kvm(&self);

    // ------------------------------------------------------------------
    // 陷入帧
    // ------------------------------------------------------------------

    /// 第一个进程的初始陷入帧（用户段、开中断、从地址 0 开始执行）
    fn user_trapframe(&self, sz: usize) -> Self::TrapFrame;

    /// 设置系统调用返回值寄存器
    fn set_return_value(&self, tf: &mut Self::TrapFrame, value: usize);

    // ------------------------------------------------------------------
    // 文件
    // ------------------------------------------------------------------

    fn file_dup(&self, file: &Self::File) -> Self::File;

    fn file_close(&self, file: Self::File);

    /// 根目录 inode
    fn root_inode(&self) -> Self::Inode;

    fn inode_dup(&self, inode: &Self::Inode) -> Self::Inode;

    /// 释放 inode 引用（在文件系统事务内，可能睡眠）
    fn inode_put(&self, inode: Self::Inode);
}
