//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 优先级就绪队列
//!
//! 每个优先级一条有序队列，队头先被调度。队列是建立在进程表槽位上的
//! 侵入式双向链表：链接数组与进程表同样大小，以槽位号为下标，
//! 入队、出队、从中间删除都是 O(1)，且不改变其他元素的相对顺序。
//!
//! 一个槽位同一时刻最多在一条队列中。

use crate::config::{NLEVELS, NPROC};
use crate::process::SlotId;
use crate::sched::priority::Priority;

/// 空链接
const NIL: usize = usize::MAX;

#[derive(Debug, Copy, Clone)]
struct Link {
    prev: usize,
    next: usize,
    /// 所在队列，None 表示不在任何队列中
    level: Option<Priority>,
}

impl Link {
    const EMPTY: Link = Link {
        prev: NIL,
        next: NIL,
        level: None,
    };
}

#[derive(Debug, Copy, Clone)]
struct Level {
    head: usize,
    tail: usize,
    len: usize,
}

impl Level {
    const EMPTY: Level = Level {
        head: NIL,
        tail: NIL,
        len: 0,
    };
}

pub struct ReadyQueues {
    links: [Link; NPROC],
    levels: [Level; NLEVELS],
}

impl ReadyQueues {
    pub const fn new() -> Self {
        Self {
            links: [Link::EMPTY; NPROC],
            levels: [Level::EMPTY; NLEVELS],
        }
    }

    /// 槽位所在的队列
    #[inline]
    pub fn level_of(&self, slot: SlotId) -> Option<Priority> {
        self.links[slot].level
    }

    #[inline]
    pub fn contains(&self, slot: SlotId) -> bool {
        self.level_of(slot).is_some()
    }

    pub fn len(&self, prio: Priority) -> usize {
        self.levels[prio.level()].len
    }

    /// 所有队列都为空
    pub fn is_empty(&self) -> bool {
        self.levels.iter().all(|l| l.len == 0)
    }

    pub fn front(&self, prio: Priority) -> Option<SlotId> {
        match self.levels[prio.level()].head {
            NIL => None,
            slot => Some(slot),
        }
    }

    /// 插入队尾
    pub fn push_back(&mut self, slot: SlotId, prio: Priority) {
        self.assert_unqueued(slot);
        let level = &mut self.levels[prio.level()];
        let old_tail = level.tail;

        self.links[slot] = Link {
            prev: old_tail,
            next: NIL,
            level: Some(prio),
        };
        if old_tail == NIL {
            level.head = slot;
        } else {
            self.links[old_tail].next = slot;
        }
        level.tail = slot;
        level.len += 1;
    }

    /// 插入队头
    pub fn push_front(&mut self, slot: SlotId, prio: Priority) {
        self.assert_unqueued(slot);
        let level = &mut self.levels[prio.level()];
        let old_head = level.head;

        self.links[slot] = Link {
            prev: NIL,
            next: old_head,
            level: Some(prio),
        };
        if old_head == NIL {
            level.tail = slot;
        } else {
            self.links[old_head].prev = slot;
        }
        level.head = slot;
        level.len += 1;
    }

    /// 从所在队列中摘除，返回原来的级别
    pub fn remove(&mut self, slot: SlotId) -> Option<Priority> {
        let Link { prev, next, level } = self.links[slot];
        let prio = level?;
        let lv = &mut self.levels[prio.level()];

        if prev == NIL {
            lv.head = next;
        } else {
            self.links[prev].next = next;
        }
        if next == NIL {
            lv.tail = prev;
        } else {
            self.links[next].prev = prev;
        }
        lv.len -= 1;

        self.links[slot] = Link::EMPTY;
        Some(prio)
    }

    /// 从队头到队尾遍历
    pub fn iter(&self, prio: Priority) -> Iter<'_> {
        Iter {
            queues: self,
            cursor: self.levels[prio.level()].head,
        }
    }

    /// 丢弃每条队列开头的失效项，返回丢弃的数量
    ///
    /// 只检查队头：遇到第一个有效项就停止，队列中间的失效项保留到
    /// 它们移动到队头为止。
    pub fn compact(&mut self, mut stale: impl FnMut(SlotId) -> bool) -> usize {
        let mut dropped = 0;
        for prio in Priority::descending() {
            while let Some(slot) = self.front(prio) {
                if !stale(slot) {
                    break;
                }
                self.remove(slot);
                dropped += 1;
            }
        }
        dropped
    }

    /// 从最高级别开始，返回第一个可运行的项
    ///
    /// 每个级别独立扫描。
    pub fn select(&self, mut runnable: impl FnMut(SlotId) -> bool) -> Option<(Priority, SlotId)> {
        for prio in Priority::descending() {
            if let Some(slot) = self.iter(prio).find(|&s| runnable(s)) {
                return Some((prio, slot));
            }
        }
        None
    }

    fn assert_unqueued(&self, slot: SlotId) {
        if let Some(prio) = self.links[slot].level {
            panic!("enqueue: slot {} already in queue {}", slot, prio);
        }
    }
}

impl Default for ReadyQueues {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Iter<'a> {
    queues: &'a ReadyQueues,
    cursor: usize,
}

impl Iterator for Iter<'_> {
    type Item = SlotId;

    fn next(&mut self) -> Option<SlotId> {
        if self.cursor == NIL {
            return None;
        }
        let slot = self.cursor;
        self.cursor = self.queues.links[slot].next;
        Some(slot)
    }
}
