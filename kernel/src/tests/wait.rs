// 测试：wait
//
// 测试内容：
// 1. 没有子进程时立即返回 ECHILD
// 2. 僵尸子进程只被回收一次，资源全部释放
// 3. 父进程在 wait 中睡眠，子进程 exit 时被唤醒
// 4. 等待期间被 kill 返回 ECHILD

use std::sync::atomic::Ordering::SeqCst;
use std::sync::{Arc, Mutex};

use super::sim::{boot, idle, run, run_until, state_of};
use crate::errno::Errno;
use crate::process::{Pid, ProcState};

type Record = Arc<Mutex<Vec<Result<Pid, Errno>>>>;

fn record() -> (Record, Record) {
    let r = Arc::new(Mutex::new(Vec::new()));
    (r.clone(), r)
}

#[test]
fn test_wait_without_children() {
    let (results, out) = record();
    let k = boot(move |k| {
        let r = k.wait();
        out.lock().unwrap().push(r);
        idle(k);
    });
    assert_eq!(run(k, 1), 1);
    assert_eq!(*results.lock().unwrap(), [Err(Errno::NoChild)]);
}

#[test]
fn test_reap_exactly_once() {
    let (results, out) = record();
    let k = boot(move |k| {
        let pid = k.fork().unwrap();
        k.platform().install(pid, |_| {});
        out.lock().unwrap().push(Ok(pid));
        let r = k.wait();
        out.lock().unwrap().push(r);
        let r = k.wait();
        out.lock().unwrap().push(r);
        idle(k);
    });

    assert!(run_until(k, 10, |_| results.lock().unwrap().len() == 3));
    let results = results.lock().unwrap().clone();
    let child = results[0].unwrap();
    assert_eq!(results[1], Ok(child));
    assert_eq!(results[2], Err(Errno::NoChild));

    assert_eq!(state_of(k, child), None);
    assert_eq!(k.platform().kstacks.load(SeqCst), 1);
    assert_eq!(k.platform().pgdirs.load(SeqCst), 1);
}

#[test]
fn test_parent_sleeps_until_child_exits() {
    let (results, out) = record();
    let k = boot(move |k| {
        let pid = k.fork().unwrap();
        k.platform().install(pid, |k| {
            for _ in 0..3 {
                k.yield_now();
            }
        });
        let r = k.wait();
        out.lock().unwrap().push(r);
        idle(k);
    });

    // init 进入 wait 后睡眠，子进程运行 4 轮后退出
    assert_eq!(run(k, 1), 1);
    assert_eq!(state_of(k, 1), Some(ProcState::Sleeping));
    assert_eq!(run(k, 4), 4);
    assert_eq!(state_of(k, 1), Some(ProcState::Runnable));
    assert!(results.lock().unwrap().is_empty());

    assert_eq!(run(k, 1), 1);
    assert_eq!(*results.lock().unwrap(), [Ok(2)]);
}

#[test]
fn test_killed_while_waiting() {
    let (results, out) = record();
    let k = boot(move |k| {
        let pid = k.fork().unwrap();
        k.platform().install(pid, |k| idle(k));
        let r = k.wait();
        out.lock().unwrap().push(r);
        idle(k);
    });

    // init 在 wait 中睡眠，子进程在 idle 中睡眠
    assert_eq!(run(k, 3), 2);
    assert_eq!(state_of(k, 1), Some(ProcState::Sleeping));

    k.kill(1).unwrap();
    assert_eq!(state_of(k, 1), Some(ProcState::Runnable));
    assert_eq!(run(k, 1), 1);
    assert_eq!(*results.lock().unwrap(), [Err(Errno::NoChild)]);
    assert_eq!(state_of(k, 2), Some(ProcState::Sleeping));
}
