// 测试：多 CPU 调度
//
// 两个调度器线程共享就绪队列，四个子进程交替让出 CPU 后退出，
// init 回收全部子进程。测试线程绑定到一个不运行调度器的 CPU 上。

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering::SeqCst};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use super::sim::{self, boot, idle};
use crate::config::MAX_CPUS;
use crate::process::Pid;

const NCHILD: usize = 4;
const NCPU: usize = 2;

#[test]
fn test_two_cpus_share_queues() {
    let forked: Arc<Mutex<BTreeSet<Pid>>> = Arc::new(Mutex::new(BTreeSet::new()));
    let reaped: Arc<Mutex<BTreeSet<Pid>>> = Arc::new(Mutex::new(BTreeSet::new()));
    let ticks = Arc::new(Mutex::new(0usize));

    let (f_out, r_out, t_out) = (forked.clone(), reaped.clone(), ticks.clone());
    let k = boot(move |k| {
        for _ in 0..NCHILD {
            let pid = k.fork().unwrap();
            let t = t_out.clone();
            k.platform().install(pid, move |k| {
                for _ in 0..20 {
                    *t.lock().unwrap() += 1;
                    k.yield_now();
                }
            });
            f_out.lock().unwrap().insert(pid);
        }
        while let Ok(pid) = k.wait() {
            r_out.lock().unwrap().insert(pid);
        }
        idle(k);
    });

    assert!(NCPU < MAX_CPUS);
    sim::bind_cpu(MAX_CPUS - 1);

    let stop = Arc::new(AtomicBool::new(false));
    let cpus: Vec<_> = (0..NCPU)
        .map(|id| {
            let stop = stop.clone();
            thread::spawn(move || {
                sim::bind_cpu(id);
                while !stop.load(SeqCst) {
                    if !k.schedule_once() {
                        thread::yield_now();
                    }
                }
            })
        })
        .collect();

    let deadline = Instant::now() + Duration::from_secs(20);
    while reaped.lock().unwrap().len() < NCHILD && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(1));
    }
    stop.store(true, SeqCst);
    for cpu in cpus {
        cpu.join().unwrap();
    }

    assert_eq!(*reaped.lock().unwrap(), *forked.lock().unwrap());
    assert_eq!(*ticks.lock().unwrap(), NCHILD * 20);
    assert_eq!(k.platform().kstacks.load(SeqCst), 1);
    sim::assert_queue_membership(k);
}
