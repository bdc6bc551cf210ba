//! Run queue counters against the run lists under random operation mixes

use ras_sched::scheduler::{CpuId, DequeueFlags, EnqueueFlags, TickOutcome};
use ras_sched::RasConfig;

use crate::mock::{add_tasks, host, locked_total, nr_running, run_list, scheduler_with_config, task, TestScheduler};

const CPUS: u16 = 2;
const TASKS: u32 = 12;

/// xorshift64, enough to shuffle operations reproducibly
struct Rng(u64);

impl Rng {
    fn next(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }

    fn below(&mut self, n: u64) -> u64 {
        self.next() % n
    }
}

fn check_all(sched: &TestScheduler) {
    for cpu in 0..CPUS {
        sched.validate(cpu).unwrap();
        let linked: u64 = sched
            .inspect(cpu, |rq, tasks| {
                rq.iter(tasks)
                    .map(|t| tasks.get(t).map(|e| e.old_wcounts()).unwrap_or(0))
                    .sum()
            })
            .unwrap();
        assert_eq!(locked_total(sched, cpu), linked);
        assert_eq!(sched.total_wcounts(cpu), linked);
        assert_eq!(nr_running(sched, cpu), run_list(sched, cpu).len());
        assert_eq!(host(sched).nr_running(cpu), nr_running(sched, cpu) as i64);
    }
}

fn queued_on(sched: &TestScheduler, id: u32) -> Option<CpuId> {
    sched.entity(task(id)).and_then(|e| e.queued_on())
}

fn run_mix(seed: u64, steps: usize) {
    let sched = scheduler_with_config(CPUS, RasConfig::from_cmdline("ras.timeslice=1"));
    let tasks: Vec<(u32, u64)> = (1..=TASKS).map(|id| (id, 0)).collect();
    add_tasks(&sched, &tasks);
    for id in (1..=TASKS).step_by(4) {
        host(&sched).set_group(task(id), "/bg_non_interactive");
    }

    let mut rng = Rng(seed);
    for _ in 0..steps {
        let id = rng.below(TASKS as u64) as u32 + 1;
        let cpu = rng.below(CPUS as u64) as CpuId;

        match rng.below(7) {
            0 | 1 => {
                let flags = if rng.below(4) == 0 { EnqueueFlags::HEAD } else { EnqueueFlags::empty() };
                let was_queued = queued_on(&sched, id).is_some();
                let result = sched.enqueue(cpu, task(id), flags);
                assert_eq!(result.is_ok(), !was_queued);
                assert!(queued_on(&sched, id).is_some());
            }
            2 => {
                if let Some(on) = queued_on(&sched, id) {
                    sched.dequeue(on, task(id), DequeueFlags::SLEEP).unwrap();
                    if sched.current(on) == Some(task(id)) {
                        sched.set_curr(on, None).unwrap();
                    }
                }
            }
            3 => {
                sched.requeue(cpu, task(id), rng.below(2) == 0).unwrap();
            }
            4 => {
                // writes keep growing, or the trace restarts from zero
                let wcounts = if rng.below(5) == 0 { 0 } else { rng.below(1_000) };
                host(&sched).set_wcounts(task(id), wcounts);
            }
            5 => {
                if let Some(next) = sched.pick_next(cpu).unwrap() {
                    sched.set_curr(cpu, Some(next)).unwrap();
                }
            }
            _ => {
                let before = nr_running(&sched, cpu);
                if let Some(outcome) = sched.tick(cpu).unwrap() {
                    if outcome == TickOutcome::Requeued {
                        assert!(before > 1);
                    }
                }
                assert_eq!(nr_running(&sched, cpu), before);
            }
        }

        check_all(&sched);
    }
}

#[test]
fn random_mix_keeps_counters_exact() {
    for seed in [0x9e37_79b9_7f4a_7c15u64, 1, 0xdead_beef, 42] {
        run_mix(seed, 2_000);
    }
}

#[test]
fn foreground_weights_stay_in_range_under_churn() {
    let sched = scheduler_with_config(1, RasConfig::new());
    let tasks: Vec<(u32, u64)> = (1..=8).map(|id| (id, 0)).collect();
    add_tasks(&sched, &tasks);
    let mut rng = Rng(7);

    for _ in 0..500 {
        let id = rng.below(8) as u32 + 1;
        host(&sched).set_wcounts(task(id), rng.below(10_000));
        if queued_on(&sched, id).is_some() {
            sched.dequeue(0, task(id), DequeueFlags::empty()).unwrap();
        } else {
            sched.enqueue(0, task(id), EnqueueFlags::empty()).unwrap();
            let entity = sched.entity(task(id)).unwrap();
            assert!((1..=10).contains(&entity.weight()));
            assert_eq!(entity.time_slice(), 10 * entity.weight());
        }
    }
    sched.validate(0).unwrap();
}
