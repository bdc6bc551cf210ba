//! Weights and timeslices as computed on enqueue

use ras_sched::scheduler::{DequeueFlags, EnqueueFlags, TaskClass};
use ras_sched::RasConfig;

use crate::mock::{add_tasks, host, locked_total, scheduler, scheduler_with_config, task, TestScheduler};

fn enqueue_all(sched: &TestScheduler, ids: &[u32]) {
    for &id in ids {
        sched.enqueue(0, task(id), EnqueueFlags::empty()).unwrap();
    }
}

#[test]
fn quiet_task_gets_full_slice() {
    let sched = scheduler(1);
    add_tasks(&sched, &[(1, 5_000), (2, 0)]);
    enqueue_all(&sched, &[1, 2]);

    let quiet = sched.entity(task(2)).unwrap();
    assert_eq!(quiet.weight(), 10);
    assert_eq!(quiet.time_slice(), 100);
    assert_eq!(quiet.class(), TaskClass::Foreground);
    assert_eq!(sched.get_rr_interval(task(2)), Some(100));
}

#[test]
fn sole_writer_gets_min_weight() {
    let sched = scheduler(1);
    add_tasks(&sched, &[(1, 100)]);
    enqueue_all(&sched, &[1]);

    let writer = sched.entity(task(1)).unwrap();
    assert_eq!(writer.weight(), 1);
    assert_eq!(writer.time_slice(), 10);
    assert_eq!(writer.old_wcounts(), 100);
    assert_eq!(locked_total(&sched, 0), 100);
}

#[test]
fn newcomer_with_small_share_keeps_full_weight() {
    let sched = scheduler(1);
    add_tasks(&sched, &[(1, 0), (2, 100), (3, 10)]);
    enqueue_all(&sched, &[1, 2, 3]);

    // bucket = ceil(110 / 10) = 11, share = 10 / 11 = 0
    let newcomer = sched.entity(task(3)).unwrap();
    assert_eq!(locked_total(&sched, 0), 110);
    assert_eq!(newcomer.weight(), 10);
    assert_eq!(newcomer.time_slice(), 100);
}

#[test]
fn newcomer_with_larger_share_is_penalized() {
    let sched = scheduler(1);
    add_tasks(&sched, &[(1, 0), (2, 100), (3, 55)]);
    enqueue_all(&sched, &[1, 2, 3]);

    // bucket = ceil(155 / 10) = 16, share = 55 / 16 = 3
    let newcomer = sched.entity(task(3)).unwrap();
    assert_eq!(locked_total(&sched, 0), 155);
    assert_eq!(newcomer.weight(), 7);
    assert_eq!(newcomer.time_slice(), 70);
}

#[test]
fn weights_stay_in_range() {
    let sched = scheduler(1);
    let counts = [0u64, 1, 9, 10, 99, 250, 1_000, 12_345, 3, 70];
    let tasks: Vec<(u32, u64)> = counts.iter().enumerate().map(|(i, &w)| (i as u32 + 1, w)).collect();
    add_tasks(&sched, &tasks);

    for &(id, _) in &tasks {
        sched.enqueue(0, task(id), EnqueueFlags::empty()).unwrap();
        let entity = sched.entity(task(id)).unwrap();
        assert!((1..=10).contains(&entity.weight()), "task {} weight {}", id, entity.weight());
        assert_eq!(entity.time_slice(), entity.weight() * 10);
    }
    assert_eq!(locked_total(&sched, 0), counts.iter().sum::<u64>());
    sched.validate(0).unwrap();
}

#[test]
fn background_task_bypasses_weighting() {
    let config = RasConfig::from_cmdline("ras.timeslice=10 ras.bg_timeslice=3");
    let sched = scheduler_with_config(1, config);
    add_tasks(&sched, &[(1, 500), (2, 40)]);
    host(&sched).set_group(task(1), "/bg_non_interactive");
    host(&sched).set_group(task(2), "/apps");

    enqueue_all(&sched, &[1, 2]);

    let bg = sched.entity(task(1)).unwrap();
    assert_eq!(bg.class(), TaskClass::Background);
    assert_eq!(bg.time_slice(), 3);
    assert_eq!(bg.old_wcounts(), 0);
    assert_eq!(bg.weight(), 10);

    // the background task's writes never reach the aggregate
    let fg = sched.entity(task(2)).unwrap();
    assert_eq!(locked_total(&sched, 0), 40);
    assert_eq!(fg.weight(), 1);
}

#[test]
fn malformed_group_path_is_foreground() {
    let sched = scheduler(1);
    add_tasks(&sched, &[(1, 0), (2, 0)]);
    host(&sched).set_group(task(1), "bg_without_slash");
    host(&sched).set_group(task(2), "");

    enqueue_all(&sched, &[1, 2]);
    assert_eq!(sched.entity(task(1)).unwrap().class(), TaskClass::Foreground);
    assert_eq!(sched.entity(task(2)).unwrap().class(), TaskClass::Foreground);
}

#[test]
fn custom_marker_and_base_slice() {
    let config = RasConfig::from_cmdline("ras.timeslice=4 ras.bg_marker=x");
    let sched = scheduler_with_config(1, config);
    add_tasks(&sched, &[(1, 0), (2, 0)]);
    host(&sched).set_group(task(1), "/xfer");
    host(&sched).set_group(task(2), "/bg_non_interactive");

    enqueue_all(&sched, &[1, 2]);
    assert_eq!(sched.entity(task(1)).unwrap().class(), TaskClass::Background);
    assert_eq!(sched.entity(task(2)).unwrap().time_slice(), 40);
    assert_eq!(sched.get_rr_interval(task(2)), Some(40));
}

#[test]
fn reenqueue_uses_fresh_count() {
    let sched = scheduler(1);
    add_tasks(&sched, &[(1, 50), (2, 50)]);
    enqueue_all(&sched, &[1, 2]);
    assert_eq!(locked_total(&sched, 0), 100);

    sched.dequeue(0, task(1), DequeueFlags::empty()).unwrap();
    assert_eq!(locked_total(&sched, 0), 50);

    host(&sched).set_wcounts(task(1), 0);
    sched.enqueue(0, task(1), EnqueueFlags::empty()).unwrap();
    assert_eq!(locked_total(&sched, 0), 50);
    assert_eq!(sched.entity(task(1)).unwrap().weight(), 10);
}
