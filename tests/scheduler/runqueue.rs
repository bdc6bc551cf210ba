//! Enqueue, dequeue, requeue and pick-next

use ras_sched::scheduler::{DequeueFlags, EnqueueFlags};
use ras_sched::RasError;

use crate::mock::{add_tasks, host, locked_total, nr_running, run_list, scheduler, task};

#[test]
fn enqueue_is_fifo() {
    let sched = scheduler(1);
    add_tasks(&sched, &[(1, 0), (2, 0), (3, 0)]);

    for id in 1..=3 {
        sched.enqueue(0, task(id), EnqueueFlags::empty()).unwrap();
    }

    assert_eq!(run_list(&sched, 0), vec![1, 2, 3]);
    assert_eq!(nr_running(&sched, 0), 3);
    assert_eq!(host(&sched).nr_running(0), 3);
    sched.validate(0).unwrap();
}

#[test]
fn enqueue_head_runs_first() {
    let sched = scheduler(1);
    add_tasks(&sched, &[(1, 0), (2, 0), (3, 0)]);

    sched.enqueue(0, task(1), EnqueueFlags::WAKEUP).unwrap();
    sched.enqueue(0, task(2), EnqueueFlags::WAKEUP).unwrap();
    sched.enqueue(0, task(3), EnqueueFlags::WAKEUP | EnqueueFlags::HEAD).unwrap();

    assert_eq!(run_list(&sched, 0), vec![3, 1, 2]);
    assert_eq!(sched.pick_next(0).unwrap(), Some(task(3)));
}

#[test]
fn pick_next_is_read_only() {
    let sched = scheduler(1);
    assert_eq!(sched.pick_next(0).unwrap(), None);

    add_tasks(&sched, &[(1, 20), (2, 30)]);
    sched.enqueue(0, task(1), EnqueueFlags::empty()).unwrap();
    sched.enqueue(0, task(2), EnqueueFlags::empty()).unwrap();

    host(&sched).set_clock(0, 5_000);
    let total = locked_total(&sched, 0);
    assert_eq!(sched.pick_next(0).unwrap(), Some(task(1)));
    assert_eq!(sched.pick_next(0).unwrap(), Some(task(1)));
    assert_eq!(run_list(&sched, 0), vec![1, 2]);
    assert_eq!(locked_total(&sched, 0), total);
    assert_eq!(sched.entity(task(1)).unwrap().exec_start(), 5_000);
}

#[test]
fn double_enqueue_is_rejected_without_side_effects() {
    let sched = scheduler(2);
    add_tasks(&sched, &[(1, 40)]);
    sched.enqueue(0, task(1), EnqueueFlags::empty()).unwrap();

    assert_eq!(sched.enqueue(0, task(1), EnqueueFlags::empty()), Err(RasError::AlreadyQueued));
    assert_eq!(sched.enqueue(1, task(1), EnqueueFlags::empty()), Err(RasError::AlreadyQueued));

    assert_eq!(nr_running(&sched, 0), 1);
    assert_eq!(nr_running(&sched, 1), 0);
    assert_eq!(locked_total(&sched, 0), 40);
    assert_eq!(host(&sched).nr_running(0), 1);
    assert_eq!(sched.stats(0).unwrap().enqueues, 1);
}

#[test]
fn dequeue_preconditions() {
    let sched = scheduler(2);
    add_tasks(&sched, &[(1, 0)]);

    assert_eq!(sched.dequeue(0, task(1), DequeueFlags::SLEEP), Err(RasError::NotQueued));
    assert_eq!(sched.dequeue(0, task(9), DequeueFlags::SLEEP), Err(RasError::NoEntity));

    sched.enqueue(0, task(1), EnqueueFlags::empty()).unwrap();
    // queued, but on the other CPU
    assert_eq!(sched.dequeue(1, task(1), DequeueFlags::SLEEP), Err(RasError::NotQueued));
    sched.dequeue(0, task(1), DequeueFlags::SLEEP).unwrap();
    assert_eq!(host(&sched).nr_running(0), 0);
}

#[test]
fn dequeue_restores_counts_after_requeues() {
    let sched = scheduler(1);
    add_tasks(&sched, &[(1, 30), (2, 70), (3, 0)]);
    sched.enqueue(0, task(1), EnqueueFlags::empty()).unwrap();
    sched.enqueue(0, task(2), EnqueueFlags::empty()).unwrap();

    let (nr_before, total_before) = (nr_running(&sched, 0), locked_total(&sched, 0));
    assert_eq!(total_before, 100);

    sched.enqueue(0, task(3), EnqueueFlags::empty()).unwrap();
    assert!(sched.requeue(0, task(3), true).unwrap());
    assert!(sched.requeue(0, task(1), false).unwrap());
    sched.set_curr(0, Some(task(3))).unwrap();
    sched.tick(0).unwrap();
    sched.dequeue(0, task(3), DequeueFlags::SLEEP).unwrap();

    assert_eq!(nr_running(&sched, 0), nr_before);
    assert_eq!(locked_total(&sched, 0), total_before);
    assert_eq!(run_list(&sched, 0), vec![2, 1]);
    sched.validate(0).unwrap();
}

#[test]
fn requeue_moves_within_queue() {
    let sched = scheduler(1);
    add_tasks(&sched, &[(1, 0), (2, 0), (3, 0), (4, 0)]);
    for id in 1..=3 {
        sched.enqueue(0, task(id), EnqueueFlags::empty()).unwrap();
    }

    assert!(sched.requeue(0, task(1), false).unwrap());
    assert_eq!(run_list(&sched, 0), vec![2, 3, 1]);
    assert!(sched.requeue(0, task(3), true).unwrap());
    assert_eq!(run_list(&sched, 0), vec![3, 2, 1]);
    // already at the head
    assert!(sched.requeue(0, task(3), true).unwrap());
    assert_eq!(run_list(&sched, 0), vec![3, 2, 1]);

    // not linked: nothing happens
    assert!(!sched.requeue(0, task(4), true).unwrap());
    assert_eq!(nr_running(&sched, 0), 3);
    assert_eq!(sched.stats(0).unwrap().requeues, 3);
    sched.validate(0).unwrap();
}

#[test]
fn yield_sends_current_to_tail() {
    let sched = scheduler(1);
    add_tasks(&sched, &[(1, 0), (2, 0), (3, 0)]);
    for id in 1..=3 {
        sched.enqueue(0, task(id), EnqueueFlags::empty()).unwrap();
    }

    // nothing installed yet
    sched.yield_current(0).unwrap();
    assert_eq!(run_list(&sched, 0), vec![1, 2, 3]);

    sched.set_curr(0, Some(task(1))).unwrap();
    sched.yield_current(0).unwrap();
    assert_eq!(run_list(&sched, 0), vec![2, 3, 1]);
    assert_eq!(sched.pick_next(0).unwrap(), Some(task(2)));
}

#[test]
fn entity_lifecycle() {
    let sched = scheduler(1);
    add_tasks(&sched, &[(1, 0)]);
    assert_eq!(sched.attach_task(task(1)), Err(RasError::AlreadyAttached));

    sched.enqueue(0, task(1), EnqueueFlags::empty()).unwrap();
    assert_eq!(sched.detach_task(task(1)).unwrap_err(), RasError::StillQueued);

    sched.dequeue(0, task(1), DequeueFlags::empty()).unwrap();
    let entity = sched.detach_task(task(1)).unwrap();
    assert!(!entity.is_queued());
    assert_eq!(sched.enqueue(0, task(1), EnqueueFlags::empty()), Err(RasError::NoEntity));
}

#[test]
fn offline_and_unknown_cpus_are_refused() {
    let sched = scheduler(2);
    add_tasks(&sched, &[(1, 0)]);

    assert_eq!(sched.enqueue(2, task(1), EnqueueFlags::empty()), Err(RasError::InvalidCpu));
    assert_eq!(sched.enqueue(200, task(1), EnqueueFlags::empty()), Err(RasError::InvalidCpu));

    sched.set_cpu_online(1, false).unwrap();
    assert_eq!(sched.enqueue(1, task(1), EnqueueFlags::empty()), Err(RasError::InvalidCpu));
    sched.set_cpu_online(1, true).unwrap();
    sched.enqueue(1, task(1), EnqueueFlags::empty()).unwrap();

    // a CPU with queued tasks cannot be reinitialized
    assert_eq!(sched.init_cpu(1), Err(RasError::StillQueued));
}

#[test]
fn offline_cpu_can_be_drained() {
    let sched = scheduler(2);
    add_tasks(&sched, &[(1, 40), (2, 0)]);
    sched.enqueue(1, task(1), EnqueueFlags::empty()).unwrap();
    sched.enqueue(1, task(2), EnqueueFlags::empty()).unwrap();
    assert_eq!(locked_total(&sched, 1), 40);

    sched.set_cpu_online(1, false).unwrap();
    assert_eq!(sched.pick_next(1), Ok(Some(task(1))));

    // hot-unplug migration: pull each task off and queue it elsewhere
    sched.dequeue(1, task(1), DequeueFlags::empty()).unwrap();
    sched.enqueue(0, task(1), EnqueueFlags::empty()).unwrap();
    sched.dequeue(1, task(2), DequeueFlags::empty()).unwrap();
    assert!(sched.detach_task(task(2)).is_ok());

    assert_eq!(nr_running(&sched, 1), 0);
    assert_eq!(locked_total(&sched, 1), 0);
    assert_eq!(sched.total_wcounts(1), 0);
    assert_eq!(host(&sched).nr_running(1), 0);
    assert_eq!(run_list(&sched, 0), vec![1]);
    sched.validate(0).unwrap();
    sched.validate(1).unwrap();
}

#[test]
fn set_curr_requires_entity() {
    let sched = scheduler(1);
    assert_eq!(sched.set_curr(0, Some(task(5))), Err(RasError::NoEntity));
    assert_eq!(sched.current(0), None);

    add_tasks(&sched, &[(5, 0)]);
    host(&sched).set_clock(0, 77);
    sched.set_curr(0, Some(task(5))).unwrap();
    assert_eq!(sched.current(0), Some(task(5)));
    assert_eq!(sched.entity(task(5)).unwrap().exec_start(), 77);

    sched.set_curr(0, None).unwrap();
    assert_eq!(sched.current(0), None);
}
