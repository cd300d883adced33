use super::*;

type TestTask = Task<i32, i32, u32>;

fn sink() -> (Arc<Mutex<Vec<String>>>, impl Fn(&str) + Clone + Send) {
    let log: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let writer = {
        let log = Arc::clone(&log);
        move |entry: &str| {
            log.lock().unwrap().push(entry.to_string());
        }
    };
    (log, writer)
}

#[test]
fn resolve_fires_callbacks_in_registration_order() {
    let task = TestTask::new();
    let (log, write) = sink();

    let first = write.clone();
    let second = write.clone();
    task.wait(move |v| first(&format!("first:{}", v)), |_| {});
    task.wait(move |v| second(&format!("second:{}", v)), |_| {});
    task.resolve(7);

    assert_eq!(*log.lock().unwrap(), vec!["first:7", "second:7"]);
    assert_eq!(task.status(), TaskStatus::Resolved);
    assert_eq!(task.result(), Some(7));
}

#[test]
fn wait_on_terminal_task_fires_immediately() {
    let task = TestTask::new();
    task.resolve(3);

    let (log, write) = sink();
    task.wait(move |v| write(&format!("late:{}", v)), |_| {});
    assert_eq!(*log.lock().unwrap(), vec!["late:3"]);
}

#[test]
fn first_transition_wins() {
    let task = TestTask::new();
    let (log, write) = sink();

    let on_ok = write.clone();
    let on_err = write.clone();
    task.wait(
        move |v| on_ok(&format!("ok:{}", v)),
        move |f| on_err(&format!("err:{:?}", f)),
    );

    task.resolve(1);
    task.reject(99);
    task.abort(100);
    task.resolve(2);

    assert_eq!(*log.lock().unwrap(), vec!["ok:1"]);
    assert_eq!(task.status(), TaskStatus::Resolved);
    assert_eq!(task.result(), Some(1));
}

#[test]
fn abort_reaches_rejection_callback_tagged() {
    let task = TestTask::new();
    let (log, write) = sink();
    task.wait(|_| {}, move |f| {
        write(&format!("aborted:{} reason:{}", f.is_aborted(), f.reason()))
    });

    task.abort(9);

    assert_eq!(*log.lock().unwrap(), vec!["aborted:true reason:9"]);
    assert_eq!(task.status(), TaskStatus::Aborted);
    assert_eq!(task.failure(), Some(TaskFailure::Aborted(9)));
}

#[test]
fn fail_forwards_the_terminal_tag() {
    let upstream = TestTask::new();
    let downstream = TestTask::new();
    {
        let downstream = downstream.clone();
        upstream.wait(|_| {}, move |f| downstream.fail(f.clone()));
    }

    upstream.abort(4);
    assert_eq!(downstream.status(), TaskStatus::Aborted);
    assert_eq!(downstream.failure(), Some(TaskFailure::Aborted(4)));
}

#[test]
fn progress_fans_out_and_stops_at_terminal() {
    let task = TestTask::new();
    let seen: Arc<Mutex<Vec<u32>>> = Arc::new(Mutex::new(Vec::new()));
    let seen_a = Arc::clone(&seen);
    let seen_b = Arc::clone(&seen);
    task.on_progress(move |p| seen_a.lock().unwrap().push(*p));
    task.on_progress(move |p| seen_b.lock().unwrap().push(*p * 10));

    task.progress(1);
    task.progress(2);
    task.resolve(0);
    task.progress(3);

    assert_eq!(*seen.lock().unwrap(), vec![1, 10, 2, 20]);
}

#[test]
fn on_progress_after_terminal_is_dropped() {
    let task = TestTask::new();
    task.resolve(0);
    let seen: Arc<Mutex<Vec<u32>>> = Arc::new(Mutex::new(Vec::new()));
    let seen_cb = Arc::clone(&seen);
    task.on_progress(move |p| seen_cb.lock().unwrap().push(*p));
    task.progress(5);
    assert!(seen.lock().unwrap().is_empty());
}

#[test]
fn all_resolves_with_results_in_input_order() {
    let a = TestTask::new();
    let b = TestTask::new();
    let aggregate = Task::all(vec![a.clone(), b.clone()]);

    b.resolve(2);
    assert!(aggregate.is_pending());
    a.resolve(1);

    assert_eq!(aggregate.result(), Some(vec![1, 2]));
}

#[test]
fn all_fails_fast_on_first_non_resolved_terminal() {
    let a = TestTask::new();
    let b = TestTask::new();
    let aggregate = Task::all(vec![a.clone(), b.clone()]);

    b.reject(1);

    // Settled before `a` reaches any terminal state.
    assert!(a.is_pending());
    assert_eq!(aggregate.failure(), Some(TaskFailure::Rejected(1)));
}

#[test]
fn all_of_empty_input_resolves_empty() {
    let aggregate = Task::all(Vec::<TestTask>::new());
    assert_eq!(aggregate.result(), Some(Vec::new()));
}

#[test]
fn all_settled_tags_each_outcome() {
    let a = TestTask::new();
    let b = TestTask::new();
    let aggregate = Task::all_settled(vec![a.clone(), b.clone()]);

    a.resolve(5);
    b.abort(9);

    assert_eq!(
        aggregate.result(),
        Some(vec![
            TaskSettledResult::Resolved(5),
            TaskSettledResult::Aborted(9),
        ])
    );
}

#[test]
fn race_forwards_the_first_settlement_verbatim() {
    let a = TestTask::new();
    let b = TestTask::new();
    let winner_resolves = Task::race(vec![a.clone(), b.clone()]);
    a.resolve(11);
    b.resolve(22);
    assert_eq!(winner_resolves.result(), Some(11));

    let c = TestTask::new();
    let d = TestTask::new();
    let winner_aborts = Task::race(vec![c.clone(), d.clone()]);
    d.abort(3);
    c.resolve(1);
    assert_eq!(winner_aborts.failure(), Some(TaskFailure::Aborted(3)));
}

#[test]
fn with_progress_reports_each_termination() {
    let a = TestTask::new();
    let b = TestTask::new();
    let (log, write) = sink();
    let aggregate = Task::with_progress(vec![a.clone(), b.clone()], move |done, total| {
        write(&format!("{}/{}", done, total))
    });

    a.resolve(1);
    assert!(aggregate.is_pending());
    b.resolve(2);

    assert_eq!(*log.lock().unwrap(), vec!["1/2", "2/2"]);
    assert_eq!(aggregate.result(), Some(vec![1, 2]));
}

#[test]
fn with_progress_counts_failures_before_settling() {
    let a = TestTask::new();
    let b = TestTask::new();
    let (log, write) = sink();
    let aggregate = Task::with_progress(vec![a.clone(), b.clone()], move |done, total| {
        write(&format!("{}/{}", done, total))
    });

    b.reject(7);

    assert_eq!(*log.lock().unwrap(), vec!["1/2"]);
    assert_eq!(aggregate.failure(), Some(TaskFailure::Rejected(7)));
}

#[test]
fn future_adapter_completes_on_cross_thread_resolve() {
    let task = TestTask::new();
    let resolver = task.clone();
    let handle = std::thread::spawn(move || {
        std::thread::sleep(std::time::Duration::from_millis(20));
        resolver.resolve(42);
    });

    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("current-thread runtime");
    let outcome = runtime.block_on(task.future());
    handle.join().unwrap();

    assert_eq!(outcome, Ok(42));
}

#[test]
fn future_adapter_surfaces_tagged_failure() {
    let task = TestTask::new();
    task.abort(13);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("current-thread runtime");
    assert_eq!(
        runtime.block_on(task.future()),
        Err(TaskFailure::Aborted(13))
    );
}
