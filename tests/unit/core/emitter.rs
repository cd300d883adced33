use super::*;

fn log() -> Rc<RefCell<Vec<i32>>> {
    Rc::new(RefCell::new(Vec::new()))
}

#[test]
fn emit_reaches_every_subscriber() {
    let emitter: Emitter<i32> = Emitter::new();
    let seen = log();
    let a = Rc::clone(&seen);
    let b = Rc::clone(&seen);
    emitter.subscribe(move |v| a.borrow_mut().push(*v));
    emitter.subscribe(move |v| b.borrow_mut().push(*v * 10));

    emitter.emit(&2);

    let mut got = seen.borrow().clone();
    got.sort_unstable();
    assert_eq!(got, vec![2, 20]);
}

#[test]
fn unsubscribe_is_stable_and_idempotent() {
    let emitter: Emitter<i32> = Emitter::new();
    let seen = log();
    let sink = Rc::clone(&seen);
    let key = emitter.subscribe(move |v| sink.borrow_mut().push(*v));

    assert!(emitter.unsubscribe(key));
    assert!(!emitter.unsubscribe(key));

    emitter.emit(&1);
    assert!(seen.borrow().is_empty());
}

#[test]
fn subscribing_from_a_callback_does_not_deadlock() {
    let emitter: Rc<Emitter<i32>> = Rc::new(Emitter::new());
    let seen = log();
    let inner_seen = Rc::clone(&seen);
    let reentrant = Rc::clone(&emitter);
    emitter.subscribe(move |_| {
        let sink = Rc::clone(&inner_seen);
        reentrant.subscribe(move |v| sink.borrow_mut().push(*v));
    });

    emitter.emit(&1);
    assert_eq!(emitter.subscriber_count(), 2);

    emitter.emit(&5);
    assert_eq!(*seen.borrow(), vec![5]);
}

#[test]
fn behavior_replays_current_value_at_subscription() {
    let behavior = Behavior::new(10);
    let seen = log();
    let sink = Rc::clone(&seen);
    behavior.subscribe(move |v| sink.borrow_mut().push(*v));
    assert_eq!(*seen.borrow(), vec![10]);

    behavior.publish(11);
    assert_eq!(*seen.borrow(), vec![10, 11]);
    assert_eq!(behavior.get(), 11);
}

#[test]
fn behavior_late_subscriber_sees_latest_not_initial() {
    let behavior = Behavior::new(1);
    behavior.publish(2);
    behavior.publish(3);

    let seen = log();
    let sink = Rc::clone(&seen);
    behavior.subscribe(move |v| sink.borrow_mut().push(*v));
    assert_eq!(*seen.borrow(), vec![3]);
}
