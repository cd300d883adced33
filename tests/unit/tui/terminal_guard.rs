use super::*;
use std::sync::atomic::AtomicUsize;

#[derive(Default)]
struct FakeOps {
    setups: AtomicUsize,
    restores: AtomicUsize,
}

impl TerminalOps for Arc<FakeOps> {
    fn setup(&self) -> io::Result<()> {
        self.setups.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn restore(&self) -> io::Result<()> {
        self.restores.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[test]
fn restore_runs_once_across_guard_and_restorer() {
    let ops = Arc::new(FakeOps::default());
    let guard = TerminalGuard::with_ops(Arc::new(Arc::clone(&ops))).unwrap();
    assert_eq!(ops.setups.load(Ordering::SeqCst), 1);

    let restorer = guard.restorer();
    restorer.restore().unwrap();
    drop(guard);

    assert_eq!(ops.restores.load(Ordering::SeqCst), 1);
}

#[test]
fn dropping_the_guard_restores_if_nothing_else_did() {
    let ops = Arc::new(FakeOps::default());
    let guard = TerminalGuard::with_ops(Arc::new(Arc::clone(&ops))).unwrap();
    drop(guard);
    assert_eq!(ops.restores.load(Ordering::SeqCst), 1);
}
