use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::thread;
use std::time::Duration;

use ebike_hardware::error::HwError;
use ebike_hardware::util::wait_until_ready_with_timeout;

#[test]
fn wait_until_ready_success_path() {
    let ready = Arc::new(AtomicBool::new(false));
    let ready_bg = ready.clone();
    thread::spawn(move || {
        thread::sleep(Duration::from_millis(3));
        ready_bg.store(true, Ordering::Relaxed);
    });

    let res = wait_until_ready_with_timeout(
        || Ok(ready.load(Ordering::Relaxed)),
        Duration::from_millis(200),
        Duration::from_micros(200),
    );
    assert!(res.is_ok(), "expected success, got {res:?}");
}

#[test]
fn wait_until_ready_timeout_path() {
    let err = wait_until_ready_with_timeout(
        || Ok(false),
        Duration::from_millis(5),
        Duration::from_micros(200),
    )
    .expect_err("expected timeout error");

    match err {
        HwError::ConversionTimeout => {}
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn bus_errors_abort_the_wait() {
    let err = wait_until_ready_with_timeout(
        || Err(HwError::Nack(0x48)),
        Duration::from_millis(50),
        Duration::from_micros(200),
    )
    .expect_err("expected bus error");
    assert!(matches!(err, HwError::Nack(0x48)));
}
