use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Notify;

use watcher::{
    IssueWatcher, ObserverToken, SequenceId, TickOutcome, WatcherConfig, WatcherError,
};

use mock_source::ScriptedSource;

type Log = Arc<Mutex<Vec<SequenceId>>>;

fn recorder(watcher: &IssueWatcher<ScriptedSource>) -> Log {
    let log: Log = Arc::default();
    let sink = log.clone();
    watcher.register(move |id| {
        let sink = sink.clone();
        async move {
            sink.lock().unwrap().push(id);
            Ok(())
        }
    });
    log
}

#[tokio::test]
async fn first_fetch_sets_baseline_then_new_ids_are_dispatched_in_order() {
    let watcher = IssueWatcher::new(ScriptedSource::new([Ok(5), Ok(8)]));
    let seen = recorder(&watcher);

    assert!(matches!(watcher.tick().await, TickOutcome::Baselined(5)));
    assert!(seen.lock().unwrap().is_empty());

    assert!(matches!(
        watcher.tick().await,
        TickOutcome::Dispatched { from: 5, to: 8 }
    ));
    assert_eq!(*seen.lock().unwrap(), vec![5, 6, 7]);
    assert_eq!(watcher.last_known_id(), Some(8));
}

#[tokio::test]
async fn every_id_is_dispatched_exactly_once_across_ticks() {
    let watcher = IssueWatcher::new(ScriptedSource::new([
        Ok(0),
        Ok(2),
        Ok(2),
        Ok(7),
        Ok(7),
        Ok(10),
    ]));
    let seen = recorder(&watcher);

    for _ in 0..6 {
        watcher.tick().await;
    }

    assert_eq!(*seen.lock().unwrap(), (0..10).collect::<Vec<_>>());
    assert_eq!(watcher.counters().snapshot().ids_dispatched, 10);
}

#[tokio::test]
async fn failed_fetch_keeps_baseline_and_next_tick_resumes() {
    let watcher = IssueWatcher::new(ScriptedSource::new([Ok(5), Err("timeout"), Ok(7)]));
    let seen = recorder(&watcher);

    watcher.tick().await;
    assert!(matches!(watcher.tick().await, TickOutcome::FetchFailed(_)));
    assert_eq!(watcher.last_known_id(), Some(5));

    assert!(matches!(
        watcher.tick().await,
        TickOutcome::Dispatched { from: 5, to: 7 }
    ));
    assert_eq!(*seen.lock().unwrap(), vec![5, 6]);
}

#[tokio::test]
async fn failed_first_fetch_is_retried_on_next_tick() {
    let watcher = IssueWatcher::new(ScriptedSource::new([Err("down"), Ok(3), Ok(4)]));
    let seen = recorder(&watcher);

    assert!(matches!(watcher.tick().await, TickOutcome::FetchFailed(_)));
    assert_eq!(watcher.last_known_id(), None);

    assert!(matches!(watcher.tick().await, TickOutcome::Baselined(3)));
    watcher.tick().await;

    assert_eq!(*seen.lock().unwrap(), vec![3]);
}

#[tokio::test]
async fn counter_moving_backwards_is_a_no_op() {
    let watcher = IssueWatcher::new(ScriptedSource::new([Ok(10), Ok(4), Ok(12)]));
    let seen = recorder(&watcher);

    watcher.tick().await;
    assert!(matches!(watcher.tick().await, TickOutcome::Idle));
    assert_eq!(watcher.last_known_id(), Some(10));

    watcher.tick().await;
    assert_eq!(*seen.lock().unwrap(), vec![10, 11]);
}

#[tokio::test]
async fn observers_run_in_registration_order_for_each_id() {
    for _ in 0..5 {
        let watcher = IssueWatcher::new(ScriptedSource::new([Ok(0), Ok(3)]));
        let log: Arc<Mutex<Vec<(SequenceId, &'static str)>>> = Arc::default();

        for name in ["o1", "o2"] {
            let sink = log.clone();
            watcher.register(move |id| {
                let sink = sink.clone();
                async move {
                    // Give the other observer a chance to jump the queue if dispatch were concurrent.
                    tokio::task::yield_now().await;
                    sink.lock().unwrap().push((id, name));
                    Ok(())
                }
            });
        }

        watcher.tick().await;
        watcher.tick().await;

        assert_eq!(
            *log.lock().unwrap(),
            vec![
                (0, "o1"),
                (0, "o2"),
                (1, "o1"),
                (1, "o2"),
                (2, "o1"),
                (2, "o2"),
            ]
        );
    }
}

#[tokio::test]
async fn failing_observer_does_not_stop_siblings_or_later_ids() {
    let watcher = IssueWatcher::new(ScriptedSource::new([Ok(0), Ok(2)]));

    watcher.register(|id| async move { anyhow::bail!("rule rejected token {id}") });
    let seen = recorder(&watcher);

    watcher.tick().await;
    watcher.tick().await;

    assert_eq!(*seen.lock().unwrap(), vec![0, 1]);
    let counters = watcher.counters().snapshot();
    assert_eq!(counters.observer_failures, 2);
    assert_eq!(counters.observer_calls, 4);
}

#[tokio::test]
async fn panicking_observer_is_isolated() {
    let watcher = IssueWatcher::new(ScriptedSource::new([Ok(0), Ok(1)]));

    watcher.register(|id| async move {
        if id == 0 {
            panic!("boom");
        }
        Ok(())
    });
    let seen = recorder(&watcher);

    watcher.tick().await;
    assert!(matches!(
        watcher.tick().await,
        TickOutcome::Dispatched { from: 0, to: 1 }
    ));

    assert_eq!(*seen.lock().unwrap(), vec![0]);
    assert_eq!(watcher.counters().snapshot().observer_failures, 1);
}

#[tokio::test]
async fn observer_removed_mid_tick_misses_remaining_ids() {
    let watcher = Arc::new(IssueWatcher::new(ScriptedSource::new([Ok(0), Ok(4)])));

    let victim: Arc<Mutex<Option<ObserverToken>>> = Arc::default();
    let removed = Arc::new(Mutex::new(false));

    let weak = Arc::downgrade(&watcher);
    let slot = victim.clone();
    let flag = removed.clone();
    watcher.register(move |_| {
        let weak = weak.clone();
        let slot = slot.clone();
        let flag = flag.clone();
        async move {
            let token = slot.lock().unwrap().take();
            if let (Some(w), Some(token)) = (weak.upgrade(), token) {
                *flag.lock().unwrap() = w.unregister(token);
            }
            Ok(())
        }
    });

    let seen: Log = Arc::default();
    let sink = seen.clone();
    let token = watcher.register(move |id| {
        let sink = sink.clone();
        async move {
            sink.lock().unwrap().push(id);
            Ok(())
        }
    });
    *victim.lock().unwrap() = Some(token);

    watcher.tick().await;
    watcher.tick().await;

    assert!(*removed.lock().unwrap());
    assert!(seen.lock().unwrap().is_empty());
    assert_eq!(watcher.observer_count(), 1);
}

#[tokio::test]
async fn observer_registered_mid_tick_is_not_retroactive() {
    let watcher = Arc::new(IssueWatcher::new(ScriptedSource::new([Ok(0), Ok(3), Ok(5)])));

    let late: Log = Arc::default();
    let weak = Arc::downgrade(&watcher);
    let late_sink = late.clone();
    watcher.register(move |id| {
        let weak = weak.clone();
        let late_sink = late_sink.clone();
        async move {
            if id == 0 {
                if let Some(w) = weak.upgrade() {
                    w.register(move |id| {
                        let sink = late_sink.clone();
                        async move {
                            sink.lock().unwrap().push(id);
                            Ok(())
                        }
                    });
                }
            }
            Ok(())
        }
    });

    watcher.tick().await;
    watcher.tick().await;
    assert!(late.lock().unwrap().is_empty());

    watcher.tick().await;
    assert_eq!(*late.lock().unwrap(), vec![3, 4]);
}

#[tokio::test]
async fn overlapping_tick_is_rejected_and_ids_are_not_redispatched() {
    let source = ScriptedSource::new([Ok(0), Ok(3)]);
    let watcher = Arc::new(IssueWatcher::new(source.clone()));

    let entered = Arc::new(Notify::new());
    let gate = Arc::new(Notify::new());
    let seen: Log = Arc::default();

    {
        let entered = entered.clone();
        let gate = gate.clone();
        let sink = seen.clone();
        watcher.register(move |id| {
            let entered = entered.clone();
            let gate = gate.clone();
            let sink = sink.clone();
            async move {
                if id == 0 {
                    entered.notify_one();
                    gate.notified().await;
                }
                sink.lock().unwrap().push(id);
                Ok(())
            }
        });
    }

    watcher.tick().await;

    let running = {
        let w = watcher.clone();
        tokio::spawn(async move { w.tick().await })
    };

    entered.notified().await;

    assert!(matches!(watcher.tick().await, TickOutcome::Busy));
    assert_eq!(source.calls(), 2);

    gate.notify_one();
    let outcome = running.await.unwrap();
    assert!(matches!(outcome, TickOutcome::Dispatched { from: 0, to: 3 }));

    assert!(matches!(watcher.tick().await, TickOutcome::Idle));
    assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2]);
    assert_eq!(watcher.counters().snapshot().busy_skips, 1);
}

#[tokio::test(start_paused = true)]
async fn hung_observer_is_abandoned_after_timeout() {
    let watcher = IssueWatcher::with_config(
        ScriptedSource::new([Ok(0), Ok(2)]),
        WatcherConfig {
            poll_interval: Duration::from_millis(100),
            observer_timeout: Some(Duration::from_secs(1)),
        },
    );

    watcher.register(|_| async {
        std::future::pending::<()>().await;
        Ok(())
    });
    let seen = recorder(&watcher);

    watcher.tick().await;
    assert!(matches!(
        watcher.tick().await,
        TickOutcome::Dispatched { from: 0, to: 2 }
    ));

    assert_eq!(*seen.lock().unwrap(), vec![0, 1]);
    assert_eq!(watcher.counters().snapshot().observer_timeouts, 2);
}

#[tokio::test(start_paused = true)]
async fn start_is_idempotent_and_polls_on_interval() {
    let source = ScriptedSource::new([Ok(1), Ok(2), Ok(3)]);
    let watcher = IssueWatcher::new(source.clone());
    let seen = recorder(&watcher);

    watcher.start(Duration::from_secs(5)).unwrap();
    watcher.start(Duration::from_secs(5)).unwrap();
    assert!(watcher.is_running());

    // Ticks at t = 0s, 5s, 10s.
    tokio::time::sleep(Duration::from_secs(11)).await;

    assert_eq!(source.calls(), 3);
    assert_eq!(*seen.lock().unwrap(), vec![1, 2]);

    watcher.stop();
    tokio::time::sleep(Duration::from_secs(30)).await;

    assert_eq!(source.calls(), 3);
    assert!(!watcher.is_running());
}

#[tokio::test(start_paused = true)]
async fn restart_after_stop_keeps_baseline() {
    let source = ScriptedSource::new([Ok(1), Ok(1), Ok(4)]);
    let watcher = IssueWatcher::new(source.clone());
    let seen = recorder(&watcher);

    watcher.start(Duration::from_secs(1)).unwrap();
    tokio::time::sleep(Duration::from_millis(1_500)).await;
    watcher.stop();
    tokio::time::sleep(Duration::from_secs(5)).await;

    watcher.start(Duration::from_secs(1)).unwrap();
    tokio::time::sleep(Duration::from_millis(500)).await;

    assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3]);
}

#[tokio::test]
async fn shutdown_clears_observers_and_baseline() {
    let watcher = IssueWatcher::new(ScriptedSource::new([Ok(3)]));
    recorder(&watcher);
    recorder(&watcher);

    watcher.start(Duration::from_secs(5)).unwrap();
    watcher.tick().await;

    watcher.shutdown();

    assert_eq!(watcher.observer_count(), 0);
    assert_eq!(watcher.last_known_id(), None);
    assert!(!watcher.is_running());
}

#[tokio::test(start_paused = true)]
async fn zero_interval_is_rejected_before_anything_is_spawned() {
    let source = ScriptedSource::new([Ok(1), Ok(2)]);
    let watcher = IssueWatcher::new(source.clone());
    let seen = recorder(&watcher);

    let err = watcher.start(Duration::ZERO).unwrap_err();
    assert!(matches!(err, WatcherError::InvalidConfig(_)));

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(source.calls(), 0);
    assert!(!watcher.is_running());

    // The watcher is still usable with a valid interval.
    watcher.start(Duration::from_secs(1)).unwrap();
    tokio::time::sleep(Duration::from_millis(1_500)).await;

    assert_eq!(source.calls(), 2);
    assert_eq!(*seen.lock().unwrap(), vec![1]);
}

#[tokio::test]
async fn observer_removed_during_its_own_call_finishes_that_call_only() {
    let watcher = Arc::new(IssueWatcher::new(ScriptedSource::new([Ok(0), Ok(3)])));

    let own_token: Arc<Mutex<Option<ObserverToken>>> = Arc::default();
    let seen: Log = Arc::default();
    let was_in_flight = Arc::new(Mutex::new(false));

    let weak = Arc::downgrade(&watcher);
    let slot = own_token.clone();
    let sink = seen.clone();
    let flag = was_in_flight.clone();
    let token = watcher.register(move |id| {
        let weak = weak.clone();
        let slot = slot.clone();
        let sink = sink.clone();
        let flag = flag.clone();
        async move {
            let token = *slot.lock().unwrap();
            if let (Some(w), Some(token)) = (weak.upgrade(), token) {
                *flag.lock().unwrap() = w.is_in_flight(token);
                w.unregister(token);
            }
            // Work after removal still completes.
            tokio::task::yield_now().await;
            sink.lock().unwrap().push(id);
            Ok(())
        }
    });
    *own_token.lock().unwrap() = Some(token);

    watcher.tick().await;
    assert!(matches!(
        watcher.tick().await,
        TickOutcome::Dispatched { from: 0, to: 3 }
    ));

    assert!(*was_in_flight.lock().unwrap());
    assert_eq!(*seen.lock().unwrap(), vec![0]);
    assert!(!watcher.is_in_flight(token));
    assert_eq!(watcher.counters().snapshot().observer_calls, 1);
}
