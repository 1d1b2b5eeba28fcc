//
// Copyright (c) 2024 ZettaScale Technology
//
// This program and the accompanying materials are made available under the
// terms of the Eclipse Public License 2.0 which is available at
// http://www.eclipse.org/legal/epl-2.0, or the Apache License, Version 2.0
// which is available at https://www.apache.org/licenses/LICENSE-2.0.
//
// SPDX-License-Identifier: EPL-2.0 OR Apache-2.0
//
// Contributors:
//   ZettaScale Zenoh Team, <zenoh@zettascale.tech>
//
use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use weft::{
    error::{ClosedResourceError, ConnectionError, PublishError},
    handlers::RingChannel,
    qos::{CongestionControl, Priority},
    sample::SampleKind,
    Session, Wait,
};
use weft_core::wtimeout;

const TIMEOUT: Duration = Duration::from_secs(60);
const SLEEP: Duration = Duration::from_millis(100);

async fn open_peers() -> (Session, Session) {
    let peer01 = wtimeout!(weft::open(weft::config::peer())).unwrap();
    let peer02 = wtimeout!(weft::open(weft::config::peer())).unwrap();
    (peer01, peer02)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn session_pubsub() {
    weft::init_log_from_env_or("error");
    let (peer01, peer02) = open_peers().await;

    let subscriber = wtimeout!(peer01.declare_subscriber("weft/session/pubsub/**")).unwrap();

    wtimeout!(peer02.put("weft/session/pubsub/data", "hello")).unwrap();

    let sample = wtimeout!(subscriber.recv_async()).unwrap();
    assert_eq!(*sample.key_expr(), "weft/session/pubsub/data");
    assert_eq!(sample.payload().try_to_string().unwrap(), "hello");
    assert_eq!(sample.kind(), SampleKind::Put);
    assert!(sample.timestamp().is_some());

    wtimeout!(peer01.close()).unwrap();
    wtimeout!(peer02.close()).unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn session_put_then_delete_in_order() {
    weft::init_log_from_env_or("error");
    let (peer01, peer02) = open_peers().await;

    let kinds = Arc::new(Mutex::new(Vec::new()));
    let c_kinds = kinds.clone();
    let _subscriber = wtimeout!(peer01
        .declare_subscriber("weft/session/order/*")
        .callback(move |sample| c_kinds.lock().unwrap().push(sample.kind())))
    .unwrap();

    wtimeout!(peer02.put("weft/session/order/a", "v")).unwrap();
    wtimeout!(peer02.delete("weft/session/order/a")).unwrap();

    tokio::time::sleep(SLEEP).await;
    assert_eq!(
        kinds.lock().unwrap().as_slice(),
        &[SampleKind::Put, SampleKind::Delete]
    );

    wtimeout!(peer01.close()).unwrap();
    wtimeout!(peer02.close()).unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn session_history_subscriber() {
    weft::init_log_from_env_or("error");
    let (peer01, peer02) = open_peers().await;

    // Published before the subscriber exists.
    wtimeout!(peer02.put("weft/session/history/a", "old")).unwrap();

    let subscriber = wtimeout!(peer01
        .declare_subscriber("weft/session/history/*")
        .history(true))
    .unwrap();

    wtimeout!(peer02.put("weft/session/history/a", "new")).unwrap();

    let first = wtimeout!(subscriber.recv_async()).unwrap();
    assert_eq!(first.payload().try_to_string().unwrap(), "old");
    let second = wtimeout!(subscriber.recv_async()).unwrap();
    assert_eq!(second.payload().try_to_string().unwrap(), "new");

    wtimeout!(peer01.close()).unwrap();
    wtimeout!(peer02.close()).unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn session_publisher_qos_is_carried() {
    weft::init_log_from_env_or("error");
    let (peer01, peer02) = open_peers().await;

    let subscriber = wtimeout!(peer01.declare_subscriber("weft/session/qos/*")).unwrap();
    let publisher = wtimeout!(peer02
        .declare_publisher("weft/session/qos/a")
        .priority(Priority::RealTime)
        .congestion_control(CongestionControl::Block))
    .unwrap();

    wtimeout!(publisher.put("v").attachment("meta")).unwrap();
    wtimeout!(publisher.undeclare()).unwrap();

    let sample = wtimeout!(subscriber.recv_async()).unwrap();
    assert_eq!(sample.priority(), Priority::RealTime);
    assert_eq!(sample.congestion_control(), CongestionControl::Block);
    assert_eq!(
        sample.attachment().unwrap().try_to_string().unwrap(),
        "meta"
    );

    wtimeout!(peer01.close()).unwrap();
    wtimeout!(peer02.close()).unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn session_ring_handler_keeps_last_samples() {
    weft::init_log_from_env_or("error");
    let (peer01, peer02) = open_peers().await;

    let subscriber = wtimeout!(peer01
        .declare_subscriber("weft/session/ring/*")
        .with(RingChannel::new(2)))
    .unwrap();

    for i in 0..4 {
        wtimeout!(peer02.put("weft/session/ring/a", i.to_string())).unwrap();
    }

    // The ring overwrote the oldest entries, keeping the last two.
    tokio::time::sleep(SLEEP).await;
    let first = subscriber.try_recv().unwrap().unwrap();
    assert_eq!(first.payload().try_to_string().unwrap(), "2");
    let second = subscriber.try_recv().unwrap().unwrap();
    assert_eq!(second.payload().try_to_string().unwrap(), "3");
    assert!(subscriber.try_recv().unwrap().is_none());

    wtimeout!(peer01.close()).unwrap();
    wtimeout!(peer02.close()).unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn session_close_unblocks_ring_consumer() {
    weft::init_log_from_env_or("error");
    let session = wtimeout!(weft::open(weft::config::peer())).unwrap();

    let subscriber = wtimeout!(session
        .declare_subscriber("weft/session/unblock/*")
        .with(RingChannel::new(2)))
    .unwrap();

    // Park a consumer on the empty ring before anything is published.
    let consumer = tokio::task::spawn_blocking(move || subscriber.recv());
    tokio::time::sleep(SLEEP).await;

    wtimeout!(session.close()).unwrap();

    // Closing released the consumer with an end-of-stream error.
    let result = wtimeout!(consumer).unwrap();
    assert!(result.is_err());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn session_reentrant_publication_does_not_stall_routing() {
    weft::init_log_from_env_or("error");
    let (peer01, peer02) = open_peers().await;

    // The subscriber's callback publishes in turn, slowly enough for its own
    // queue to saturate under a blocking publisher.
    let echo_session = peer01.clone();
    let _echo = wtimeout!(peer01
        .declare_subscriber("weft/session/reentrant/in")
        .callback(move |sample| {
            std::thread::sleep(Duration::from_millis(1));
            echo_session
                .put("weft/session/reentrant/out", sample.payload())
                .wait()
                .unwrap();
        }))
    .unwrap();

    let out = wtimeout!(peer02.declare_subscriber("weft/session/reentrant/out")).unwrap();
    let publisher = wtimeout!(peer02
        .declare_publisher("weft/session/reentrant/in")
        .congestion_control(CongestionControl::Block))
    .unwrap();

    let publish = tokio::task::spawn_blocking(move || {
        for i in 0..300 {
            publisher.put(i.to_string()).wait().unwrap();
        }
    });
    wtimeout!(publish).unwrap();

    for _ in 0..300 {
        wtimeout!(out.recv_async()).unwrap();
    }

    wtimeout!(peer01.close()).unwrap();
    wtimeout!(peer02.close()).unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn session_wild_publication_is_rejected() {
    weft::init_log_from_env_or("error");
    let session = wtimeout!(weft::open(weft::config::peer())).unwrap();

    let err = wtimeout!(session.put("weft/session/wild/*", "v")).unwrap_err();
    assert!(err.downcast_ref::<PublishError>().is_some());

    let err = wtimeout!(session.declare_publisher("weft/session/wild/**")).unwrap_err();
    assert!(err.downcast_ref::<PublishError>().is_some());

    wtimeout!(session.close()).unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn session_operations_fail_once_closed() {
    weft::init_log_from_env_or("error");
    let session = wtimeout!(weft::open(weft::config::peer())).unwrap();
    let subscriber = wtimeout!(session.declare_subscriber("weft/session/closed/*")).unwrap();

    wtimeout!(session.close()).unwrap();
    assert!(session.is_closed());

    // Closing again is a no-op.
    wtimeout!(session.close()).unwrap();

    let err = wtimeout!(session.put("weft/session/closed/a", "v")).unwrap_err();
    assert!(err.downcast_ref::<ClosedResourceError>().is_some());

    let err = wtimeout!(session.declare_subscriber("weft/session/closed/a")).unwrap_err();
    assert!(err.downcast_ref::<ClosedResourceError>().is_some());

    let err = wtimeout!(session.get("weft/session/closed/a")).unwrap_err();
    assert!(err.downcast_ref::<ClosedResourceError>().is_some());

    // Undeclaring an entity of a closed session is a no-op, not an error.
    wtimeout!(subscriber.undeclare()).unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn session_close_on_last_clone_drop() {
    weft::init_log_from_env_or("error");
    let session = wtimeout!(weft::open(weft::config::peer())).unwrap();
    let clone = session.clone();

    drop(session);
    assert!(!clone.is_closed());

    let received = Arc::new(AtomicUsize::new(0));
    let c_received = received.clone();
    let other = wtimeout!(weft::open(weft::config::peer())).unwrap();
    let _subscriber = wtimeout!(other
        .declare_subscriber("weft/session/lastclone/*")
        .callback(move |_| {
            c_received.fetch_add(1, Ordering::SeqCst);
        }))
    .unwrap();

    wtimeout!(clone.put("weft/session/lastclone/a", "v")).unwrap();
    drop(clone);

    // The session is gone; nothing routes to the other peer anymore.
    tokio::time::sleep(SLEEP).await;
    assert_eq!(received.load(Ordering::SeqCst), 1);

    wtimeout!(other.close()).unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn session_client_requires_router() {
    weft::init_log_from_env_or("error");
    // No router session exists in this process.
    let err = wtimeout!(weft::open(weft::config::client(["mem/router".to_string()])))
        .unwrap_err();
    assert!(err.downcast_ref::<ConnectionError>().is_some());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn session_info() {
    weft::init_log_from_env_or("error");
    let (peer01, peer02) = open_peers().await;

    let id = peer01.info().id().await;
    assert_eq!(id, peer01.id());

    let peers = peer01.info().peers_id().await;
    assert!(peers.contains(&peer02.id()));
    assert!(!peers.contains(&peer01.id()));

    wtimeout!(peer01.close()).unwrap();
    wtimeout!(peer02.close()).unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn session_handler_panic_does_not_poison_delivery() {
    weft::init_log_from_env_or("error");
    let (peer01, peer02) = open_peers().await;

    let received = Arc::new(AtomicUsize::new(0));
    let c_received = received.clone();
    let _subscriber = wtimeout!(peer01
        .declare_subscriber("weft/session/panic/*")
        .callback(move |sample| {
            if sample.payload().try_to_string().unwrap() == "boom" {
                panic!("boom");
            }
            c_received.fetch_add(1, Ordering::SeqCst);
        }))
    .unwrap();

    wtimeout!(peer02.put("weft/session/panic/a", "boom")).unwrap();
    wtimeout!(peer02.put("weft/session/panic/a", "fine")).unwrap();

    tokio::time::sleep(SLEEP).await;
    assert_eq!(received.load(Ordering::SeqCst), 1);

    wtimeout!(peer01.close()).unwrap();
    wtimeout!(peer02.close()).unwrap();
}
