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
use std::time::Duration;

use weft::{error::PublishError, sample::SampleKind, Session};
use weft_core::wtimeout;

const TIMEOUT: Duration = Duration::from_secs(60);

async fn open_peers() -> (Session, Session) {
    let peer01 = wtimeout!(weft::open(weft::config::peer())).unwrap();
    let peer02 = wtimeout!(weft::open(weft::config::peer())).unwrap();
    (peer01, peer02)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn liveliness_token_appears_and_departs() {
    weft::init_log_from_env_or("error");
    let (peer01, peer02) = open_peers().await;

    let subscriber = wtimeout!(peer01
        .liveliness()
        .declare_subscriber("weft/liveliness/basic/*"))
    .unwrap();

    let token = wtimeout!(peer02
        .liveliness()
        .declare_token("weft/liveliness/basic/member1"))
    .unwrap();

    let sample = wtimeout!(subscriber.recv_async()).unwrap();
    assert_eq!(sample.kind(), SampleKind::Put);
    assert_eq!(*sample.key_expr(), "weft/liveliness/basic/member1");

    wtimeout!(token.undeclare()).unwrap();

    let sample = wtimeout!(subscriber.recv_async()).unwrap();
    assert_eq!(sample.kind(), SampleKind::Delete);
    assert_eq!(*sample.key_expr(), "weft/liveliness/basic/member1");

    wtimeout!(peer01.close()).unwrap();
    wtimeout!(peer02.close()).unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn liveliness_token_dies_with_its_session() {
    weft::init_log_from_env_or("error");
    let peer01 = wtimeout!(weft::open(weft::config::peer())).unwrap();
    let peer02 = wtimeout!(weft::open(weft::config::peer())).unwrap();

    let subscriber = wtimeout!(peer01
        .liveliness()
        .declare_subscriber("weft/liveliness/close/*"))
    .unwrap();

    let _token = wtimeout!(peer02
        .liveliness()
        .declare_token("weft/liveliness/close/member1")
        .background())
    .unwrap();

    let sample = wtimeout!(subscriber.recv_async()).unwrap();
    assert_eq!(sample.kind(), SampleKind::Put);

    wtimeout!(peer02.close()).unwrap();

    let sample = wtimeout!(subscriber.recv_async()).unwrap();
    assert_eq!(sample.kind(), SampleKind::Delete);
    assert_eq!(*sample.key_expr(), "weft/liveliness/close/member1");

    wtimeout!(peer01.close()).unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn liveliness_history_subscriber() {
    weft::init_log_from_env_or("error");
    let (peer01, peer02) = open_peers().await;

    let _token = wtimeout!(peer02
        .liveliness()
        .declare_token("weft/liveliness/history/member1"))
    .unwrap();

    // The token already exists when the subscriber joins.
    let subscriber = wtimeout!(peer01
        .liveliness()
        .declare_subscriber("weft/liveliness/history/*")
        .history(true))
    .unwrap();

    let sample = wtimeout!(subscriber.recv_async()).unwrap();
    assert_eq!(sample.kind(), SampleKind::Put);
    assert_eq!(*sample.key_expr(), "weft/liveliness/history/member1");

    wtimeout!(peer01.close()).unwrap();
    wtimeout!(peer02.close()).unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn liveliness_get_snapshots_alive_tokens() {
    weft::init_log_from_env_or("error");
    let (peer01, peer02) = open_peers().await;

    let _token1 = wtimeout!(peer02
        .liveliness()
        .declare_token("weft/liveliness/get/member1"))
    .unwrap();
    let _token2 = wtimeout!(peer02
        .liveliness()
        .declare_token("weft/liveliness/get/member2"))
    .unwrap();

    let replies = wtimeout!(peer01.liveliness().get("weft/liveliness/get/*")).unwrap();
    let mut keys: Vec<String> = Vec::new();
    while let Ok(reply) = replies.recv_async().await {
        let sample = reply.result().unwrap();
        assert_eq!(sample.kind(), SampleKind::Put);
        assert_eq!(reply.replier_id(), Some(peer02.id()));
        keys.push(sample.key_expr().to_string());
    }
    keys.sort();
    assert_eq!(
        keys,
        vec![
            "weft/liveliness/get/member1".to_string(),
            "weft/liveliness/get/member2".to_string()
        ]
    );

    wtimeout!(peer01.close()).unwrap();
    wtimeout!(peer02.close()).unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn liveliness_get_timeout_cuts_response() {
    weft::init_log_from_env_or("error");
    let (peer01, peer02) = open_peers().await;

    let _token = wtimeout!(peer02
        .liveliness()
        .declare_token("weft/liveliness/timeout/member1"))
    .unwrap();

    // An already-expired deadline cuts the response off before any reply.
    let replies = wtimeout!(peer01
        .liveliness()
        .get("weft/liveliness/timeout/*")
        .timeout(Duration::ZERO))
    .unwrap();
    assert!(wtimeout!(replies.recv_async()).is_err());

    wtimeout!(peer01.close()).unwrap();
    wtimeout!(peer02.close()).unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn liveliness_wild_token_is_rejected() {
    weft::init_log_from_env_or("error");
    let session = wtimeout!(weft::open(weft::config::peer())).unwrap();

    let err = wtimeout!(session.liveliness().declare_token("weft/liveliness/wild/**"))
        .unwrap_err();
    assert!(err.downcast_ref::<PublishError>().is_some());

    wtimeout!(session.close()).unwrap();
}
