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

use weft::{
    qos::{CongestionControl, Priority},
    query::{ConsolidationMode, QueryTarget},
    sample::SampleKind,
    Session, Wait,
};
use weft_core::wtimeout;

const TIMEOUT: Duration = Duration::from_secs(60);

async fn open_peers() -> (Session, Session) {
    let peer01 = wtimeout!(weft::open(weft::config::peer())).unwrap();
    let peer02 = wtimeout!(weft::open(weft::config::peer())).unwrap();
    (peer01, peer02)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn queryable_round_trip() {
    weft::init_log_from_env_or("error");
    let (peer01, peer02) = open_peers().await;

    let _queryable = wtimeout!(peer01
        .declare_queryable("weft/queryable/roundtrip/*")
        .callback(|query| {
            assert_eq!(query.parameters().get("details"), Some("true"));
            assert_eq!(
                query.payload().unwrap().try_to_string().unwrap(),
                "request"
            );
            query
                .reply("weft/queryable/roundtrip/a", "answer")
                .wait()
                .unwrap();
        }))
    .unwrap();

    let replies = wtimeout!(peer02
        .get("weft/queryable/roundtrip/a?details=true")
        .payload("request"))
    .unwrap();

    let reply = wtimeout!(replies.recv_async()).unwrap();
    assert_eq!(reply.replier_id(), Some(peer01.id()));
    let sample = reply.result().unwrap();
    assert_eq!(*sample.key_expr(), "weft/queryable/roundtrip/a");
    assert_eq!(sample.payload().try_to_string().unwrap(), "answer");
    assert_eq!(sample.kind(), SampleKind::Put);

    // A single reply was sent; the response then completes.
    assert!(wtimeout!(replies.recv_async()).is_err());

    wtimeout!(peer01.close()).unwrap();
    wtimeout!(peer02.close()).unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn queryable_reply_err() {
    weft::init_log_from_env_or("error");
    let (peer01, peer02) = open_peers().await;

    let _queryable = wtimeout!(peer01
        .declare_queryable("weft/queryable/err/*")
        .callback(|query| query.reply_err("not available").wait().unwrap()))
    .unwrap();

    let replies = wtimeout!(peer02.get("weft/queryable/err/a")).unwrap();
    let reply = wtimeout!(replies.recv_async()).unwrap();
    let err = reply.result().unwrap_err();
    assert_eq!(err.payload().try_to_string().unwrap(), "not available");

    wtimeout!(peer01.close()).unwrap();
    wtimeout!(peer02.close()).unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn queryable_latest_consolidation() {
    weft::init_log_from_env_or("error");
    let (peer01, peer02) = open_peers().await;

    let session = peer01.clone();
    let _queryable = wtimeout!(peer01
        .declare_queryable("weft/queryable/latest/*")
        .callback(move |query| {
            let older = session.new_timestamp();
            let newer = session.new_timestamp();
            query
                .reply("weft/queryable/latest/a", "old")
                .timestamp(older)
                .wait()
                .unwrap();
            query
                .reply("weft/queryable/latest/a", "new")
                .timestamp(newer)
                .wait()
                .unwrap();
        }))
    .unwrap();

    // The default consolidation keeps only the newest reply per key.
    let replies = wtimeout!(peer02.get("weft/queryable/latest/a")).unwrap();
    let reply = wtimeout!(replies.recv_async()).unwrap();
    assert_eq!(
        reply.result().unwrap().payload().try_to_string().unwrap(),
        "new"
    );
    assert!(wtimeout!(replies.recv_async()).is_err());

    // Without consolidation both replies come through, in order.
    let replies = wtimeout!(peer02
        .get("weft/queryable/latest/a")
        .consolidation(ConsolidationMode::None))
    .unwrap();
    let first = wtimeout!(replies.recv_async()).unwrap();
    assert_eq!(
        first.result().unwrap().payload().try_to_string().unwrap(),
        "old"
    );
    let second = wtimeout!(replies.recv_async()).unwrap();
    assert_eq!(
        second.result().unwrap().payload().try_to_string().unwrap(),
        "new"
    );

    wtimeout!(peer01.close()).unwrap();
    wtimeout!(peer02.close()).unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn queryable_target_selection() {
    weft::init_log_from_env_or("error");
    let (peer01, peer02) = open_peers().await;

    let _complete = wtimeout!(peer01
        .declare_queryable("weft/queryable/target/*")
        .complete(true)
        .callback(|query| {
            query
                .reply("weft/queryable/target/complete", "c")
                .wait()
                .unwrap()
        }))
    .unwrap();
    let _partial = wtimeout!(peer02
        .declare_queryable("weft/queryable/target/*")
        .callback(|query| {
            query
                .reply("weft/queryable/target/partial", "p")
                .wait()
                .unwrap()
        }))
    .unwrap();

    let querier = wtimeout!(peer02.declare_querier("weft/queryable/target/a")).unwrap();

    // BestMatching prefers the sole complete queryable.
    let replies = wtimeout!(querier
        .get()
        .with(flume::bounded::<weft::query::Reply>(8)))
    .unwrap();
    let all: Vec<_> = replies.iter().collect();
    assert_eq!(all.len(), 1);
    assert_eq!(
        *all[0].result().unwrap().key_expr(),
        "weft/queryable/target/complete"
    );

    // AllComplete also skips the partial one.
    let replies = wtimeout!(peer02
        .get("weft/queryable/target/a")
        .target(QueryTarget::AllComplete)
        .consolidation(ConsolidationMode::None))
    .unwrap();
    let all: Vec<_> = replies.iter().collect();
    assert_eq!(all.len(), 1);

    // All reaches both.
    let replies = wtimeout!(peer02
        .get("weft/queryable/target/a")
        .target(QueryTarget::All)
        .consolidation(ConsolidationMode::None))
    .unwrap();
    let all: Vec<_> = replies.iter().collect();
    assert_eq!(all.len(), 2);

    wtimeout!(querier.undeclare()).unwrap();
    wtimeout!(peer01.close()).unwrap();
    wtimeout!(peer02.close()).unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn queryable_reply_qos_follows_the_query() {
    weft::init_log_from_env_or("error");
    let (peer01, peer02) = open_peers().await;

    let _queryable = wtimeout!(peer01
        .declare_queryable("weft/queryable/qos/*")
        .callback(|query| {
            query
                .reply("weft/queryable/qos/a", "inherited")
                .wait()
                .unwrap();
            query
                .reply("weft/queryable/qos/a", "overridden")
                .priority(Priority::DataLow)
                .congestion_control(CongestionControl::Drop)
                .wait()
                .unwrap();
        }))
    .unwrap();

    let replies = wtimeout!(peer02
        .get("weft/queryable/qos/a")
        .priority(Priority::InteractiveHigh)
        .consolidation(ConsolidationMode::None))
    .unwrap();

    // The first reply inherits the query's priority.
    let first = wtimeout!(replies.recv_async()).unwrap();
    let sample = first.result().unwrap();
    assert_eq!(sample.payload().try_to_string().unwrap(), "inherited");
    assert_eq!(sample.priority(), Priority::InteractiveHigh);
    assert_eq!(sample.congestion_control(), CongestionControl::Block);

    // The second one carries the replier's own QoS.
    let second = wtimeout!(replies.recv_async()).unwrap();
    let sample = second.result().unwrap();
    assert_eq!(sample.payload().try_to_string().unwrap(), "overridden");
    assert_eq!(sample.priority(), Priority::DataLow);
    assert_eq!(sample.congestion_control(), CongestionControl::Drop);

    wtimeout!(peer01.close()).unwrap();
    wtimeout!(peer02.close()).unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn queryable_timeout_cuts_response() {
    weft::init_log_from_env_or("error");
    let (peer01, peer02) = open_peers().await;

    // The queryable holds the query alive without ever replying.
    let queryable = wtimeout!(peer01.declare_queryable("weft/queryable/timeout/*")).unwrap();

    let replies = wtimeout!(peer02
        .get("weft/queryable/timeout/a")
        .timeout(Duration::from_millis(200)))
    .unwrap();

    let query = wtimeout!(queryable.recv_async()).unwrap();
    // No reply is sent before the requester's deadline.
    assert!(wtimeout!(replies.recv_async()).is_err());
    drop(query);

    wtimeout!(peer01.close()).unwrap();
    wtimeout!(peer02.close()).unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn queryable_no_match_completes_empty() {
    weft::init_log_from_env_or("error");
    let session = wtimeout!(weft::open(weft::config::peer())).unwrap();

    let replies = wtimeout!(session.get("weft/queryable/nomatch/a")).unwrap();
    assert!(wtimeout!(replies.recv_async()).is_err());

    wtimeout!(session.close()).unwrap();
}
