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

use weft::config::WhatAmI;
use weft_core::wtimeout;

const TIMEOUT: Duration = Duration::from_secs(60);
const SLEEP: Duration = Duration::from_millis(300);

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn scouting_discovers_later_sessions() {
    weft::init_log_from_env_or("error");
    let scout = wtimeout!(weft::scout(WhatAmI::Peer, weft::Config::default())).unwrap();

    let session = wtimeout!(weft::open(weft::config::peer())).unwrap();

    loop {
        let hello = wtimeout!(scout.recv_async()).unwrap();
        assert_eq!(hello.whatami(), WhatAmI::Peer);
        assert!(!hello.locators().is_empty());
        if hello.zid() == session.id() {
            break;
        }
    }

    scout.stop();
    wtimeout!(session.close()).unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn scouting_reports_existing_sessions() {
    weft::init_log_from_env_or("error");
    let session = wtimeout!(weft::open(weft::config::peer())).unwrap();

    let scout = wtimeout!(weft::scout(
        WhatAmI::Peer | WhatAmI::Router,
        weft::Config::default()
    ))
    .unwrap();

    loop {
        let hello = wtimeout!(scout.recv_async()).unwrap();
        if hello.zid() == session.id() {
            break;
        }
    }

    wtimeout!(session.close()).unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn scouting_matcher_filters_modes() {
    weft::init_log_from_env_or("error");
    // Scouting for routers only: no peer session must ever be reported.
    let scout = wtimeout!(weft::scout(WhatAmI::Router, weft::Config::default())).unwrap();

    let peer = wtimeout!(weft::open(weft::config::peer())).unwrap();
    tokio::time::sleep(SLEEP).await;
    for hello in scout.try_iter() {
        assert_ne!(hello.zid(), peer.id());
    }

    wtimeout!(peer.close()).unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn scouting_skips_undiscoverable_sessions() {
    weft::init_log_from_env_or("error");
    let scout = wtimeout!(weft::scout(WhatAmI::Peer, weft::Config::default())).unwrap();

    let mut config = weft::config::peer();
    config.scouting.multicast.enabled = false;
    let hidden = wtimeout!(weft::open(config)).unwrap();

    tokio::time::sleep(SLEEP).await;
    for hello in scout.try_iter() {
        assert_ne!(hello.zid(), hidden.id());
    }

    scout.stop();
    wtimeout!(hidden.close()).unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn scouting_disabled_yields_nothing() {
    weft::init_log_from_env_or("error");
    let mut config = weft::Config::default();
    config.scouting.multicast.enabled = false;

    let scout = wtimeout!(weft::scout(WhatAmI::Peer, config)).unwrap();

    // The scout is inert: its channel completes without ever yielding.
    assert!(wtimeout!(scout.recv_async()).is_err());
}
