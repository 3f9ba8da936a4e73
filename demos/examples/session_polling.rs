// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drive the host and resolve sessions by hand, without the workflow.
//!
//! This example shows how `understory_anchor_session` owns provider tickets:
//! - a host request that is cancelled mid-flight and then restarted,
//! - a resolve batch where one id is rejected before a ticket is issued.
//!
//! Run:
//! - `RUST_LOG=debug cargo run -p understory_anchor_demos --example session_polling`

use tracing_subscriber::EnvFilter;
use understory_anchor::scripted::{Script, ScriptedProvider};
use understory_anchor::{CloudAnchorId, ProviderFailure};
use understory_anchor_session::{HostOutcome, HostingSession, ResolveOutcome, ResolvingSession};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let mut provider = ScriptedProvider::new();
    provider.script_host(Script::succeed_on_poll(10));
    provider.script_host(Script::succeed_on_poll(2));
    provider.script_resolve("revoked".into(), Script::reject(ProviderFailure::NotAuthorized));

    let anchor = provider.create_anchor();
    let mut hosting = HostingSession::with_ttl_days(30);
    if hosting.start(&mut provider, &anchor).is_ok() {
        println!("host started (ttl {} days)", hosting.ttl_days());
    }
    // A second request while one is outstanding is refused.
    if let Err(err) = hosting.start(&mut provider, &anchor) {
        println!("second start: {err}");
    }
    println!("cancelled: {}", hosting.cancel(&mut provider));

    hosting
        .start(&mut provider, &anchor)
        .expect("session is idle after cancel");
    let hosted = loop {
        match hosting.poll(&mut provider) {
            HostOutcome::None => println!("  host pending"),
            HostOutcome::Succeeded(id) => break id,
            HostOutcome::Failed(failure) => {
                println!("host failed: {failure}");
                return;
            }
        }
    };
    println!("hosted as {hosted}");

    let mut resolving = ResolvingSession::new();
    let ids = [hosted, CloudAnchorId::from("revoked")];
    println!("issued {} resolve requests", resolving.enqueue(&mut provider, ids));
    while !resolving.is_idle() {
        for outcome in resolving.poll(&mut provider) {
            match outcome {
                ResolveOutcome::Succeeded { id, anchor } => {
                    println!("  {id} resolved as anchor #{}", anchor.serial());
                }
                ResolveOutcome::Failed { id, failure } => println!("  {id} failed: {failure}"),
            }
        }
    }
    println!("log: {:?}", provider.log());
}
