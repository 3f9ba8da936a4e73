// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host an anchor, save it, resolve it again, then lose tracking.
//!
//! This example drives `understory_anchor_workflow` with the scripted
//! collaborators from `understory_anchor`:
//! - a hosting pass where mapping quality improves over a few frames,
//! - a resolving pass over the saved entry plus an id that no longer exists,
//! - an AR session failure that sends the workflow home.
//!
//! Run:
//! - `RUST_LOG=debug cargo run -p understory_anchor_demos --example host_and_resolve`

use std::error::Error;

use tracing_subscriber::EnvFilter;
use understory_anchor::scripted::{MemoryStore, Script, ScriptedProvider, ScriptedTracking};
use understory_anchor::{CloudAnchorId, ProviderFailure, Quality, SessionState};
use understory_anchor_workflow::{
    AnchorVisual, Changes, HostingPhase, Mode, Notice, State, VisualTable, WorkflowConfig,
    WorkflowController,
};

type Workflow = WorkflowController<ScriptedProvider, ScriptedTracking, MemoryStore>;

const FRAME: f32 = 1.0 / 30.0;
const MAX_FRAMES: usize = 600;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let mut visuals = VisualTable::new("cloud_anchor.glb");
    visuals.assign(AnchorVisual::Heart, "heart.glb");
    visuals.assign(AnchorVisual::Stars, "stars.glb");
    visuals.select_key("HeartCloudAnchor")?;

    let mut provider = ScriptedProvider::new();
    provider.script_host(Script::succeed_on_poll(4));
    provider.script_resolve(
        "expired".into(),
        Script::fail_on_poll(3, ProviderFailure::CloudIdNotFound),
    );
    let mut workflow = WorkflowController::with_config(
        provider,
        ScriptedTracking::default(),
        MemoryStore::new(),
        WorkflowConfig::default().with_warm_up(0.5).with_return_delay(1.0),
    );

    println!("== hosting");
    workflow.select_mode(Mode::Hosting)?;
    run_until(&mut workflow, |w, changes| {
        changes.contains(Changes::WARMED_UP) || !w.is_warming_up()
    });
    let anchor = workflow.provider_mut().create_anchor();
    println!("placed anchor #{} with {}", anchor.serial(), visuals.current());
    workflow.place_anchor(anchor)?;

    let mut frame = 0_usize;
    run_until(&mut workflow, |w, _| {
        frame += 1;
        // The user walks around and the map fills in.
        w.provider_mut().quality = match frame {
            0..10 => Quality::Insufficient,
            10..20 => Quality::Sufficient,
            _ => Quality::Good,
        };
        w.state() == State::Hosting(HostingPhase::AwaitingSave)
    });
    let saved = workflow.confirm_save(Some("lobby"))?;
    println!("saved {} as {:?}", saved.id, saved.name);
    report(&mut workflow);

    println!("== resolving");
    visuals.select(AnchorVisual::Stars)?;
    workflow.resolve_saved()?;
    workflow.queue_resolve([CloudAnchorId::from("expired")])?;
    run_until(&mut workflow, |w, _| {
        !w.is_warming_up() && !w.is_resolving() && w.queued_ids().next().is_none()
    });
    for (id, anchor) in workflow.resolved_anchors() {
        println!("{id} is anchor #{} shown with {}", anchor.serial(), visuals.current());
    }

    println!("== losing the AR session");
    workflow.tracking_mut().state = SessionState::Unsupported;
    run_until(&mut workflow, |_, changes| changes.contains(Changes::RETURN_HOME));
    workflow.reset();
    println!("live anchors after reset: {}", workflow.provider().live_anchors());
    Ok(())
}

/// Tick until `done` returns true, printing notices as they arrive.
fn run_until(workflow: &mut Workflow, mut done: impl FnMut(&mut Workflow, Changes) -> bool) {
    for _ in 0..MAX_FRAMES {
        let changes = workflow.tick(FRAME);
        report(workflow);
        if done(workflow, changes) {
            return;
        }
    }
    println!("gave up after {MAX_FRAMES} frames in {:?}", workflow.state());
}

fn report(workflow: &mut Workflow) {
    for notice in workflow.drain_notices() {
        match notice {
            Notice::Instruction(instruction) => println!("  > {}", instruction.text()),
            Notice::Quality(quality) => println!("  quality: {quality}"),
            Notice::TrackingHelp {
                text: Some(text), ..
            } => println!("  ! {text}"),
            Notice::TrackingHelp { text: None, .. } => {}
            Notice::HostFailed(failure) => println!("  host failed: {failure}"),
            Notice::ResolveFailed { id, failure } => println!("  {id} failed: {failure}"),
            other => println!("  {other:?}"),
        }
    }
}
