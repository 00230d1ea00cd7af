#![no_main]

use std::time::Duration;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use modalkit_core::event::{AnimationEvent, KeyCode, KeyEvent, Modifiers, MouseEvent};
use modalkit_core::{Document, Size};
use modalkit_runtime::Scheduler;
use modalkit_widgets::modal::{
    HostScope, ModalAnimation, ModalConfig, ModalHandle, ModalPhase, ModalStack,
};

#[derive(Debug, Arbitrary)]
enum Op {
    Open {
        backdrop: bool,
        close_on_backdrop: bool,
        close_on_escape: bool,
        animated: bool,
        buttons: u8,
    },
    Close(u8),
    CloseAll,
    Escape,
    ClickBackdrop,
    Tab { reverse: bool },
    RunFrame,
    Advance(u16),
    AnimationEnd(u8),
}

fuzz_target!(|ops: Vec<Op>| {
    let doc = Document::new(Size::new(80, 24));
    let trigger = doc.create_element("button");
    doc.append_child(doc.body(), trigger);
    doc.focus(trigger);
    let sched = Scheduler::new();
    let stack = ModalStack::new(doc.clone(), sched.clone());
    let mut handles: Vec<ModalHandle<(), ()>> = Vec::new();

    for op in ops.into_iter().take(64) {
        match op {
            Op::Open {
                backdrop,
                close_on_backdrop,
                close_on_escape,
                animated,
                buttons,
            } => {
                let config = ModalConfig::new()
                    .backdrop(backdrop)
                    .close_on_backdrop(close_on_backdrop)
                    .close_on_escape(close_on_escape)
                    .animation(if animated {
                        ModalAnimation::Scale
                    } else {
                        ModalAnimation::None
                    });
                let h = stack.open(
                    move |scope: HostScope<(), ()>| {
                        for _ in 0..buttons % 4 {
                            let b = scope.document.create_element("button");
                            scope.document.append_child(scope.host, b);
                        }
                    },
                    config,
                );
                handles.push(h);
            }
            Op::Close(i) => {
                if !handles.is_empty() {
                    handles[usize::from(i) % handles.len()].close(None);
                }
            }
            Op::CloseAll => {
                stack.close_all();
            }
            Op::Escape => {
                stack.handle_event(&KeyEvent::new(KeyCode::Escape).into());
            }
            Op::ClickBackdrop => {
                if let Some(backdrop) = stack
                    .top_id()
                    .and_then(|id| stack.nodes_of(id))
                    .and_then(|n| n.backdrop)
                {
                    stack.handle_event(&MouseEvent::click(backdrop).into());
                }
            }
            Op::Tab { reverse } => {
                let mods = if reverse {
                    Modifiers::SHIFT
                } else {
                    Modifiers::empty()
                };
                stack.handle_event(&KeyEvent::new(KeyCode::Tab).with_modifiers(mods).into());
            }
            Op::RunFrame => {
                sched.run_frame();
            }
            Op::Advance(ms) => {
                sched.advance(Duration::from_millis(u64::from(ms)));
            }
            Op::AnimationEnd(i) => {
                if !handles.is_empty() {
                    let id = handles[usize::from(i) % handles.len()].id();
                    if let Some(nodes) = stack.nodes_of(id) {
                        stack.handle_event(&AnimationEvent::end(nodes.panel).into());
                    }
                }
            }
        }

        let ids = stack.ids();
        assert_eq!(ids.len(), stack.open_count());
        let z: Vec<u32> = ids.iter().filter_map(|id| stack.z_index_of(*id)).collect();
        assert_eq!(z.len(), ids.len());
        assert!(z.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(doc.scroll_lock_depth(), stack.mounted_count());
        for id in &ids {
            assert!(!matches!(
                stack.phase_of(*id),
                Some(ModalPhase::Exiting | ModalPhase::Destroyed) | None
            ));
        }
        if let Some(top) = stack.top_id()
            && stack.phase_of(top) == Some(ModalPhase::Open)
            && let (Some(nodes), Some(active)) = (stack.nodes_of(top), doc.active_element())
        {
            assert!(doc.contains(nodes.container, active));
        }
    }

    stack.close_all();
    sched.advance(Duration::from_secs(1));
    assert_eq!(stack.mounted_count(), 0);
    assert!(!doc.is_scroll_locked());
    assert_eq!(doc.active_element(), Some(trigger));
});
