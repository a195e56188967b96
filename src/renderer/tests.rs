// src/renderer/tests.rs

use super::*;
use crate::framebuffer::FrameBuffer;
use crate::platform::backends::mock::{BackendCall, MockBackend, MOCK_CLOSE_ATOM};
use crate::platform::backends::RawEvent;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::thread;
use test_log::test;

type Log = Rc<RefCell<Vec<BackendCall>>>;
type BoxedPainter = Box<dyn FnMut(&mut FrameBuffer, &DirtyRegion) -> Result<()>>;

struct Harness {
    render: RenderLoop<BoxedPainter, MockBackend>,
    log: Log,
    paints: Rc<Cell<usize>>,
}

fn harness_with(backend: MockBackend, width: u32, height: u32) -> Harness {
    let log = backend.call_log();
    let window = Window::with_backend(backend, "render", width, height);
    let paints = Rc::new(Cell::new(0));
    let counter = Rc::clone(&paints);
    let paint = move |frame: &mut FrameBuffer, _: &DirtyRegion| -> Result<()> {
        counter.set(counter.get() + 1);
        frame.clear(0x00_20_40_60);
        Ok(())
    };
    let painter: BoxedPainter = Box::new(paint);
    let render = RenderLoop::new(window, painter, Duration::ZERO).unwrap();
    Harness {
        render,
        log,
        paints,
    }
}

/// A harness whose initial full-window frame has already been presented.
fn settled(width: u32, height: u32) -> Harness {
    let mut h = harness_with(MockBackend::new(), width, height);
    assert!(matches!(h.render.tick(), FrameOutcome::Presented { .. }));
    h.log.borrow_mut().clear();
    h.paints.set(0);
    h
}

fn blits(log: &Log) -> Vec<BackendCall> {
    log.borrow()
        .iter()
        .filter(|c| matches!(c, BackendCall::PutImage { .. }))
        .cloned()
        .collect()
}

fn full_blit(width: u32, height: u32) -> BackendCall {
    BackendCall::PutImage {
        width,
        height,
        stride: width as usize * 4,
        len: (width * height * 4) as usize,
    }
}

#[test]
fn it_should_schedule_the_first_frame_on_creation() {
    let mut h = harness_with(MockBackend::new(), 64, 32);
    assert_eq!(h.render.state(), FrameState::PaintScheduled);
    assert!(matches!(h.render.tick(), FrameOutcome::Presented { .. }));
    assert_eq!(blits(&h.log), vec![full_blit(64, 32)]);
}

#[test]
fn it_should_coalesce_invalidations_into_one_full_frame_blit() {
    let mut h = settled(800, 600);
    h.render.invalidate(Rect::new(0, 0, 100, 100));
    h.render.invalidate(Rect::new(50, 50, 100, 100));
    assert_eq!(h.render.state(), FrameState::PaintScheduled);

    let FrameOutcome::Presented { dirty } = h.render.tick() else {
        panic!("expected a presented frame");
    };
    assert!(dirty.covers(&Rect::new(0, 0, 100, 100)));
    assert!(dirty.covers(&Rect::new(50, 50, 100, 100)));
    assert_eq!(blits(&h.log), vec![full_blit(800, 600)]);
    assert_eq!(h.paints.get(), 1);

    assert_eq!(h.render.state(), FrameState::Idle);
    assert!(!h.render.tracker.is_dirty());
    assert_eq!(h.render.tick(), FrameOutcome::Idle);
    assert_eq!(blits(&h.log).len(), 1);
}

#[test]
fn it_should_not_touch_the_surface_when_nothing_is_dirty() {
    let mut h = settled(100, 100);
    assert_eq!(h.render.tick(), FrameOutcome::Idle);
    assert_eq!(h.paints.get(), 0);
    assert!(h.log.borrow().is_empty());
}

#[test]
fn it_should_ignore_empty_invalidations() {
    let mut h = settled(100, 100);
    h.render.invalidate(Rect::new(10, 10, 0, 5));
    assert_eq!(h.render.state(), FrameState::Idle);
    assert_eq!(h.render.tick(), FrameOutcome::Idle);
}

#[test]
fn it_should_clip_the_painted_region_to_the_window() {
    let mut h = settled(100, 100);
    h.render.invalidate(Rect::new(90, 90, 50, 50));
    let FrameOutcome::Presented { dirty } = h.render.tick() else {
        panic!("expected a presented frame");
    };
    assert_eq!(dirty.bounds(), Some(Rect::new(90, 90, 10, 10)));
}

#[test]
fn it_should_skip_invalidations_entirely_outside_the_window() {
    let mut h = settled(100, 100);
    h.render.invalidate(Rect::new(500, 500, 10, 10));
    assert_eq!(h.render.tick(), FrameOutcome::Skipped);
    assert_eq!(h.paints.get(), 0);
    assert!(blits(&h.log).is_empty());
}

#[test]
fn it_should_drop_the_frame_and_return_to_idle_when_the_painter_fails() {
    let backend = MockBackend::new();
    let log = backend.call_log();
    let window = Window::with_backend(backend, "render", 40, 40);
    let painter: BoxedPainter = Box::new(|_: &mut FrameBuffer, _: &DirtyRegion| -> Result<()> {
        anyhow::bail!("view tree exploded")
    });
    let mut render = RenderLoop::new(window, painter, Duration::ZERO).unwrap();

    assert_eq!(render.tick(), FrameOutcome::Dropped);
    assert_eq!(render.state(), FrameState::Idle);
    assert!(blits(&log).is_empty());
    // The consumed region is gone; only a new invalidation schedules another frame.
    assert_eq!(render.tick(), FrameOutcome::Idle);
    render.invalidate(Rect::new(0, 0, 1, 1));
    assert_eq!(render.state(), FrameState::PaintScheduled);
}

#[test]
fn it_should_contain_a_panicking_painter() {
    let backend = MockBackend::new();
    let log = backend.call_log();
    let window = Window::with_backend(backend, "render", 40, 40);
    let calls = Rc::new(Cell::new(0));
    let counter = Rc::clone(&calls);
    let paint = move |_: &mut FrameBuffer, _: &DirtyRegion| -> Result<()> {
        counter.set(counter.get() + 1);
        if counter.get() == 1 {
            panic!("painter bug");
        }
        Ok(())
    };
    let painter: BoxedPainter = Box::new(paint);
    let mut render = RenderLoop::new(window, painter, Duration::ZERO).unwrap();

    assert_eq!(render.tick(), FrameOutcome::Dropped);
    assert_eq!(render.state(), FrameState::Idle);
    assert!(blits(&log).is_empty());

    render.invalidate(Rect::new(0, 0, 40, 40));
    assert!(matches!(render.tick(), FrameOutcome::Presented { .. }));
    assert_eq!(blits(&log), vec![full_blit(40, 40)]);
}

#[test]
fn it_should_recover_from_a_failed_blit() {
    let mut backend = MockBackend::new();
    backend.fail_put_image(crate::error::WindowError::BlitAllocationFailed { bytes: 6400 });
    let mut h = harness_with(backend, 40, 40);

    assert_eq!(h.render.tick(), FrameOutcome::Dropped);
    assert_eq!(h.render.state(), FrameState::Idle);
    assert_eq!(h.paints.get(), 1);
    assert!(!h.render.window().is_closed());
    assert_eq!(h.render.tick(), FrameOutcome::Idle);
}

#[test]
fn it_should_skip_frames_for_a_zero_sized_window() {
    let mut h = harness_with(MockBackend::new(), 0, 0);
    h.render.invalidate(Rect::new(0, 0, 10, 10));
    assert_eq!(h.render.tick(), FrameOutcome::Skipped);
    assert_eq!(h.render.state(), FrameState::Idle);
    assert_eq!(h.paints.get(), 0);
    assert!(blits(&h.log).is_empty());
}

#[test]
fn it_should_repaint_the_new_bounds_after_a_resize() {
    let mut h = settled(800, 600);
    h.render.window_mut().backend_mut().push_event(RawEvent::Configure {
        width: 1024,
        height: 768,
    });
    h.render.window_mut().process_events();

    let FrameOutcome::Presented { dirty } = h.render.tick() else {
        panic!("expected a presented frame");
    };
    assert_eq!(dirty.bounds(), Some(Rect::from_size(1024, 768)));
    assert_eq!(blits(&h.log), vec![full_blit(1024, 768)]);
}

#[test]
fn it_should_repaint_the_exposed_rect() {
    let mut h = settled(200, 200);
    h.render.window_mut().backend_mut().push_event(RawEvent::Expose {
        x: 10,
        y: 20,
        width: 30,
        height: 40,
        count: 0,
    });
    h.render.window_mut().process_events();

    let FrameOutcome::Presented { dirty } = h.render.tick() else {
        panic!("expected a presented frame");
    };
    assert_eq!(dirty.bounds(), Some(Rect::new(10, 20, 30, 40)));
    assert_eq!(blits(&h.log), vec![full_blit(200, 200)]);
}

#[test]
fn it_should_accept_invalidations_from_other_threads() {
    let mut h = settled(100, 100);
    let handle = h.render.invalidation_handle();
    thread::spawn(move || handle.invalidate(Rect::new(1, 2, 3, 4)))
        .join()
        .unwrap();

    let FrameOutcome::Presented { dirty } = h.render.tick() else {
        panic!("expected a presented frame");
    };
    assert_eq!(dirty.bounds(), Some(Rect::new(1, 2, 3, 4)));
}

#[test]
fn it_should_block_when_idle_and_poll_when_a_frame_is_due() {
    let mut h = settled(100, 100);
    assert_eq!(h.render.wait_timeout_ms(), -1);
    h.render.invalidate(Rect::new(0, 0, 1, 1));
    assert_eq!(h.render.wait_timeout_ms(), 0);
}

#[test]
fn it_should_leave_run_when_the_window_is_closed() {
    let display = EventFdWaker::new().unwrap();
    let mut backend = MockBackend::new();
    backend.set_fd(display.fd());
    backend.push_event(RawEvent::ClientMessage {
        message_type: 0,
        data0: MOCK_CLOSE_ATOM,
    });
    let mut h = harness_with(backend, 50, 50);

    h.render.run().unwrap();
    assert!(h.render.window().is_closed());
    assert!(blits(&h.log).is_empty());
}

#[test]
fn it_should_present_the_pending_frame_before_honoring_stop() {
    let display = EventFdWaker::new().unwrap();
    let mut backend = MockBackend::new();
    backend.set_fd(display.fd());
    backend.push_event(RawEvent::Configure {
        width: 120,
        height: 80,
    });
    backend.push_event(RawEvent::FocusOut);
    let mut h = harness_with(backend, 50, 50);
    let stop = h.render.window().stop_handle();
    h.render.window_mut().subscribe(move |event| {
        if *event == WindowEvent::FocusLost {
            stop.stop();
        }
    });

    h.render.run().unwrap();
    assert!(!h.render.window().is_running());
    assert_eq!(blits(&h.log), vec![full_blit(120, 80)]);
}

#[test]
fn it_should_drain_events_queued_during_a_blit_before_sleeping() {
    // The display fd never becomes readable; the close request only reaches the
    // client-side queue as a side effect of the first frame's blit.
    let display = EventFdWaker::new().unwrap();
    let mut backend = MockBackend::new();
    backend.set_fd(display.fd());
    backend.queue_on_put_image(RawEvent::ClientMessage {
        message_type: 0,
        data0: MOCK_CLOSE_ATOM,
    });
    let mut h = harness_with(backend, 50, 50);

    h.render.run().unwrap();
    assert!(h.render.window().is_closed());
    assert_eq!(blits(&h.log), vec![full_blit(50, 50)]);
}

#[test]
fn it_should_refuse_to_run_a_closed_window() {
    let display = EventFdWaker::new().unwrap();
    let mut backend = MockBackend::new();
    backend.set_fd(display.fd());
    let mut h = harness_with(backend, 50, 50);
    h.render.window_mut().close();
    assert!(h.render.run().is_err());
}
