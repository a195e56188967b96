// src/platform/backends/x11/event.rs
#![allow(non_snake_case)] // Allow non-snake case for X11 types

use crate::platform::backends::RawEvent;
use log::trace;
use x11::xlib;

/// Event classes every window registers for.
pub const EVENT_MASK: libc::c_long = xlib::KeyPressMask
    | xlib::KeyReleaseMask
    | xlib::ButtonPressMask
    | xlib::ButtonReleaseMask
    | xlib::PointerMotionMask
    | xlib::EnterWindowMask
    | xlib::LeaveWindowMask
    | xlib::ExposureMask
    | xlib::StructureNotifyMask
    | xlib::FocusChangeMask;

/// Copies the fields of a native `XEvent` into a `RawEvent`. No interpretation happens here.
pub fn translate(xevent: &xlib::XEvent) -> RawEvent {
    let event_type = xevent.get_type();
    // SAFETY: each arm reads only the union member that `event_type` says is populated.
    unsafe {
        match event_type {
            xlib::KeyPress => {
                let key = xevent.key;
                RawEvent::KeyPress {
                    keycode: key.keycode,
                    state: key.state,
                }
            }
            xlib::KeyRelease => {
                let key = xevent.key;
                RawEvent::KeyRelease {
                    keycode: key.keycode,
                    state: key.state,
                }
            }
            xlib::ButtonPress => {
                let button = xevent.button;
                RawEvent::ButtonPress {
                    button: button.button,
                    x: button.x,
                    y: button.y,
                    state: button.state,
                }
            }
            xlib::ButtonRelease => {
                let button = xevent.button;
                RawEvent::ButtonRelease {
                    button: button.button,
                    x: button.x,
                    y: button.y,
                    state: button.state,
                }
            }
            xlib::MotionNotify => {
                let motion = xevent.motion;
                RawEvent::Motion {
                    x: motion.x,
                    y: motion.y,
                    state: motion.state,
                }
            }
            xlib::EnterNotify => {
                let crossing = xevent.crossing;
                RawEvent::Enter {
                    x: crossing.x,
                    y: crossing.y,
                }
            }
            xlib::LeaveNotify => {
                let crossing = xevent.crossing;
                RawEvent::Leave {
                    x: crossing.x,
                    y: crossing.y,
                }
            }
            xlib::Expose => {
                let expose = xevent.expose;
                RawEvent::Expose {
                    x: expose.x,
                    y: expose.y,
                    width: expose.width,
                    height: expose.height,
                    count: expose.count,
                }
            }
            xlib::ConfigureNotify => {
                let configure = xevent.configure;
                RawEvent::Configure {
                    width: configure.width,
                    height: configure.height,
                }
            }
            xlib::ClientMessage => {
                let client = xevent.client_message;
                RawEvent::ClientMessage {
                    message_type: client.message_type,
                    data0: client.data.get_long(0) as xlib::Atom,
                }
            }
            xlib::FocusIn => RawEvent::FocusIn,
            xlib::FocusOut => RawEvent::FocusOut,
            other => {
                trace!("XEvent: unhandled type {}", other);
                RawEvent::Other { kind: other }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem;

    #[test]
    fn it_should_copy_expose_fields_including_the_pending_count() {
        let mut xevent: xlib::XEvent = unsafe { mem::zeroed() };
        let mut expose: xlib::XExposeEvent = unsafe { mem::zeroed() };
        expose.type_ = xlib::Expose;
        expose.x = 10;
        expose.y = 20;
        expose.width = 30;
        expose.height = 40;
        expose.count = 2;
        xevent.expose = expose;
        assert_eq!(
            translate(&xevent),
            RawEvent::Expose {
                x: 10,
                y: 20,
                width: 30,
                height: 40,
                count: 2
            }
        );
    }

    #[test]
    fn it_should_copy_the_first_client_message_word() {
        let mut xevent: xlib::XEvent = unsafe { mem::zeroed() };
        let mut client: xlib::XClientMessageEvent = unsafe { mem::zeroed() };
        client.type_ = xlib::ClientMessage;
        client.message_type = 7;
        client.format = 32;
        client.data.set_long(0, 99);
        xevent.client_message = client;
        assert_eq!(
            translate(&xevent),
            RawEvent::ClientMessage {
                message_type: 7,
                data0: 99
            }
        );
    }

    #[test]
    fn it_should_pass_unknown_types_through_as_other() {
        let mut xevent: xlib::XEvent = unsafe { mem::zeroed() };
        xevent.type_ = xlib::PropertyNotify;
        assert_eq!(
            translate(&xevent),
            RawEvent::Other {
                kind: xlib::PropertyNotify
            }
        );
    }
}
