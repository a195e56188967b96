// src/event.rs

//! The normalized event vocabulary and the subscriber list that delivers it.
//!
//! Protocol event layouts stop at the window; everything above it sees only `WindowEvent`.

use crate::dirty::Rect;
use crate::keys::{KeySymbol, Modifiers, MouseButton};
use log::trace;

/// Events raised by a `Window`. Fields are primitives in window-local pixels.
#[derive(Debug, Clone, PartialEq)]
pub enum WindowEvent {
    KeyDown {
        key: KeySymbol,
        modifiers: Modifiers,
    },
    KeyUp {
        key: KeySymbol,
        modifiers: Modifiers,
    },
    /// A single printable character synthesized from a key press.
    TextInput {
        ch: char,
    },
    PointerMove {
        x: i32,
        y: i32,
        modifiers: Modifiers,
    },
    PointerDown {
        button: MouseButton,
        x: i32,
        y: i32,
        modifiers: Modifiers,
    },
    PointerUp {
        button: MouseButton,
        x: i32,
        y: i32,
        modifiers: Modifiers,
    },
    /// Wheel step; negative is up.
    Scroll {
        delta: i32,
        x: i32,
        y: i32,
        modifiers: Modifiers,
    },
    PointerEntered {
        x: i32,
        y: i32,
    },
    PointerLeft {
        x: i32,
        y: i32,
    },
    /// One notification per expose burst, carrying the bounding box of the burst.
    Expose {
        rect: Rect,
    },
    Resize {
        width: u32,
        height: u32,
    },
    /// The close handshake fired. The window is no longer running when this is seen.
    Close,
    FocusGained,
    FocusLost,
}

/// Identifies a subscription for later removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub type EventHandler = Box<dyn FnMut(&WindowEvent)>;

/// Ordered list of event handlers. Dispatch order is subscription order.
#[derive(Default)]
pub struct Subscribers {
    next_id: u64,
    handlers: Vec<(SubscriptionId, EventHandler)>,
}

impl Subscribers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, handler: EventHandler) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.handlers.push((id, handler));
        id
    }

    /// Returns false if `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(sub, _)| *sub != id);
        self.handlers.len() != before
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn dispatch(&mut self, event: &WindowEvent) {
        trace!("Dispatching {:?} to {} subscribers", event, self.handlers.len());
        for (_, handler) in self.handlers.iter_mut() {
            handler(event);
        }
    }
}

impl std::fmt::Debug for Subscribers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscribers")
            .field("count", &self.handlers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn it_should_dispatch_in_subscription_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut subs = Subscribers::new();
        for tag in ["first", "second", "third"] {
            let log = Rc::clone(&log);
            subs.subscribe(Box::new(move |_| log.borrow_mut().push(tag)));
        }
        assert_eq!(subs.len(), 3);
        subs.dispatch(&WindowEvent::FocusGained);
        assert_eq!(*log.borrow(), vec!["first", "second", "third"]);
    }

    #[test]
    fn it_should_stop_delivering_after_unsubscribe() {
        let count = Rc::new(RefCell::new(0));
        let mut subs = Subscribers::new();
        let id = {
            let count = Rc::clone(&count);
            subs.subscribe(Box::new(move |_| *count.borrow_mut() += 1))
        };
        subs.dispatch(&WindowEvent::Close);
        assert!(subs.unsubscribe(id));
        assert!(!subs.unsubscribe(id));
        subs.dispatch(&WindowEvent::Close);
        assert_eq!(*count.borrow(), 1);
        assert!(subs.is_empty());
    }
}
