//! "Add attachment" popover and its global listeners
//!
//! Listeners exist only while the popover is open. They are held by
//! `Subscription` guards, so closing, dropping the popover, or unwinding out of
//! a handler always unsubscribes.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use tracing::debug;

use crate::input::Key;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ListenerKind {
    PointerDown,
    KeyDown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// Process-wide event source (the window in a browser)
pub trait GlobalEvents {
    fn subscribe(&self, kind: ListenerKind) -> ListenerId;
    fn unsubscribe(&self, id: ListenerId);
}

/// Single-threaded listener registry
///
/// Hosts consult `is_listening` to decide whether global events should be
/// routed to the composer at all.
#[derive(Debug, Default)]
pub struct EventRegistry {
    next_id: Cell<u64>,
    active: RefCell<BTreeMap<ListenerId, ListenerKind>>,
}

impl EventRegistry {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn is_listening(&self, kind: ListenerKind) -> bool {
        self.active.borrow().values().any(|k| *k == kind)
    }

    pub fn active_count(&self) -> usize {
        self.active.borrow().len()
    }
}

impl GlobalEvents for EventRegistry {
    fn subscribe(&self, kind: ListenerKind) -> ListenerId {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.active.borrow_mut().insert(id, kind);
        id
    }

    fn unsubscribe(&self, id: ListenerId) {
        self.active.borrow_mut().remove(&id);
    }
}

/// Scoped listener registration, released on drop
pub struct Subscription {
    events: Rc<dyn GlobalEvents>,
    id: ListenerId,
}

impl Subscription {
    pub fn new(events: Rc<dyn GlobalEvents>, kind: ListenerKind) -> Self {
        let id = events.subscribe(kind);
        Self { events, id }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.events.unsubscribe(self.id);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned screen region, end-exclusive
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Region {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x < self.x + self.width && p.y >= self.y && p.y < self.y + self.height
    }
}

pub struct Popover {
    events: Rc<dyn GlobalEvents>,
    /// Button + menu area; pointer-downs inside keep the popover open
    root: Region,
    listeners: Option<[Subscription; 2]>,
}

impl Popover {
    pub fn new(events: Rc<dyn GlobalEvents>) -> Self {
        Self {
            events,
            root: Region::default(),
            listeners: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.listeners.is_some()
    }

    pub fn set_root(&mut self, root: Region) {
        self.root = root;
    }

    pub fn root(&self) -> Region {
        self.root
    }

    pub fn open(&mut self) {
        if self.is_open() {
            return;
        }
        self.listeners = Some([
            Subscription::new(Rc::clone(&self.events), ListenerKind::PointerDown),
            Subscription::new(Rc::clone(&self.events), ListenerKind::KeyDown),
        ]);
        debug!("Popover opened");
    }

    /// Returns true if it was open
    pub fn close(&mut self) -> bool {
        let was_open = self.listeners.take().is_some();
        if was_open {
            debug!("Popover closed");
        }
        was_open
    }

    pub fn toggle(&mut self) {
        if !self.close() {
            self.open();
        }
    }

    /// Global pointer-down; closes when outside the root region
    pub fn on_pointer_down(&mut self, at: Point) -> bool {
        if !self.is_open() || self.root.contains(at) {
            return false;
        }
        self.close()
    }

    /// Global key-down; Escape closes
    pub fn on_key(&mut self, key: Key) -> bool {
        if key == Key::Escape {
            self.close()
        } else {
            false
        }
    }
}
