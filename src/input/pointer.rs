//! Window-level pointer listeners with scoped registration.
//!
//! Registering a listener hands back a [`ListenerGuard`]; dropping the guard
//! detaches the listener. Drag sessions own their guard, so a drag that ends
//! through any path (pointer release, tool switch, session close) cannot
//! leave a listener behind.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::geometry::Point;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down(Point),
    Move(Point),
    Up(Point),
}

type Listener = Box<dyn FnMut(PointerEvent)>;

#[derive(Default)]
struct HubInner {
    next_id: u64,
    listeners: Vec<(u64, Listener)>,
    dispatching: bool,
    detached_while_dispatching: Vec<u64>,
}

impl HubInner {
    fn detach(&mut self, id: u64) {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        if self.listeners.len() == before && self.dispatching {
            self.detached_while_dispatching.push(id);
        }
    }
}

#[derive(Clone, Default)]
pub struct PointerHub {
    inner: Rc<RefCell<HubInner>>,
}

impl std::fmt::Debug for PointerHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PointerHub")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl PointerHub {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "dropping the guard detaches the listener immediately"]
    pub fn register(&self, listener: impl FnMut(PointerEvent) + 'static) -> ListenerGuard {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id = inner.next_id.wrapping_add(1);
        inner.listeners.push((id, Box::new(listener)));
        ListenerGuard {
            id,
            hub: Rc::downgrade(&self.inner),
        }
    }

    pub fn listener_count(&self) -> usize {
        self.inner.borrow().listeners.len()
    }

    pub fn dispatch(&self, event: PointerEvent) {
        let mut active = {
            let mut inner = self.inner.borrow_mut();
            inner.dispatching = true;
            std::mem::take(&mut inner.listeners)
        };

        for (_, listener) in active.iter_mut() {
            listener(event);
        }

        let mut inner = self.inner.borrow_mut();
        inner.dispatching = false;
        let detached = std::mem::take(&mut inner.detached_while_dispatching);
        active.retain(|(id, _)| !detached.contains(id));
        let registered_meanwhile = std::mem::replace(&mut inner.listeners, active);
        inner.listeners.extend(registered_meanwhile);
    }
}

/// Detaches its listener when dropped.
#[derive(Debug)]
pub struct ListenerGuard {
    id: u64,
    hub: Weak<RefCell<HubInner>>,
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        if let Some(hub) = self.hub.upgrade() {
            hub.borrow_mut().detach(self.id);
        }
    }
}

/// A handle drag that ends on the next window-level pointer release, even
/// one that lands outside the handle.
#[derive(Debug)]
pub struct DragSession<T> {
    target: T,
    released: Rc<Cell<bool>>,
    _release: ListenerGuard,
}

impl<T> DragSession<T> {
    pub fn begin(window: &PointerHub, target: T) -> Self {
        let released = Rc::new(Cell::new(false));
        let flag = Rc::clone(&released);
        let guard = window.register(move |event| {
            if matches!(event, PointerEvent::Up(_)) {
                flag.set(true);
            }
        });
        Self {
            target,
            released,
            _release: guard,
        }
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    pub fn is_released(&self) -> bool {
        self.released.get()
    }
}
