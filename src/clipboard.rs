//! "Copy link" button: writes the page URL to the clipboard and briefly
//! acknowledges it in the button label.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;

use futures_util::future::LocalBoxFuture;
use futures_util::FutureExt;
use tracing::debug;

use crate::error::Result;
use crate::scheduler::{Scheduler, TimerSlot};

pub const COPY_LABEL: &str = "Copy link";
pub const COPIED_LABEL: &str = "Copied!";

/// System clipboard capability.
pub trait Clipboard {
    fn write_text(&self, text: &str) -> LocalBoxFuture<'static, Result<()>>;
}

type LabelListener = Rc<dyn Fn(&str)>;

struct Shared {
    label: RefCell<String>,
    listeners: RefCell<Vec<LabelListener>>,
    revert: TimerSlot,
    ack: Duration,
    clipboard: Rc<dyn Clipboard>,
    scheduler: Rc<dyn Scheduler>,
}

#[derive(Clone)]
pub struct CopyLinkButton {
    shared: Rc<Shared>,
}

impl CopyLinkButton {
    pub fn new(clipboard: Rc<dyn Clipboard>, scheduler: Rc<dyn Scheduler>, ack: Duration) -> Self {
        Self {
            shared: Rc::new(Shared {
                label: RefCell::new(COPY_LABEL.to_string()),
                listeners: RefCell::new(Vec::new()),
                revert: TimerSlot::new(),
                ack,
                clipboard,
                scheduler,
            }),
        }
    }

    pub fn label(&self) -> String {
        self.shared.label.borrow().clone()
    }

    /// Called with the new label whenever it changes.
    pub fn subscribe(&self, listener: impl Fn(&str) + 'static) {
        self.shared.listeners.borrow_mut().push(Rc::new(listener));
    }

    /// Click: copy `url`. On success show the acknowledgement, reverting after
    /// the configured delay; on failure leave the label alone.
    pub fn on_click(&self, url: &str) {
        let pending = self.shared.clipboard.write_text(url);
        let weak: Weak<Shared> = Rc::downgrade(&self.shared);
        self.shared.scheduler.spawn(
            async move {
                let result = pending.await;
                let Some(shared) = weak.upgrade() else {
                    return;
                };
                match result {
                    Ok(()) => Shared::acknowledge(&shared),
                    Err(e) => debug!(error = %e, "clipboard write failed"),
                }
            }
            .boxed_local(),
        );
    }
}

impl Shared {
    fn acknowledge(shared: &Rc<Shared>) {
        shared.set_label(COPIED_LABEL);
        let weak = Rc::downgrade(shared);
        shared.revert.arm_after(
            shared.scheduler.as_ref(),
            shared.ack,
            Box::new(move || {
                if let Some(shared) = weak.upgrade() {
                    shared.set_label(COPY_LABEL);
                }
            }),
        );
    }

    fn set_label(&self, label: &str) {
        {
            let mut current = self.label.borrow_mut();
            if *current == label {
                return;
            }
            *current = label.to_string();
        }
        let listeners: Vec<LabelListener> = self.listeners.borrow().clone();
        for listener in listeners {
            listener(label);
        }
    }
}
