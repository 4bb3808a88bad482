use serde::Serialize;
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use uuid::Uuid;

use super::timers::TimerQueue;

pub type ToastId = Uuid;

/// Stack geometry: fixed toast height plus gap, newest at the bottom.
const TOAST_HEIGHT_PX: u32 = 60;
const TOAST_GAP_PX: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    Message,
    Success,
    Warning,
    Error,
}

impl ToastKind {
    pub fn from_name(name: &str) -> Self {
        match name {
            "success" => ToastKind::Success,
            "warning" => ToastKind::Warning,
            "error" => ToastKind::Error,
            _ => ToastKind::Message,
        }
    }

    pub fn class(self) -> &'static str {
        match self {
            ToastKind::Message => "toast-message",
            ToastKind::Success => "toast-success",
            ToastKind::Warning => "toast-warning",
            ToastKind::Error => "toast-error",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub id: ToastId,
    pub message: String,
    pub kind: ToastKind,
    pub persistent: bool,
    pub classes: Vec<String>,
    /// `toast-<type>`, kept verbatim for types the panel doesn't know
    type_class: String,
    fading: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToastView {
    pub id: ToastId,
    pub message: String,
    pub kind: ToastKind,
    pub classes: Vec<String>,
    pub persistent: bool,
    pub fading: bool,
    pub bottom_px: u32,
}

#[derive(Debug)]
enum ToastTimer {
    AutoDismiss(ToastId),
    Remove(ToastId),
}

/// Bounded toast stack with a FIFO overflow queue.
#[derive(Debug)]
pub struct Toaster {
    capacity: usize,
    duration: Duration,
    fade: Duration,
    visible: Vec<Toast>,
    queue: VecDeque<Toast>,
    timers: TimerQueue<ToastTimer>,
}

impl Toaster {
    pub fn new(capacity: usize, duration: Duration, fade: Duration) -> Self {
        Self {
            capacity: capacity.max(1),
            duration,
            fade,
            visible: Vec::new(),
            queue: VecDeque::new(),
            timers: TimerQueue::default(),
        }
    }

    pub fn show(
        &mut self,
        now: Instant,
        message: impl Into<String>,
        kind: ToastKind,
        persistent: bool,
        classes: &[&str],
    ) -> ToastId {
        let toast = Toast {
            id: Uuid::new_v4(),
            message: message.into(),
            kind,
            persistent,
            classes: classes.iter().map(|c| c.to_string()).collect(),
            type_class: kind.class().to_string(),
            fading: false,
        };
        self.push(now, toast)
    }

    /// Toast requested by the backend with a free-form type name.
    pub fn show_typed(
        &mut self,
        now: Instant,
        message: impl Into<String>,
        type_name: &str,
    ) -> ToastId {
        let toast = Toast {
            id: Uuid::new_v4(),
            message: message.into(),
            kind: ToastKind::from_name(type_name),
            persistent: false,
            classes: Vec::new(),
            type_class: format!("toast-{}", type_name),
            fading: false,
        };
        self.push(now, toast)
    }

    fn push(&mut self, now: Instant, toast: Toast) -> ToastId {
        let id = toast.id;

        if self.visible.len() >= self.capacity {
            tracing::debug!("Toast stack full, queueing {:?}", toast.message);
            self.queue.push_back(toast);
        } else {
            self.display(now, toast);
        }
        id
    }

    fn display(&mut self, now: Instant, toast: Toast) {
        if !toast.persistent {
            self.timers
                .schedule(now + self.duration, ToastTimer::AutoDismiss(toast.id));
        }
        self.visible.push(toast);
    }

    /// Click dismissal, ignored for persistent toasts.
    pub fn click(&mut self, now: Instant, id: ToastId) -> bool {
        let dismissible = self
            .visible
            .iter()
            .any(|toast| toast.id == id && !toast.persistent);
        dismissible && self.dismiss(now, id)
    }

    /// Start the fade-out of a visible toast, or drop it from the queue if
    /// it never got displayed.
    pub fn dismiss(&mut self, now: Instant, id: ToastId) -> bool {
        if let Some(toast) = self.visible.iter_mut().find(|toast| toast.id == id) {
            if toast.fading {
                return false;
            }
            toast.fading = true;
            self.timers.schedule(now + self.fade, ToastTimer::Remove(id));
            return true;
        }

        let queued = self.queue.len();
        self.queue.retain(|toast| toast.id != id);
        self.queue.len() != queued
    }

    pub fn tick(&mut self, now: Instant) {
        while let Some((at, timer)) = self.timers.pop_due(now) {
            match timer {
                ToastTimer::AutoDismiss(id) => {
                    self.dismiss(at, id);
                }
                ToastTimer::Remove(id) => self.remove(at, id),
            }
        }
    }

    fn remove(&mut self, at: Instant, id: ToastId) {
        let before = self.visible.len();
        self.visible.retain(|toast| toast.id != id);
        if self.visible.len() == before {
            return;
        }
        if let Some(next) = self.queue.pop_front() {
            self.display(at, next);
        }
    }

    pub fn visible(&self) -> &[Toast] {
        &self.visible
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn views(&self) -> Vec<ToastView> {
        let count = self.visible.len() as u32;
        self.visible
            .iter()
            .enumerate()
            .map(|(index, toast)| {
                let mut classes = vec![toast.type_class.clone()];
                classes.extend(toast.classes.iter().cloned());
                ToastView {
                    id: toast.id,
                    message: toast.message.clone(),
                    kind: toast.kind,
                    classes,
                    persistent: toast.persistent,
                    fading: toast.fading,
                    bottom_px: (count - 1 - index as u32) * (TOAST_HEIGHT_PX + TOAST_GAP_PX),
                }
            })
            .collect()
    }
}
