//! User-facing notifications.
//!
//! Components never talk to a global alert primitive directly. They receive a
//! [`NotificationPort`] and report through it, which keeps them usable in
//! headless hosts and tests.

use std::cell::RefCell;

/// How serious a notice is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Informational message
    Info,
    /// Something was refused but nothing broke
    Warning,
    /// An operation failed
    Error,
}

impl Severity {
    /// Get the display name for this severity.
    pub fn name(&self) -> &'static str {
        match self {
            Severity::Info => "Info",
            Severity::Warning => "Warning",
            Severity::Error => "Error",
        }
    }
}

/// A notice delivered to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    pub severity: Severity,
}

/// Capability for surfacing messages to the user.
pub trait NotificationPort {
    fn notify(&self, message: &str, severity: Severity);
}

/// Forwards notices to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl NotificationPort for LogNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        match severity {
            Severity::Info => log::info!("🔔 {}", message),
            Severity::Warning => log::warn!("🔔 {}", message),
            Severity::Error => log::error!("🔔 {}", message),
        }
    }
}

/// Keeps every notice in memory so a host can render or inspect them later.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    notices: RefCell<Vec<Notice>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all notices received so far, oldest first.
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.borrow().clone()
    }

    /// Messages only, oldest first.
    pub fn messages(&self) -> Vec<String> {
        self.notices
            .borrow()
            .iter()
            .map(|n| n.message.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.notices.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.notices.borrow().is_empty()
    }

    /// Drain all pending notices.
    pub fn take(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.notices.borrow_mut())
    }
}

impl NotificationPort for MemoryNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        log::debug!("🔔 [{}] {}", severity.name(), message);
        self.notices.borrow_mut().push(Notice {
            message: message.to_string(),
            severity,
        });
    }
}

/// Shows notices with the browser's `window.alert`.
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Default, Clone, Copy)]
pub struct AlertNotifier;

#[cfg(target_arch = "wasm32")]
impl NotificationPort for AlertNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        LogNotifier.notify(message, severity);

        let Some(window) = web_sys::window() else {
            return;
        };
        if let Err(e) = window.alert_with_message(message) {
            log::warn!("Failed to show alert: {:?}", e);
        }
    }
}
