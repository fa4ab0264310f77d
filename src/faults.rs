//! Fault Handler Registration
//!
//! Uncaught faults (panics that reach the top of the process) are routed to
//! every registered [`FaultHandler`]. The framework registers its
//! [`ExceptionHandler`] once while bootstrapping; the host decides whether to
//! route panics here by calling [`install_panic_hook`].

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{error, info};

/// An uncaught fault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    pub message: String,
    /// `file:line:column` where the fault was raised, when known.
    pub location: Option<String>,
}

impl Fault {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: None,
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

impl std::fmt::Display for Fault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{} at {}", self.message, location),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Receives uncaught faults.
pub trait FaultHandler: Send + Sync {
    fn handle(&self, fault: &Fault);
}

/// Registered fault handlers, called in registration order.
#[derive(Default)]
pub struct FaultHooks {
    handlers: RwLock<Vec<Arc<dyn FaultHandler>>>,
}

impl FaultHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, handler: Arc<dyn FaultHandler>) {
        self.handlers.write().push(handler);
    }

    pub fn len(&self) -> usize {
        self.handlers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.read().is_empty()
    }

    pub fn dispatch(&self, fault: &Fault) {
        let handlers = self.handlers.read().clone();
        for handler in handlers {
            handler.handle(fault);
        }
    }
}

impl std::fmt::Debug for FaultHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FaultHooks")
            .field("handler_count", &self.len())
            .finish()
    }
}

#[derive(Debug, Clone, Default)]
struct ExceptionSettings {
    action: String,
    debug: bool,
}

/// The framework's own fault handler.
///
/// Logs every fault and, when an exception action such as `site/exception` is
/// configured, names the controller action that renders it.
#[derive(Debug, Default)]
pub struct ExceptionHandler {
    settings: RwLock<ExceptionSettings>,
}

impl ExceptionHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_exception_action(&self, action: impl Into<String>) {
        self.settings.write().action = action.into();
    }

    pub fn set_debug(&self, debug: bool) {
        self.settings.write().debug = debug;
    }

    /// `(controller, action)` that faults are routed to.
    pub fn exception_route(&self) -> Option<(String, String)> {
        let settings = self.settings.read();
        let (controller, action) = settings.action.split_once('/')?;
        if controller.is_empty() || action.is_empty() {
            return None;
        }
        Some((controller.to_string(), action.to_string()))
    }
}

impl FaultHandler for ExceptionHandler {
    fn handle(&self, fault: &Fault) {
        let debug = self.settings.read().debug;
        if debug {
            error!(target: "rays::faults", location = ?fault.location, "{}", fault.message);
        } else {
            error!(target: "rays::faults", "{}", fault.message);
        }

        if let Some((controller, action)) = self.exception_route() {
            info!(target: "rays::faults", %controller, %action, "Routing fault to exception action");
        }
    }
}

/// Route uncaught panics to `hooks`, then to the previous panic hook.
pub fn install_panic_hook(hooks: Arc<FaultHooks>) {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let message = info
            .payload()
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| info.payload().downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "uncaught fault".to_string());

        let mut fault = Fault::new(message);
        if let Some(location) = info.location() {
            fault = fault.with_location(location.to_string());
        }

        hooks.dispatch(&fault);
        previous(info);
    }));
}
