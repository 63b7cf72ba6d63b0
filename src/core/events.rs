//! Payment events
//!
//! Listeners register a callback with [`EventDispatcher::subscribe`] and are
//! called synchronously, in registration order, for every emitted event.

use crate::types::{StatusCode, TransactionRecord};

/// Something that happened to a transaction
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PaymentEvent<'a> {
    /// An authorization was approved
    PaymentSuccessful(&'a TransactionRecord),
    /// An authorization was declined or failed
    PaymentFlagged(&'a TransactionRecord),
    /// A status query changed the record's status pair
    StatusChanged {
        record: &'a TransactionRecord,
        previous: StatusCode,
    },
}

impl PaymentEvent<'_> {
    pub fn record(&self) -> &TransactionRecord {
        match self {
            PaymentEvent::PaymentSuccessful(record) | PaymentEvent::PaymentFlagged(record) => *record,
            PaymentEvent::StatusChanged { record, .. } => *record,
        }
    }
}

type Listener = Box<dyn Fn(&PaymentEvent<'_>)>;

/// Ordered list of event listeners
#[derive(Default)]
pub struct EventDispatcher {
    listeners: Vec<Listener>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener
    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: Fn(&PaymentEvent<'_>) + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Deliver an event to every listener
    pub fn emit(&self, event: &PaymentEvent<'_>) {
        for listener in &self.listeners {
            listener(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
