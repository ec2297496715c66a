use dashmap::DashMap;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;
use uuid::Uuid;

pub trait Transport: Send + Sync {
    fn send(&self, recipient: Uuid, event: &str, payload: Value) -> bool;
    fn is_online(&self, recipient: Uuid) -> bool;
}

#[derive(Debug, Clone, Serialize)]
pub struct Envelope {
    pub event: String,
    pub data: Value,
}

#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    connections: std::sync::Arc<DashMap<Uuid, mpsc::UnboundedSender<Envelope>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // Replaces any previous connection for the same identity.
    pub fn register(&self, id: Uuid) -> mpsc::UnboundedReceiver<Envelope> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.connections.insert(id, tx);
        rx
    }

    // Removes the entry only if it still belongs to the caller's channel,
    // so tearing down a stale socket cannot evict a fresh reconnect.
    pub fn unregister(&self, id: Uuid, handle: &mpsc::UnboundedSender<Envelope>) {
        self.connections
            .remove_if(&id, |_, tx| tx.same_channel(handle));
    }

    pub fn sender(&self, id: Uuid) -> Option<mpsc::UnboundedSender<Envelope>> {
        self.connections.get(&id).map(|entry| entry.clone())
    }
}

impl Transport for ConnectionRegistry {
    fn send(&self, recipient: Uuid, event: &str, payload: Value) -> bool {
        match self.connections.get(&recipient) {
            Some(tx) => tx
                .send(Envelope {
                    event: event.to_string(),
                    data: payload,
                })
                .is_ok(),
            None => false,
        }
    }

    fn is_online(&self, recipient: Uuid) -> bool {
        self.connections.contains_key(&recipient)
    }
}

#[cfg(test)]
pub struct RecordingTransport {
    online: std::sync::Mutex<std::collections::HashSet<Uuid>>,
    sent: std::sync::Mutex<Vec<(Uuid, String, Value)>>,
}

#[cfg(test)]
impl RecordingTransport {
    pub fn new() -> Self {
        Self {
            online: std::sync::Mutex::new(std::collections::HashSet::new()),
            sent: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn set_online(&self, id: Uuid) {
        self.online.lock().unwrap().insert(id);
    }

    pub fn sent(&self) -> Vec<(Uuid, String, Value)> {
        self.sent.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl Transport for RecordingTransport {
    fn send(&self, recipient: Uuid, event: &str, payload: Value) -> bool {
        self.sent
            .lock()
            .unwrap()
            .push((recipient, event.to_string(), payload));
        true
    }

    fn is_online(&self, recipient: Uuid) -> bool {
        self.online.lock().unwrap().contains(&recipient)
    }
}
