use tokio::sync::broadcast;

/// Cross-component session notifications. Carried over an explicit channel
/// owned by the controller rather than ambient global events; payloads carry
/// no timestamps, subscribers read their own clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// A refresh succeeded and the credential store holds the new token.
    TokenRefreshed,
    /// The credential was definitively rejected; the store has been cleared.
    AuthExpired,
}

#[derive(Clone)]
pub struct SessionEvents {
    tx: broadcast::Sender<SessionEvent>,
}

impl SessionEvents {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(16);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    /// Fire-and-forget; having no live subscriber is not an error.
    pub fn emit(&self, event: SessionEvent) {
        let _ = self.tx.send(event);
    }
}

impl Default for SessionEvents {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_emitted_events() {
        let events = SessionEvents::new();
        let mut rx = events.subscribe();
        events.emit(SessionEvent::TokenRefreshed);
        assert_eq!(rx.recv().await.unwrap(), SessionEvent::TokenRefreshed);
    }

    #[test]
    fn emit_without_subscribers_is_a_no_op() {
        let events = SessionEvents::new();
        events.emit(SessionEvent::AuthExpired);
    }
}
