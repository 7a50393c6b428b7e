//! Subject dispatcher (C10): routes an incoming [`Message`] to its
//! registered typed handler by subject, gates on composed readiness, and
//! translates the handler's result into broker-facing acknowledgement
//! semantics.
//!
//! Error policy: a handler error on a reply-expecting subject
//! always acks with a nil reply (there is nothing a redelivery would fix
//! for a request/reply caller). For a fire-and-forget subject, a
//! [`Kind::Validation`] error also acks nil (the payload will never parse
//! on redelivery); every other error kind asks the broker to redeliver.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::warn;

use crate::errors::{Kind, Result};
use crate::observability::metrics as obs_metrics;

type HandlerFuture = Pin<Box<dyn Future<Output = Result<Option<Vec<u8>>>> + Send>>;
type HandlerFn = Arc<dyn Fn(Vec<u8>) -> HandlerFuture + Send + Sync>;

/// A raw inbound message, prior to subject-specific parsing.
#[derive(Debug, Clone)]
pub struct Message {
    pub subject: String,
    pub payload: Vec<u8>,
}

impl Message {
    pub fn new(subject: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            subject: subject.into(),
            payload,
        }
    }
}

/// The dispatcher's verdict on one message, framed in terms the broker
/// integration understands: ack (optionally with a reply payload) or ask
/// for redelivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Acked { reply: Option<Vec<u8>> },
    Redeliver,
}

/// One composed service's health check. The dispatcher ANDs every
/// registered check before accepting a message ("consults a
/// `ready()` predicate that ANDs the readiness of every composed service").
pub trait ReadinessCheck: Send + Sync {
    fn ready(&self) -> bool;
}

struct Route {
    expects_reply: bool,
    handler: HandlerFn,
}

#[derive(Default)]
pub struct SubjectDispatcher {
    routes: HashMap<String, Route>,
    readiness: Vec<Arc<dyn ReadinessCheck>>,
}

impl SubjectDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for `subject`. `expects_reply` controls whether a
    /// handler error becomes a nil ack (reply subjects, and fire-and-forget
    /// subjects on validation errors) or a redeliver request.
    pub fn register<F, Fut>(&mut self, subject: impl Into<String>, expects_reply: bool, handler: F)
    where
        F: Fn(Vec<u8>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Option<Vec<u8>>>> + Send + 'static,
    {
        self.routes.insert(
            subject.into(),
            Route {
                expects_reply,
                handler: Arc::new(move |payload| Box::pin(handler(payload))),
            },
        );
    }

    pub fn add_readiness_check(&mut self, check: Arc<dyn ReadinessCheck>) {
        self.readiness.push(check);
    }

    pub fn ready(&self) -> bool {
        self.readiness.iter().all(|check| check.ready())
    }

    pub async fn dispatch(&self, message: Message) -> DispatchOutcome {
        if !self.ready() {
            warn!(subject = %message.subject, "dispatcher not ready; requesting redelivery");
            obs_metrics::record_dispatch(&message.subject, "not_ready");
            return DispatchOutcome::Redeliver;
        }

        let Some(route) = self.routes.get(message.subject.as_str()) else {
            warn!(subject = %message.subject, "no handler registered for subject");
            obs_metrics::record_dispatch(&message.subject, "unknown_subject");
            return DispatchOutcome::Acked { reply: None };
        };

        match (route.handler)(message.payload).await {
            Ok(reply) => {
                obs_metrics::record_dispatch(&message.subject, "handled");
                DispatchOutcome::Acked { reply }
            }
            Err(err) if route.expects_reply => {
                warn!(subject = %message.subject, error = %err, "handler error on reply subject; replying nil");
                obs_metrics::record_dispatch(&message.subject, "error");
                DispatchOutcome::Acked { reply: None }
            }
            Err(err) if err.kind() == Kind::Validation => {
                warn!(subject = %message.subject, error = %err, "validation error; dropping message");
                obs_metrics::record_dispatch(&message.subject, "error");
                DispatchOutcome::Acked { reply: None }
            }
            Err(err) => {
                warn!(subject = %message.subject, error = %err, "handler error; requesting redelivery");
                obs_metrics::record_dispatch(&message.subject, "error");
                DispatchOutcome::Redeliver
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::CoreError;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct AlwaysReady;
    impl ReadinessCheck for AlwaysReady {
        fn ready(&self) -> bool {
            true
        }
    }

    struct Toggle(Arc<AtomicBool>);
    impl ReadinessCheck for Toggle {
        fn ready(&self) -> bool {
            self.0.load(Ordering::SeqCst)
        }
    }

    #[tokio::test]
    async fn unknown_subject_acks_nil_without_calling_any_handler() {
        let mut dispatcher = SubjectDispatcher::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        dispatcher.register("known.subject", false, move |_payload| {
            let calls = calls_clone.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(None)
            }
        });

        let outcome = dispatcher.dispatch(Message::new("unknown.subject", vec![])).await;
        assert_eq!(outcome, DispatchOutcome::Acked { reply: None });
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn not_ready_requests_redelivery_without_dispatching() {
        let mut dispatcher = SubjectDispatcher::new();
        dispatcher.add_readiness_check(Arc::new(Toggle(Arc::new(AtomicBool::new(false)))));
        dispatcher.register("s", false, |_payload| async move { Ok(None) });
        let outcome = dispatcher.dispatch(Message::new("s", vec![])).await;
        assert_eq!(outcome, DispatchOutcome::Redeliver);
    }

    #[tokio::test]
    async fn reply_subject_error_acks_nil() {
        let mut dispatcher = SubjectDispatcher::new();
        dispatcher.add_readiness_check(Arc::new(AlwaysReady));
        dispatcher.register("s.reply", true, |_payload| async move {
            Err(CoreError::not_found("missing"))
        });
        let outcome = dispatcher.dispatch(Message::new("s.reply", vec![])).await;
        assert_eq!(outcome, DispatchOutcome::Acked { reply: None });
    }

    #[tokio::test]
    async fn fire_and_forget_validation_error_acks_nil() {
        let mut dispatcher = SubjectDispatcher::new();
        dispatcher.register("s.event", false, |_payload| async move {
            Err(CoreError::validation("bad payload"))
        });
        let outcome = dispatcher.dispatch(Message::new("s.event", vec![])).await;
        assert_eq!(outcome, DispatchOutcome::Acked { reply: None });
    }

    #[tokio::test]
    async fn fire_and_forget_conflict_error_requests_redelivery() {
        let mut dispatcher = SubjectDispatcher::new();
        dispatcher.register("s.event", false, |_payload| async move {
            Err(CoreError::conflict("stale revision"))
        });
        let outcome = dispatcher.dispatch(Message::new("s.event", vec![])).await;
        assert_eq!(outcome, DispatchOutcome::Redeliver);
    }

    #[tokio::test]
    async fn successful_reply_subject_returns_handler_bytes() {
        let mut dispatcher = SubjectDispatcher::new();
        dispatcher.register("s.reply", true, |_payload| async move { Ok(Some(b"hi".to_vec())) });
        let outcome = dispatcher.dispatch(Message::new("s.reply", vec![])).await;
        assert_eq!(outcome, DispatchOutcome::Acked { reply: Some(b"hi".to_vec()) });
    }
}
