//! Custom error handlers evaluated after the built-in rules pass.
//!
//! Handlers run in append order. The first one that reports the invocation as
//! handled stops processing: no further handler and no callback runs. Sending
//! feedback to the actor is the handler's own job.
use super::CommandInvocation;
use crate::host::ActorHost;

pub trait CustomErrorHandler<H: ?Sized>: Send + Sync {
    /// Return `true` if the invocation was handled and dispatch must stop.
    fn handle(&self, host: &mut H, invocation: &CommandInvocation) -> bool;
}

impl<H: ?Sized, F> CustomErrorHandler<H> for F
where
    F: Fn(&mut H, &CommandInvocation) -> bool + Send + Sync,
{
    fn handle(&self, host: &mut H, invocation: &CommandInvocation) -> bool {
        self(host, invocation)
    }
}

/// Handler that rejects with a fixed message whenever `predicate` holds.
pub struct RejectWhen<P> {
    predicate: P,
    message: String,
}

impl<H, P> CustomErrorHandler<H> for RejectWhen<P>
where
    H: ActorHost + ?Sized,
    P: Fn(&CommandInvocation) -> bool + Send + Sync,
{
    fn handle(&self, host: &mut H, invocation: &CommandInvocation) -> bool {
        if (self.predicate)(invocation) {
            host.send_message(invocation.actor(), &self.message);
            true
        } else {
            false
        }
    }
}

pub fn reject_when<P>(predicate: P, message: impl Into<String>) -> RejectWhen<P>
where
    P: Fn(&CommandInvocation) -> bool + Send + Sync,
{
    RejectWhen {
        predicate,
        message: message.into(),
    }
}

/// Append-only list of handlers owned by one pipeline.
pub struct ErrorChain<H: ?Sized> {
    handlers: Vec<Box<dyn CustomErrorHandler<H>>>,
}

impl<H: ?Sized> Default for ErrorChain<H> {
    fn default() -> Self {
        Self { handlers: Vec::new() }
    }
}

impl<H: ?Sized> ErrorChain<H> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, handler: impl CustomErrorHandler<H> + 'static) {
        self.handlers.push(Box::new(handler));
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Index of the handler that stopped the chain, if any.
    pub fn run(&self, host: &mut H, invocation: &CommandInvocation) -> Option<usize> {
        self.handlers
            .iter()
            .position(|handler| handler.handle(host, invocation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::memory::MemoryHost;
    use crate::host::Actor;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn first_handled_stops_the_chain() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut chain: ErrorChain<MemoryHost> = ErrorChain::new();
        let c1 = calls.clone();
        chain.append(move |_: &mut MemoryHost, _: &CommandInvocation| {
            c1.fetch_add(1, Ordering::SeqCst);
            false
        });
        chain.append(reject_when(|inv: &CommandInvocation| inv.label() == "stop", "stopped"));
        let c3 = calls.clone();
        chain.append(move |_: &mut MemoryHost, _: &CommandInvocation| {
            c3.fetch_add(100, Ordering::SeqCst);
            true
        });

        let mut host = MemoryHost::new();
        let alice = Actor::player("alice");
        let inv = CommandInvocation::new(alice.clone(), "stop", vec![]);
        assert_eq!(chain.run(&mut host, &inv), Some(1));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(host.messages_for(&alice), vec!["stopped"]);

        let inv = CommandInvocation::new(alice, "go", vec![]);
        assert_eq!(chain.run(&mut host, &inv), Some(2));
        assert_eq!(calls.load(Ordering::SeqCst), 102);
    }

    #[test]
    fn empty_chain_never_handles() {
        let chain: ErrorChain<MemoryHost> = ErrorChain::new();
        let inv = CommandInvocation::new(Actor::console(), "x", vec![]);
        assert!(chain.is_empty());
        assert_eq!(chain.run(&mut MemoryHost::new(), &inv), None);
    }
}
