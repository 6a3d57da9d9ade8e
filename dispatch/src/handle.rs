//! Result cells handed out by the dispatcher.

use std::future::IntoFuture;

use futures_util::future::BoxFuture;
use tokio::sync::watch;

use crate::traits::LlmError;

pub type Outcome = Result<String, LlmError>;

/// Receives the outcome of one submission.
///
/// The outcome is set exactly once. It can be awaited from any number of
/// clones and never changes afterwards.
#[derive(Clone, Debug)]
pub struct Handle {
    rx: watch::Receiver<Option<Outcome>>,
}

/// Write side of a [`Handle`]. Dropping it without resolving resolves the
/// handle to [`LlmError::Aborted`].
#[derive(Debug)]
pub(crate) struct Resolver {
    tx: watch::Sender<Option<Outcome>>,
}

impl Handle {
    pub(crate) fn pending() -> (Resolver, Handle) {
        let (tx, rx) = watch::channel(None);
        (Resolver { tx }, Handle { rx })
    }

    /// A handle that is already resolved to `outcome`.
    pub fn resolved(outcome: Outcome) -> Handle {
        let (resolver, handle) = Handle::pending();
        resolver.resolve(outcome);
        handle
    }

    /// Wait for the outcome.
    pub async fn wait(&self) -> Outcome {
        let mut rx = self.rx.clone();
        let outcome = match rx.wait_for(Option::is_some).await {
            Ok(value) => value.clone().unwrap_or(Err(LlmError::Aborted)),
            Err(_) => Err(LlmError::Aborted),
        };
        outcome
    }

    /// The outcome, if it is already known.
    pub fn try_result(&self) -> Option<Outcome> {
        if let Some(outcome) = self.rx.borrow().clone() {
            return Some(outcome);
        }
        if self.rx.has_changed().is_err() {
            return Some(Err(LlmError::Aborted));
        }
        None
    }

    pub fn is_resolved(&self) -> bool {
        self.try_result().is_some()
    }
}

impl IntoFuture for Handle {
    type Output = Outcome;
    type IntoFuture = BoxFuture<'static, Outcome>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(async move { self.wait().await })
    }
}

impl Resolver {
    pub(crate) fn resolve(self, outcome: Outcome) {
        self.tx.send_replace(Some(outcome));
    }
}
