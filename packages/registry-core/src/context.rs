//! Per-call execution context: cancellation, deadline and log attachments.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::ContextError;
use crate::fields::LogFields;

/// Immutable carrier threaded through every registry call.
///
/// A context is never modified in place. Every `with_*` method returns a new
/// derived context and leaves the receiver untouched, so a single context can be
/// shared freely between concurrent calls. Derivation keeps the parent's
/// cancellation token and deadline, which means a derived context observes
/// cancellation and expiry of the context it was derived from.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    cancel: CancellationToken,
    deadline: Option<Instant>,
    fields: LogFields,
}

impl ExecutionContext {
    /// Root context: no deadline, no attachments, cancelled only through
    /// contexts derived with [`with_cancel`](Self::with_cancel).
    #[must_use]
    pub fn background() -> Self {
        Self {
            inner: Arc::new(Inner {
                cancel: CancellationToken::new(),
                deadline: None,
                fields: LogFields::new(),
            }),
        }
    }

    /// Derives a context that can be cancelled independently of its parent.
    ///
    /// Cancelling the returned token cancels the derived context only; cancelling
    /// the parent cancels both.
    #[must_use]
    pub fn with_cancel(&self) -> (Self, CancellationToken) {
        let token = self.inner.cancel.child_token();
        let ctx = self.derive(
            token.clone(),
            self.inner.deadline,
            self.inner.fields.clone(),
        );
        (ctx, token)
    }

    /// Derives a context expiring at `deadline`, or at the parent's deadline if
    /// that one is earlier.
    #[must_use]
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.inner.deadline {
            Some(existing) if existing <= deadline => existing,
            _ => deadline,
        };
        self.derive(
            self.inner.cancel.clone(),
            Some(deadline),
            self.inner.fields.clone(),
        )
    }

    #[must_use]
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Derives a context whose attachments are this context's attachments
    /// overlaid with `fields`.
    ///
    /// Same-named keys take the value from `fields`. An empty `fields` yields
    /// this very context (see [`ptr_eq`](Self::ptr_eq)).
    #[must_use]
    pub fn with_fields(&self, fields: &LogFields) -> Self {
        if fields.is_empty() {
            return self.clone();
        }
        self.derive(
            self.inner.cancel.clone(),
            self.inner.deadline,
            self.inner.fields.merged(fields),
        )
    }

    fn derive(
        &self,
        cancel: CancellationToken,
        deadline: Option<Instant>,
        fields: LogFields,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                cancel,
                deadline,
                fields,
            }),
        }
    }

    /// All log attachments carried by this context.
    #[must_use]
    pub fn fields(&self) -> &LogFields {
        &self.inner.fields
    }

    #[must_use]
    pub fn field(&self, key: &str) -> Option<&str> {
        self.inner.fields.get(key)
    }

    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.inner.deadline
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }

    /// Returns why this context is done, or `None` while it is still live.
    ///
    /// Cancellation is reported ahead of expiry when both apply.
    #[must_use]
    pub fn err(&self) -> Option<ContextError> {
        if self.inner.cancel.is_cancelled() {
            return Some(ContextError::Cancelled);
        }
        match self.inner.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(ContextError::DeadlineExceeded),
            _ => None,
        }
    }

    /// Resolves once the context is cancelled or its deadline passes.
    pub async fn done(&self) -> ContextError {
        match self.inner.deadline {
            Some(deadline) => tokio::select! {
                biased;
                () = self.inner.cancel.cancelled() => ContextError::Cancelled,
                () = tokio::time::sleep_until(deadline) => ContextError::DeadlineExceeded,
            },
            None => {
                self.inner.cancel.cancelled().await;
                ContextError::Cancelled
            }
        }
    }

    /// Returns `true` when both handles refer to the same context value.
    #[must_use]
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }

    /// Span carrying this context's attachments, for log sinks downstream.
    #[must_use]
    pub fn span(&self, method: &'static str) -> tracing::Span {
        tracing::info_span!("registry", method = method, fields = %self.inner.fields)
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::background()
    }
}
