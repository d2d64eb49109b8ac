use crate::callback::CallbackQueue;
use crate::config::ContainerConfig;
use crate::error::OperationError;
use crate::transport::{Endpoint, Transport, TransportRequest};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;
use tracing::debug;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationState {
    Constructed,
    Executing,
    Cancelled,
    Finished,
}

impl OperationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Constructed => "CONSTRUCTED",
            Self::Executing => "EXECUTING",
            Self::Cancelled => "CANCELLED",
            Self::Finished => "FINISHED",
        }
    }

    pub fn can_transition_to(&self, next: &OperationState) -> bool {
        if self == next {
            return true;
        }
        matches!(
            (self, next),
            (Self::Constructed, Self::Executing)
                | (Self::Constructed, Self::Cancelled)
                | (Self::Executing, Self::Cancelled)
                | (Self::Executing, Self::Finished)
                | (Self::Cancelled, Self::Finished)
        )
    }
}

impl fmt::Display for OperationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal outcome handed to an operation's typed completion callback.
#[derive(Clone, Debug, PartialEq)]
pub enum Completion<T> {
    Success(T),
    Failed(OperationError),
    Cancelled,
}

impl<T> Completion<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    pub fn error(&self) -> Option<&OperationError> {
        match self {
            Self::Failed(error) => Some(error),
            _ => None,
        }
    }

    pub fn success(self) -> Option<T> {
        match self {
            Self::Success(value) => Some(value),
            _ => None,
        }
    }
}

/// One kind of remote work: the request it sends and how its response is read.
pub trait RemoteOperation: Send + Sync + 'static {
    type Output: Send + 'static;
    type Item: Send + 'static;

    /// Name used in logs.
    const NAME: &'static str;

    fn endpoint(&self) -> Endpoint;

    fn body(&self) -> Option<Value>;

    /// Reads a successful response. Per-item results pushed onto `items` are
    /// delivered before the completion callbacks.
    fn interpret(
        &self,
        document: Value,
        items: &mut Vec<Result<Self::Item, OperationError>>,
    ) -> Result<Self::Output, OperationError>;
}

#[derive(Debug)]
struct OperationShared {
    id: Uuid,
    name: &'static str,
    cancel_requested: AtomicBool,
    outcome_committed: AtomicBool,
    state: watch::Sender<OperationState>,
}

impl OperationShared {
    fn new(name: &'static str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            cancel_requested: AtomicBool::new(false),
            outcome_committed: AtomicBool::new(false),
            state: watch::Sender::new(OperationState::Constructed),
        }
    }

    fn state(&self) -> OperationState {
        *self.state.borrow()
    }

    fn is_cancel_requested(&self) -> bool {
        self.cancel_requested.load(Ordering::SeqCst)
    }

    fn transition_to(&self, next: OperationState) -> Result<(), OperationError> {
        let mut outcome = Ok(());
        self.state.send_if_modified(|state| {
            if *state == next {
                return false;
            }
            if !state.can_transition_to(&next) {
                outcome = Err(OperationError::InvalidStateTransition {
                    from: state.to_string(),
                    to: next.to_string(),
                });
                return false;
            }
            debug!(operation = self.name, id = %self.id, from = %state, to = %next, "operation state transition");
            *state = next;
            true
        });
        outcome
    }

    /// Constructed -> Executing, unless a cancel got there first.
    fn begin(&self) -> bool {
        self.transition_to(OperationState::Executing).is_ok()
    }

    /// Accepted only while the outcome is still open. The flag and the state
    /// change under the same watch lock as [`Self::commit_outcome`].
    fn request_cancel(&self) -> bool {
        let mut accepted = false;
        self.state.send_if_modified(|state| {
            let open = matches!(
                state,
                OperationState::Constructed | OperationState::Executing
            ) && !self.outcome_committed.load(Ordering::SeqCst);
            if !open {
                return false;
            }
            debug!(operation = self.name, id = %self.id, from = %state, "cancel accepted");
            self.cancel_requested.store(true, Ordering::SeqCst);
            *state = OperationState::Cancelled;
            accepted = true;
            true
        });
        if !accepted {
            debug!(operation = self.name, id = %self.id, "cancel ignored; outcome already decided");
        }
        accepted
    }

    /// Fixes the outcome once the response is in. Returns `false` when a cancel
    /// won the race, in which case the response must be discarded.
    fn commit_outcome(&self) -> bool {
        let mut cancelled = false;
        self.state.send_if_modified(|state| {
            cancelled = *state == OperationState::Cancelled;
            if !cancelled {
                self.outcome_committed.store(true, Ordering::SeqCst);
            }
            false
        });
        !cancelled
    }

    /// Forces `Finished` for an operation whose terminal callback never ran to
    /// the end: dropped unexecuted, aborted mid-flight, or a callback panicked.
    fn abandon(&self) {
        self.state.send_if_modified(|state| {
            if *state == OperationState::Finished {
                return false;
            }
            debug!(operation = self.name, id = %self.id, from = %state, "operation dropped before finishing");
            *state = OperationState::Finished;
            true
        });
    }
}

/// Owned by the operation and then by its terminal callback job. Dropping it
/// without [`FinishGuard::complete`] still releases anyone awaiting
/// [`OperationHandle::finished`].
struct FinishGuard {
    shared: Arc<OperationShared>,
}

impl FinishGuard {
    fn complete(self) {
        if let Err(error) = self.shared.transition_to(OperationState::Finished) {
            debug!(operation = self.shared.name, id = %self.shared.id, %error, "finish transition rejected");
        }
    }
}

impl Drop for FinishGuard {
    fn drop(&mut self) {
        self.shared.abandon();
    }
}

/// Cloneable view of an operation that outlives the operation value itself.
#[derive(Clone, Debug)]
pub struct OperationHandle {
    shared: Arc<OperationShared>,
}

impl OperationHandle {
    pub fn id(&self) -> Uuid {
        self.shared.id
    }

    pub fn state(&self) -> OperationState {
        self.shared.state()
    }

    pub fn is_cancelled(&self) -> bool {
        self.shared.is_cancel_requested()
    }

    /// Cooperative: an in-flight request still completes, but its response is
    /// not interpreted. Returns `false` once the outcome has been decided, in
    /// which case nothing changes.
    pub fn cancel(&self) -> bool {
        self.shared.request_cancel()
    }

    pub fn is_finished(&self) -> bool {
        self.state() == OperationState::Finished
    }

    /// Resolves once the terminal callbacks have run, or once the operation
    /// was dropped without getting that far.
    pub async fn finished(&self) {
        let mut state = self.shared.state.subscribe();
        if state
            .wait_for(|state| *state == OperationState::Finished)
            .await
            .is_err()
        {
            debug!(operation = self.shared.name, id = %self.shared.id, "state channel closed before finish");
        }
    }
}

type ItemCallback<T> = Arc<dyn Fn(Result<T, OperationError>) + Send + Sync>;
type CompletionCallback<T> = Box<dyn FnOnce(Completion<T>) + Send>;
type FinishCallback = Box<dyn FnOnce(Option<OperationError>) + Send>;

/// Drives a [`RemoteOperation`] through one request and delivers its results.
///
/// Callbacks run on the configured [`CallbackQueue`] in this order: every
/// per-item result, then the typed completion, then the generic finish hook.
pub struct Operation<R: RemoteOperation> {
    remote: R,
    shared: Arc<OperationShared>,
    guard: FinishGuard,
    callback_queue: CallbackQueue,
    item_callback: Option<ItemCallback<R::Item>>,
    completion_callback: Option<CompletionCallback<R::Output>>,
    finish_callback: Option<FinishCallback>,
}

impl<R: RemoteOperation> Operation<R> {
    pub fn new(remote: R) -> Self {
        let shared = Arc::new(OperationShared::new(R::NAME));
        Self {
            remote,
            guard: FinishGuard {
                shared: shared.clone(),
            },
            shared,
            callback_queue: CallbackQueue::default(),
            item_callback: None,
            completion_callback: None,
            finish_callback: None,
        }
    }

    pub fn with_callback_queue(mut self, callback_queue: CallbackQueue) -> Self {
        self.callback_queue = callback_queue;
        self
    }

    pub fn on_item(
        mut self,
        callback: impl Fn(Result<R::Item, OperationError>) + Send + Sync + 'static,
    ) -> Self {
        self.item_callback = Some(Arc::new(callback));
        self
    }

    pub fn on_completion(
        mut self,
        callback: impl FnOnce(Completion<R::Output>) + Send + 'static,
    ) -> Self {
        self.completion_callback = Some(Box::new(callback));
        self
    }

    pub fn on_finish(mut self, callback: impl FnOnce(Option<OperationError>) + Send + 'static) -> Self {
        self.finish_callback = Some(Box::new(callback));
        self
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub fn id(&self) -> Uuid {
        self.shared.id
    }

    pub fn state(&self) -> OperationState {
        self.shared.state()
    }

    pub fn handle(&self) -> OperationHandle {
        OperationHandle {
            shared: self.shared.clone(),
        }
    }

    pub fn cancel(&self) -> bool {
        self.shared.request_cancel()
    }

    pub fn is_cancelled(&self) -> bool {
        self.shared.is_cancel_requested()
    }

    /// Sends the request and delivers the outcome. Consuming `self` makes a
    /// second execution impossible.
    pub async fn execute(self, transport: &dyn Transport, container: &ContainerConfig) {
        if !self.shared.begin() {
            debug!(operation = R::NAME, id = %self.shared.id, "cancelled before execution; no request sent");
            self.finish(Completion::Cancelled, Vec::new());
            return;
        }

        let request = TransportRequest::new(self.remote.endpoint(), self.remote.body(), container);
        debug!(
            operation = R::NAME,
            id = %self.shared.id,
            path = %request.endpoint.path,
            "performing request"
        );
        let response = transport.perform_request(request).await;

        if !self.shared.commit_outcome() {
            debug!(operation = R::NAME, id = %self.shared.id, "cancelled in flight; response ignored");
            self.finish(Completion::Cancelled, Vec::new());
            return;
        }

        let mut items = Vec::new();
        let completion = match response {
            Ok(document) => match self.remote.interpret(document, &mut items) {
                Ok(output) => Completion::Success(output),
                Err(error) => Completion::Failed(error),
            },
            Err(error) => Completion::Failed(OperationError::Transport(error)),
        };
        self.finish(completion, items);
    }

    fn finish(
        self,
        completion: Completion<R::Output>,
        items: Vec<Result<R::Item, OperationError>>,
    ) {
        let Operation {
            guard,
            callback_queue,
            item_callback,
            completion_callback,
            finish_callback,
            ..
        } = self;

        if let Some(callback) = item_callback {
            for item in items {
                let callback = callback.clone();
                callback_queue.dispatch(move || callback(item));
            }
        }

        let generic_error = completion.error().cloned();
        callback_queue.dispatch(move || {
            if let Some(callback) = completion_callback {
                callback(completion);
            }
            if let Some(callback) = finish_callback {
                callback(generic_error);
            }
            guard.complete();
        });
    }
}

impl<R: RemoteOperation + fmt::Debug> fmt::Debug for Operation<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("remote", &self.remote)
            .field("id", &self.shared.id)
            .field("state", &self.shared.state())
            .field("callback_queue", &self.callback_queue)
            .finish()
    }
}
