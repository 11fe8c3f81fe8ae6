//! Server state shared across handlers.

use std::sync::Arc;

use crate::domain::{ConnectionRegistry, QueueRepository, SessionRepository};
use crate::usecase::{
    DisconnectUseCase, EndCallUseCase, JoinQueueUseCase, LeaveQueueUseCase, RelaySignalUseCase,
};

/// Shared application state
pub struct AppState {
    pub join_queue_usecase: Arc<JoinQueueUseCase>,
    pub leave_queue_usecase: Arc<LeaveQueueUseCase>,
    pub relay_signal_usecase: Arc<RelaySignalUseCase>,
    pub end_call_usecase: Arc<EndCallUseCase>,
    pub disconnect_usecase: Arc<DisconnectUseCase>,
    /// Bound directly by the WebSocket handler; everything else reads it
    /// through the use cases.
    pub connection_registry: Arc<dyn ConnectionRegistry>,
    /// Exposed for the debug endpoints.
    pub queue_repository: Arc<dyn QueueRepository>,
    pub session_repository: Arc<dyn SessionRepository>,
}
