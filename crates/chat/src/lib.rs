//! Guildhall Chat Crate
//!
//! The real-time chat fan-out subsystem: resolving a chat request to a
//! canonical routing key, registering live connections against keys,
//! persisting messages, and pushing each persisted message to every live
//! subscriber of its key.
//!
//! Control flow for a submission: scope resolution (authorize + key) ->
//! durable persist -> per-key serialized fan-out -> best-effort delivered
//! flag. Connect/disconnect events mutate the registry independently of the
//! message path and interleave safely with dispatch.

pub mod dispatch;
pub mod events;
pub mod lifecycle;
pub mod membership;
pub mod registry;
pub mod scope;
pub mod service;

pub use dispatch::{DispatchGuard, FanoutDispatcher};
pub use events::{ClientEvent, MessageEvent, ServerEvent};
pub use lifecycle::ConnectionLifecycle;
pub use membership::{MembershipStore, SqliteMembershipStore};
pub use registry::{ConnectionHandle, ConnectionId, ConnectionRegistry, EventSender};
pub use scope::{RoutingKey, ScopeRequest, ScopeResolver};
pub use service::ChatService;

pub use guildhall_database::{ChatError, ChatResult, ScopeKind};
