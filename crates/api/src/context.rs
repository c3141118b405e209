use vergeerp_core::UserId;

/// Acting user for a request, taken from the `X-User-Id` header.
///
/// Authentication happens upstream (gateway); the engine trusts the opaque
/// identity and only threads it into audit payloads. Absent header means a
/// system-initiated call.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ActorContext {
    user_id: Option<UserId>,
}

impl ActorContext {
    pub fn new(user_id: Option<UserId>) -> Self {
        Self { user_id }
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.user_id
    }
}
