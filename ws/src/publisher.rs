use crate::connection::ConnectionId;
use crate::message::Envelope;

/// The only way request-handling code injects real-time events.
///
/// Publishing is fire and forget: it returns once the envelope has been handed
/// to the recipients' outbound queues and never reports per-recipient failures.
/// `exclude` keeps the event from being echoed back to the caller's own
/// connection; it is a convenience, not an access control.
pub trait Publisher: Send + Sync {
    fn publish(&self, envelope: Envelope, exclude: Option<&ConnectionId>);
}
