pub mod protocol;
pub mod turn;

pub use protocol::{ResetAck, TurnOutcome, TurnResponse};
pub use turn::{ConversationBackend, TurnClient, CSRF_HEADER};
