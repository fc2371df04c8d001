pub mod broadcast;
pub mod outbox;

pub use broadcast::{SquadBroadcaster, SquadReceiver, SquadSender};
pub use outbox::{run_dispatcher, spawn_dispatcher};
