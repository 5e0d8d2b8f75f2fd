mod room;
mod room_command;
mod room_error;
mod room_manager;

pub use room::*;
pub use room_command::*;
pub use room_error::*;
pub use room_manager::*;
