pub mod command;

pub use command::{decode, decode_frame, ENTER_TOKENS, MOVE_DOWN_TOKENS, MOVE_UP_TOKENS};
