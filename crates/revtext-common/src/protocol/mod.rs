pub mod error;
pub mod message;

pub use error::{Result, RevtextError};
pub use message::{
    is_printable_ascii, Decoded, Message, HEADER_SIZE, MAX_PAYLOAD_SIZE, TAG_AGREE, TAG_ANSWER,
    TAG_INIT, TAG_REQUEST, TAG_SIZE,
};
