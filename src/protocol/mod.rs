// Wire format shared by the transport client and server.

pub mod message_types;
pub mod packet_parser;

pub use message_types::{
    ControlCommand, ControlMessage, DistanceEntry, DistanceVectorUpdate, WireMessage, DOWN_COMMAND,
};
pub use packet_parser::{
    add_length_prefix, decode, encode, read_frame, strip_length_prefix, write_frame, PacketParser,
    MAX_FRAME_LEN, PREFIX_LEN,
};
