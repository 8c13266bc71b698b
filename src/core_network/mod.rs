pub mod ascii;
pub mod datachannel;
pub mod error;
pub mod network;
pub mod pasv;
pub mod port;

pub use datachannel::{transfer, DataChannel, DataConnection, Payload};
pub use error::DataChannelError;
pub use pasv::{PassiveListener, PassivePortPool, PortLease};
pub use port::PendingConnect;
