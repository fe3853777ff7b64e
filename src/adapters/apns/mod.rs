pub mod codec;
pub mod connection;

pub use connection::{TlsConnection, TlsConnectionFactory};
