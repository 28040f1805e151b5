pub mod client;
pub mod transport;

pub use client::{ClientConfig, ClientError, DEFAULT_ORIGIN, HttpClient};
pub use transport::{
    AuthParams, DeliveryCallback, DeliveryOutcome, DeliveryRequest, HttpTransport, Transport,
    encode_query,
};
