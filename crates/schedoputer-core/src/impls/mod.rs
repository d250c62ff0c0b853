//! Implementations - ports の具体実装

pub mod echo_resource;
pub mod http_resource;
pub mod inmem_store;

pub use self::echo_resource::EchoResourceInvoker;
pub use self::http_resource::HttpResourceInvoker;
pub use self::inmem_store::InMemoryJobStore;
