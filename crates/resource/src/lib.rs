//! Request coordination for the map client.
//!
//! Every request carries a logical identifier. When requests sharing an
//! identifier overlap in flight, only the most recently issued one may deliver
//! its data; earlier ones resolve to [`Outcome::Superseded`]. Nothing is
//! cancelled on the wire: stale results are detected and dropped when they
//! arrive.

pub mod breadcrumbs;
pub mod config;
pub mod coordinator;
pub mod metrics;
pub mod outcome;
pub mod protocol;
pub mod registry;
pub mod request;
pub mod reqwest_transport;
pub mod transport;

pub use breadcrumbs::*;
pub use config::*;
pub use coordinator::*;
pub use metrics::*;
pub use outcome::*;
pub use protocol::*;
pub use registry::*;
pub use request::*;
pub use reqwest_transport::ReqwestTransport;
pub use transport::*;
