//! # Ferry Node
//!
//! The runnable node on top of the ferrymesh routing core: transport
//! bindings (UDP or in-memory), the jittered beacon timer, and the
//! `tokio::select!` run loop tying them to a [`ferry_routing::SessionEngine`].
//!
//! ```no_run
//! use std::sync::Arc;
//! use bytes::Bytes;
//! use ferry_core::{DeliveryHandle, FerryConfig, NodeAddress};
//! use ferry_node::{FerryNode, UdpBinding};
//!
//! # async fn example() -> ferry_node::FerryResult<()> {
//! let local: NodeAddress = "10.0.0.7".parse().unwrap();
//! let broadcast: NodeAddress = "10.0.0.255".parse().unwrap();
//!
//! let (mut node, handle) =
//!     FerryNode::new(local, FerryConfig::default(), DeliveryHandle::noop());
//! node.attach(Arc::new(UdpBinding::bind(local, broadcast).await?));
//! tokio::spawn(node.run());
//!
//! handle.send(Bytes::from_static(b"hello"), "10.0.0.9".parse().unwrap())?;
//! # Ok(())
//! # }
//! ```

pub mod binding;
pub mod error;
pub mod node;

// Re-export main types
pub use binding::UdpBinding;
pub use error::{FerryError, FerryResult};
pub use node::{BindingId, FerryNode, NodeHandle};
