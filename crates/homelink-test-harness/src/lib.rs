//! homelink-test-harness: Test utilities, mock transports, bridges and
//! servers for homelink.
//!
//! - [`MockTransport`]: byte-level scripted [`Transport`](homelink_core::Transport)
//! - [`MockBridge`]: hex-level scripted [`Bridge`](homelink_core::Bridge),
//!   including scripted failures
//! - [`MockTcpServer`]: a stand-in serial-to-IP bridge on a local port
//! - [`MockHttpServer`]: scripted HTTP/1.1 responses for REST adapters

pub mod mock_bridge;
pub mod mock_http;
pub mod mock_tcp;
pub mod mock_transport;

pub use mock_bridge::MockBridge;
pub use mock_http::{MockHttpServer, RecordedRequest};
pub use mock_tcp::MockTcpServer;
pub use mock_transport::MockTransport;
