//! # harvest-client: Storefront Client for Harvest Hub
//!
//! Everything the storefront needs between the UI and the backend: the
//! session cart, the checkout flow, and a dispatcher that can answer from
//! an in-process simulator when no backend is reachable.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Storefront Client                               │
//! │                                                                         │
//! │  ┌──────────────┐     ┌──────────────────────┐                          │
//! │  │  CartState   │◄────│ CheckoutOrchestrator │  COD / card state machine│
//! │  │  (session)   │     └──────────┬───────────┘                          │
//! │  └──────────────┘                │                                      │
//! │                                  ▼                                      │
//! │                       ┌──────────────────────┐   ┌──────────────────┐   │
//! │                       │      Dispatcher      │──►│ CredentialStore  │   │
//! │                       │ mock | live | live+fb│   └──────────────────┘   │
//! │                       └──────┬────────┬──────┘                          │
//! │                              │        │                                 │
//! │                              ▼        ▼                                 │
//! │                 ┌──────────────┐   ┌──────────────────────────────┐     │
//! │                 │HttpTransport │   │ MockBackend                  │     │
//! │                 │ (reqwest)    │   │ auth · catalog · payment ·   │     │
//! │                 └──────────────┘   │ maps, with simulated latency │     │
//! │                                    └──────────────────────────────┘     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`checkout`] - Checkout state machine and payment seams
//! - [`config`] - Client configuration (mode, base URL, mock knobs)
//! - [`credentials`] - Bearer token storage
//! - [`dispatcher`] - Typed API surface with mock fallback
//! - [`error`] - Client and checkout error types
//! - [`mock`] - In-process backend simulator
//! - [`session`] - Shared session cart
//! - [`transport`] - Request model and the HTTP transport

pub mod checkout;
pub mod config;
pub mod credentials;
pub mod dispatcher;
pub mod error;
pub mod mock;
pub mod session;
pub mod transport;

pub use checkout::{
    AutoConfirm, CheckoutOrchestrator, CheckoutOutcome, CheckoutState, GatewayOutcome,
    PaymentConfirmer, PaymentGateway, PaymentSummary,
};
pub use config::{ClientConfig, DispatchMode};
pub use credentials::{Credential, CredentialStore, InMemoryCredentialStore};
pub use dispatcher::Dispatcher;
pub use error::{CheckoutError, CheckoutResult, ClientError, ClientResult, TransportError};
pub use mock::{MockBackend, MockLatency};
pub use session::CartState;
pub use transport::{ApiRequest, HttpTransport, Method, Transport};
