//! # CineVault Gateway
//!
//! Server-side gateway for the CineVault movie-rental and meme-minting
//! dapp. Three cooperating pieces:
//!
//! - **Contract gateway**: typed read/write operations against the
//!   CineVault contract, reached through a wallet-bridge JSON-RPC endpoint.
//! - **Media relay**: stateless pass-through pinning of files and JSON
//!   documents to Pinata, keeping the provider credential server-side.
//! - **Pricing and gating engine**: pure rental pricing, discount, access
//!   gating, and submission rules.
//!
//! ## Quick Start
//! ```bash
//! cargo run --bin cinevault-gateway
//! ```
//!
//! ## Endpoints
//! - `GET /health` - health check with bridge/failover metrics
//! - `POST /api/pinata/upload-file` - pin a file, returns a CID
//! - `POST /api/pinata/upload-json` - pin a JSON document, returns a CID
//! - `GET /api/movies`, `GET /api/movies/{id}` - catalog reads
//! - `GET /api/movies/{id}/quote`, `/access` - pricing and gating
//! - `POST /api/movies/{id}/rent`, `POST /api/movies`, `POST /api/memes` - writes
//! - `POST /api/admin/*` - owner-only contract operations (advisory guard)

pub mod config;
pub mod contract;
mod error;
pub mod gating;
mod handlers;
mod middleware;
pub mod pricing;
mod relay;
mod response;
mod router;
pub mod rpc;
mod state;
pub mod submission;
pub mod types;

pub use config::Config;
pub use error::Error;
pub use router::create as create_router;
pub use state::AppState;
