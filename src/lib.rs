//! # Smart Search
//!
//! A small web backend exposing type-ahead search and record summarization
//! over an OpenSearch-compatible cluster.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────────┐   ┌─────────────────┐
//! │  Browser │──▶│ Axum handlers │──▶│ OpenSearch REST │
//! │  (HTML)  │   │ /search       │   │ alias + indices │
//! └──────────┘   │ /details ─────┼──▶│ ML predict API  │
//!                └───────────────┘   └─────────────────┘
//! ```
//!
//! `/search` translates a free-text query into a multi-match query against a
//! multi-index alias and flattens the hits into typed results. `/details`
//! fetches one record, enriches member records with their recent
//! communication events, and asks a cluster-hosted model for a
//! natural-language summary.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | Environment configuration and index classification |
//! | [`models`] | Core data types and hit mapping |
//! | [`backend`] | OpenSearch client (basic auth / SigV4) |
//! | [`summarize`] | ML summarization gateway |
//! | [`server`] | HTTP routes and handlers |

pub mod backend;
pub mod config;
pub mod models;
pub mod server;
pub mod summarize;
