//! FraudGuard API Library
//!
//! Submits SME transaction data to a hosted generative model and returns its
//! fraud/AML risk assessment, validated against a fixed contract and joined
//! back onto the submitted transactions.
//!
//! # Modules
//!
//! - `config`: Configuration management.
//! - `dashboard`: Read-only projection of an analysis for display.
//! - `errors`: Error handling types.
//! - `gateway`: Analysis round-trip and the `TextGenerator` seam.
//! - `gemini_client`: Gemini `generateContent` client.
//! - `handlers`: HTTP request handlers and router.
//! - `join`: Finding-to-transaction join.
//! - `models`: Input and output data models.
//! - `prompt`: System instruction and task prompt.
//! - `sample`: Default sample payload.
//! - `session`: Input/dashboard session state machine.
//! - `validator`: Two-tier contract validation.

pub mod config;
pub mod dashboard;
pub mod errors;
pub mod gateway;
pub mod gemini_client;
pub mod handlers;
pub mod join;
pub mod models;
pub mod prompt;
pub mod sample;
pub mod session;
pub mod validator;
