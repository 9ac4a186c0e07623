//! Investor network intelligence core.
//!
//! Tracks a company's investors and their imported professional networks,
//! recommends new investor candidates from previously-imported contact
//! lists, and derives the analytics layered on top: the access map graph,
//! cross-investor overlap, relationship strength, behavior profiles,
//! negotiation patterns, scenario forecasts, and the monthly Network
//! Leverage Index.
//!
//! Everything runs synchronously against one request-scoped
//! [`db::NetworkDb`] handle. The HTTP surface, CSV import parsing, and
//! interactive graph UI live outside this crate and consume the documents
//! these engines produce.

pub mod access_map;
pub mod behavior;
pub mod db;
pub mod entity;
pub mod fit;
pub mod forecast;
mod migrations;
pub mod negotiation;
pub mod nli;
pub mod normalize;
pub mod overlap;
pub mod recommend;
pub mod strength;
