//! # Content Catalog
//!
//! A catalog of tutorials and help topics built from a tree of YAML files,
//! with best-match lookup and per-account favorites.
//!
//! Every sync rebuilds the catalog from the source tree. Favorites are
//! snapshotted before the rebuild and restored afterwards when their target
//! still exists. Lookups score each item by exact, substring, and
//! per-word edit-distance matches and return the single best one.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌──────────┐
//! │ Source tree │──▶│  Reconciler  │──▶│  Store   │
//! │  (scanner)  │   │ tags/favs    │   │ (SQLite) │
//! └─────────────┘   └──────────────┘   └────┬─────┘
//!                                           │
//!                        ┌──────────────────┤
//!                        ▼                  ▼
//!                  ┌──────────┐      ┌─────────────┐
//!                  │   CLI    │      │ ToolRegistry│
//!                  │(catalog) │      │find_content │
//!                  └──────────┘      └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! catalog init                                   # create database
//! catalog sync                                   # rebuild from ./docs
//! catalog find --display-name "Create RHEL images"
//! catalog favorite set acct-1 rhel-images
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`error`] | Operation, per-item, and systemic errors |
//! | [`scanner`] | Descriptor discovery in the source tree |
//! | [`reconcile`] | Five-phase catalog rebuild |
//! | [`tags`] | Tag lookup/creation and item links |
//! | [`edit_distance`] | Levenshtein distance |
//! | [`matcher`] | Scoring tiers and match expressions |
//! | [`search`] | Best-match lookup with pattern fallback |
//! | [`favorites`] | Per-account favorites |
//! | [`tools`] | Tool trait and registry |
//! | [`store`] | Storage abstraction with SQLite and in-memory backends |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod config;
pub mod db;
pub mod edit_distance;
pub mod error;
pub mod favorites;
pub mod matcher;
pub mod migrate;
pub mod models;
pub mod reconcile;
pub mod scanner;
pub mod search;
pub mod store;
pub mod tags;
pub mod tools;
