//! # hearth-db: Database Layer and Sales Engine for Hearth
//!
//! SQLite storage for the bakery back office, and the engine that keeps
//! sales, stock and bank balances consistent with each other.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Hearth Data Flow                                 │
//! │                                                                         │
//! │  Caller (HTTP handler, CLI, job)                                       │
//! │       │  create_sale / update_sale / convert_quote / add_product_stock │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     hearth-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │ SalesEngine   │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │ (engine/)     │───►│ catalog stock │    │  (embedded)  │  │   │
//! │  │   │               │    │ cost sale     │    │              │  │   │
//! │  │   │ read, decide, │    │ ledger        │    │ 001_init.sql │  │   │
//! │  │   │ one tx write  │    └───────┬───────┘    └──────────────┘  │   │
//! │  │   └───────┬───────┘            │                                │   │
//! │  │           │ pure decisions     ▼                                │   │
//! │  │           ▼             Database (pool.rs)                      │   │
//! │  │      hearth-core                                                │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (WAL)                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database and engine error types
//! - [`repository`] - Repository implementations
//! - [`engine`] - Sale lifecycle operations
//! - [`config`] - TOML + environment configuration
//! - [`logging`] - Tracing subscriber setup
//!
//! ## Usage
//!
//! ```rust,ignore
//! use hearth_db::{Database, HearthConfig};
//!
//! let config = HearthConfig::load(None)?;
//! let db = Database::new(config.db_config()).await?;
//!
//! let outcome = db.engine().create_sale(config.tenant_id(), input).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{ConfigError, HearthConfig};
pub use engine::SalesEngine;
pub use error::{DbError, DbResult, EngineError, EngineResult};
pub use logging::init_tracing;
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::catalog::CatalogRepository;
pub use repository::cost::CostRepository;
pub use repository::ledger::LedgerRepository;
pub use repository::sale::SaleRepository;
pub use repository::stock::StockRepository;
