//! # NDL DB
//!
//! The embedding layer of the NDL data-description language: load `.ndl`
//! files into an immutable [`Database`], then query and patch object
//! member values through time-indexed, forkable [`View`]s.
//!
//! ## Design Principles
//!
//! 1. **Blocking load, one I/O seam**: the loader only touches the
//!    outside world through the supplied [`FileFetcher`]
//! 2. **Immutable states, explicit time**: every mutation commits a new
//!    state at a fresh logical time; queries at earlier times are
//!    unaffected
//! 3. **Atomic patches**: a rejected patch leaves its view unchanged
//!
//! ## Example
//!
//! ```
//! use ndl_db::{Database, MemoryFetcher};
//! use ndl_core::LATEST;
//!
//! let fetcher = MemoryFetcher::new().with_file(
//!     "game.ndl",
//!     "Unit():\n    hp : int = 10\nKnight(Unit):\n    hp = 20\n",
//! );
//!
//! let database = Database::load("game.ndl", &fetcher).unwrap();
//! let view = database.new_view();
//! let knight = view.get("game.Knight").unwrap();
//! assert_eq!(knight.get_int("hp", LATEST).unwrap(), 20);
//! ```

pub mod database;
pub mod error;
pub mod fetcher;
pub mod namespace;
pub mod notifier;
pub mod object;
mod patch;
pub mod view;

pub use database::Database;
pub use error::{DbError, Result};
pub use fetcher::{DirFetcher, FileFetcher, MemoryFetcher};
pub use namespace::NamespaceFinder;
pub use notifier::{NotifierHandle, UpdateCallback};
pub use object::Object;
pub use view::View;

// Re-export the core types a consumer needs to talk to the API.
pub use ndl_core::{DataType, Fqon, Operator, OrderT, Value, LATEST};
