//! # NDL Core
//!
//! Runtime-agnostic semantic core for the NDL data-description language.
//!
//! This crate provides:
//! - Core names: [`Fqon`], [`Namespace`], member identifiers
//! - The type lattice: [`BasicType`], [`DataType`]
//! - The polymorphic value model: [`Value`] with per-type operator tables
//! - Static object metadata: [`ObjectInfo`], [`MemberInfo`], [`MetaInfo`]
//! - Dynamic object state: [`ObjectState`], [`StateSnapshot`]
//! - C3 linearization of the inheritance graph
//!
//! ## Design Principles
//!
//! 1. **No I/O, no syntax knowledge**: text handling lives in `ndl-syntax`,
//!    the load pipeline in `ndl-db`
//! 2. **Immutable and shared**: infos, types, and states are `Arc`-shared
//!    values; mutation always produces a new state
//! 3. **Reference by name**: the object graph may cycle, so objects refer
//!    to each other by [`Fqon`], never by owning pointer

pub mod c3;
pub mod error;
pub mod fqon;
pub mod location;
pub mod meta_info;
pub mod object_info;
pub mod object_state;
pub mod op;
pub mod state;
pub mod types;
pub mod value;

pub use c3::{linearize, Linearization};
pub use error::{Error, Result};
pub use fqon::{Fqon, MemberId, Namespace};
pub use location::Location;
pub use meta_info::MetaInfo;
pub use object_info::{MemberInfo, ObjectInfo};
pub use object_state::{Member, ObjectState};
pub use op::Operator;
pub use state::StateSnapshot;
pub use types::{BasicType, ContainerKind, DataType, Primitive};
pub use value::Value;

/// Logical time within a view. Monotonically increasing, issued per view.
pub type OrderT = u64;

/// Query-time sentinel meaning "the view's current time".
pub const LATEST: OrderT = OrderT::MAX;

/// Commit time of the initial (load-produced) state.
pub const INITIAL_T: OrderT = 0;
