//! Parameterized SQL builders for crudkit.
//!
//! `crudkit-query` turns a table name plus ordered column maps into MySQL
//! statements with `?` placeholders and a matching list of bound values.
//! Nothing here touches a connection; execution lives in the `crudkit`
//! crate.
//!
//! ```
//! use crudkit_query::{OnDuplicate, build_insert, params};
//!
//! let spec = build_insert(
//!     "users",
//!     &params! { "email" => "a@example.com", "name" => "Ann" },
//!     Some(OnDuplicate::Update),
//! )
//! .unwrap();
//! assert_eq!(spec.values().len(), 4);
//! ```

pub mod builder;
pub mod display;
pub mod params;

pub use builder::{
    OnDuplicate, QuerySpec, Select, build_delete, build_insert, build_select, build_update,
};
pub use display::{escape_for_display, render_for_display};
pub use params::Params;
