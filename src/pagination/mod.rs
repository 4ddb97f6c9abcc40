//! Pagination module
//!
//! Supports: HATEOAS next links in the response body, or a single page
//!
//! # Overview
//!
//! A [`Pager`] looks at one response body and decides whether another page
//! exists. When it does, it returns a [`PageCursor`] carrying the query
//! parameters of the next request. The pager holds no state of its own; the
//! fetch loop owns the cursor between requests.

mod strategies;
mod types;

pub use strategies::{HateoasPager, NoPager};
pub use types::{PageCursor, Pager};
