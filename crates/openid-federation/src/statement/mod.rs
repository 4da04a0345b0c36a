//! Entity statements: signed claim sets describing federation entities.
//!
//! A statement is either an entity's self-signed configuration
//! (`iss == sub`) or a subordinate statement issued by an authority about
//! one of its subordinates. Both share one type and one verification
//! pipeline; `is_self_signed` is the discriminant.

pub mod codec;
pub mod entity_statement;

pub use codec::{Decoded, JwsHeader};
pub use entity_statement::{EntityStatement, StatementClaims};
