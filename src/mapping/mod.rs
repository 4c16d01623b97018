//! Mapping table: clib -> {C version -> [mapped versions]}.

mod remote;
mod table;

pub use remote::TableOrigin;
pub use table::{MappingEntries, MappingTable};
