//! Resolution passes run by the deferred work queue.

mod collection;
mod foreign_key;
mod key;
mod one_to_one;
mod query;
mod secondary_table;
mod simple_type;

pub use collection::{CollectionFlavor, CollectionPass};
pub use foreign_key::{ForeignKeyPass, ForeignKeyTarget};
pub use key::KeyPass;
pub use one_to_one::InverseOneToOnePass;
pub use query::QueryMappingPass;
pub use secondary_table::SecondaryTablePass;
pub use simple_type::SimpleTypePass;
