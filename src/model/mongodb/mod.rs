mod bson;
mod collection;

pub use bson::Id;
pub use collection::{ensure_indexes_exist, is_duplicate_key_error, Coll, MongoCollection};
