// sales2parquet-catalog - Where raw sales records live and how to read them
//
// A catalog maps logical (database, table) names to a storage location and
// a file format. `CatalogSource` implements the core `SalesSource` trait on
// top of an OpenDAL operator rooted at the table's bucket.

pub mod catalog;
pub mod decode;
pub mod error;
pub mod source;

pub use catalog::{parse_location, Catalog, Location, ResolvedTable};
pub use error::{CatalogError, Result};
pub use source::CatalogSource;
