//! The database-specific boundary the Schema Engine drives. Concrete
//! MySQL/Postgres dialects are out of scope; this trait is the interface a
//! real adapter implements (spec §1 "Out of scope").

use crate::error::BackyError;
use crate::job::ObjectCategory;

pub trait DatabaseAdapter: Send + Sync {
    fn engine_type(&self) -> &str;
    fn engine_version(&self) -> &str;

    /// Emit the statements for one enabled category, already ordered per
    /// spec §4.4 (data: primary key ascending within a table, tables
    /// ordered by FK topology; referenced before referencing).
    fn extract_category(&self, category: ObjectCategory) -> Result<Vec<String>, BackyError>;

    /// Execute a single statement. Implementations decide whether this
    /// runs inside the outer transaction the Schema Engine may have
    /// opened, per spec §4.4 "Execution happens within a single outer
    /// transaction where the engine supports DDL transactions."
    fn apply_statement(&mut self, statement: &str) -> Result<(), BackyError>;
}
