pub mod applier;
pub mod runner;
pub mod source;
pub mod structure;

#[cfg(test)]
mod testing;

pub use applier::{KsqlApplier, MigrationApplier};
pub use runner::{FailedMigration, FailureStage, MigrationRunner, RunReport};
pub use source::{MigrationFile, list_migrations, read_migration};
pub use structure::{KsqlStructure, StructureInitializer};
