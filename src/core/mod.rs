/// Core functionality modules
///
/// Collaborator interfaces the engine reads history through, plus the seed
/// importer that fills the bundled store.

pub mod importer;
pub mod sources;

pub use importer::{ImportReport, Importer, SeedFile};
pub use sources::{
    AttemptHistorySource, HistoryFilter, HistorySources, QuestionCatalog, SolvedHistorySource,
};
