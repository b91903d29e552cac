use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq, Hash)]
pub enum ManifestError {
    #[error("duplicate host import: {0}")]
    DuplicateImport(&'static str),
    #[error("duplicate guest export: {0}")]
    DuplicateExport(&'static str),
    #[error("guest export {0} collides with a host import name")]
    ExportShadowsImport(&'static str),
}
