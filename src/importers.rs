// ! Historical series loaders for the flow workbook and the monthly climate tables

pub mod flow_workbook;
pub mod monthly_csv;

// Re-export commonly used items
pub use flow_workbook::{FlowWorkbookImporter, WorkbookImportError};
pub use monthly_csv::{CsvImportError, MonthlyCsvImporter};
