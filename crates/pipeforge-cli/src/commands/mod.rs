mod generate;
mod load;
mod observe;
mod provision;

pub use generate::{GenerateArgs, run_generate};
pub use load::{LoadDocumentsArgs, LoadKeyValuesArgs, run_load_documents, run_load_key_values};
pub use observe::{ObserveArgs, run_observe};
pub use provision::{ProvisionArgs, run_provision};
