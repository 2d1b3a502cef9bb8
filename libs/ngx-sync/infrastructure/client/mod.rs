pub mod fx;
pub mod listings;
pub mod oracle;

pub use fx::FxClient;
pub use listings::ListingsClient;
pub use oracle::{create_signer_provider, EthOracle, OracleApi, OracleError};
