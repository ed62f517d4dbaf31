pub mod outputs;
pub mod workload;

pub use outputs::*;
pub use workload::*;
