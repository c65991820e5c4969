pub mod probe;
pub mod serper;

pub use probe::HttpImageProbe;
pub use serper::SerperClient;
