pub mod constants;
pub mod loader;
pub mod parser;
pub mod runtime;

pub use self::{
    loader::{load, LoadError, Program},
    parser::{parse, ListingError},
};
