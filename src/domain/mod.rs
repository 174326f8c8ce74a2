//! Domain types
pub mod cart;
pub mod product;
pub mod value_objects;

pub use cart::{CartLine, ManifestItem};
pub use product::{Category, Product};
pub use value_objects::{Money, Quantity};
