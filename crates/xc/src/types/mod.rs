//! Built-in type model
//!
//! Type tags are the compiler's closed set of primitive kinds. Composite
//! types (structs, enums, functions, pointers) are described structurally by
//! the semantic layer and only carry a tag for classification.

mod type_tag;

pub use type_tag::{code_of_spelling, spelling_of_code, TypeTag, TypeTagError};
