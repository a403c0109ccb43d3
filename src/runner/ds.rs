//! Data structures of the managed environment: values, objects, isolates and
//! the contexts that run inside them.

pub mod array_object;
pub mod error;
pub mod execution_context;
pub mod function_object;
pub mod heap;
pub mod object;
pub mod operations;
pub mod value;
