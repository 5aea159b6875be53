pub mod compiler;
pub mod executable;
pub mod value;

pub use compiler::compile;
pub use executable::{CompareOp, ExecutableExpr};
pub use value::{RuntimeObject, Value};
