pub mod operation_builder;
pub mod problem;

pub use operation_builder::{
    ensure_schema, state, Missing, OpenApiRegistry, OperationBuilder, OperationSpec,
    ParamLocation, ParamSpec, Present, RequestBodySpec, ResponseSpec,
};
