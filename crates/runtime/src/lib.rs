pub mod environment;
pub mod interpreter;
pub mod native_functions;
pub mod resolver;
pub mod values;

extern crate frontend;
extern crate tools;
