//! Kernel constants and small value types shared by the object model.

pub mod addr;
pub mod link;
pub mod route;
