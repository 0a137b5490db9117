pub mod audit;
pub mod management;
pub mod session;
