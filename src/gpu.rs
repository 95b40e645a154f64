pub mod device;
pub mod software;
pub mod window;
