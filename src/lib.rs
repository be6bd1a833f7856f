pub mod config;
pub mod media;
pub mod paths;
pub mod qr;
pub mod services;

#[cfg(any(test, feature = "testing"))]
pub mod testing;
