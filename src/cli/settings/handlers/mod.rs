//! Setting handlers for different configuration patterns.

pub mod boolean;
pub mod simple;
pub mod string;

pub use boolean::*;
pub use simple::*;
pub use string::*;
