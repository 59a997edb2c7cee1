//! Re-exports the driver traits so `use spi_fram::prelude::*;` brings their
//! methods into scope.

pub use crate::{BlockDevice, Read};
