pub mod error;
mod ref_count;
pub mod shared_handle;

pub use error::{HandleError, Result};
pub(crate) use ref_count::RefCount;
pub use shared_handle::SharedHandle;
