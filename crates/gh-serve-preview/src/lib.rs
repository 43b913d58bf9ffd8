//! gh-serve preview: find the page to open in a downloaded artifact and
//! serve the artifact over HTTP.

pub mod browser;
pub mod index;
pub mod server;

pub use browser::open_browser;
pub use index::{find_index, INDEX_SUFFIXES};
pub use server::{router, PreviewServer};
