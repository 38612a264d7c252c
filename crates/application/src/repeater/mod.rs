//! Repeater tabs: state, dispatch and transfer.

mod dispatcher;
mod tab_store;
mod transfer;

pub use dispatcher::{ConfigPatch, RequestDispatcher, RequestEdit, SEND_FAILED};
pub use tab_store::{TABS_STATE_KEY, TabStore};
pub use transfer::{TABS_FILE_NAME, TabTransfer};
