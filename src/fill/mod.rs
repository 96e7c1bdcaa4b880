//! Building blocks the listing pipeline sequences.

pub mod dropdown;
pub mod guard;
pub mod modal;
pub mod upload;
pub mod value;
pub mod wait;

pub use dropdown::{DropdownResolver, MatchKind, Resolution};
pub use guard::InputBlockGuard;
pub use modal::ModalDismisser;
pub use upload::{AssetFetcher, AssetUploader, HttpFetcher, UploadReport};
pub use value::ValueSetter;
pub use wait::{await_condition, Element, ElementWaiter};
