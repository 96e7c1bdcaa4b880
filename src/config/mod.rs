pub mod draft;
pub mod params;
pub mod schema;
pub mod selectors;

pub use draft::{Condition, ConditionMapping, ListingDraft};
pub use params::{ParamDef, Params};
pub use schema::{BrowserConfig, Config, TargetConfig, Timings, Viewport};
pub use selectors::{DropdownSelectors, SelectorConfig};
