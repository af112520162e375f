//! Screen capture: selection geometry and monitor grabbing.

pub mod region;
pub mod screenshot;

pub use region::{DragPoint, Region};
pub use screenshot::{capture_region_png, CapturedRegion, MonitorPoint};
