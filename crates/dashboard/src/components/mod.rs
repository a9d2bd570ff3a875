//! View models shared by page templates.

pub mod cards;
pub mod format;
pub mod page;

pub use cards::{CardBody, ChartCard, ChartKind, KpiCard, KpiPanel};
pub use page::{NavItem, PageContext};
