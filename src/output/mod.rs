//! Output Formatter (spec §4.9, §6): the only two "external collaborator"
//! surfaces the system touches directly — everything upstream is core and
//! fully resolved before a single byte is written here.

pub mod categorize;
pub mod lua;
pub mod yaml;

pub use categorize::{categorize, Category};
