pub mod class;
pub mod er;
pub mod flowchart;
pub mod sequence;
pub mod state;
