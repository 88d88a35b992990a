mod class;
mod er;
mod sequence;
mod state;
