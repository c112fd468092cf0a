mod common;
mod report;
mod weights;
