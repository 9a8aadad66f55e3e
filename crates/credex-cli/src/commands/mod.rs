pub mod diff;
pub mod extract;
pub mod normalize;
