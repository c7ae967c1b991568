pub mod columns;
pub mod normalize;
pub mod values;
