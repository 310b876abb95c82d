pub mod hide;
pub mod unveil;

pub use unveil::Unveiled;
