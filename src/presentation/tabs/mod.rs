pub mod bins;
pub mod debug;
pub mod sensor;
