// Command line interface module
// Thin terminal front end over the library, standing in for the host's
// controller layer.

pub mod password;
pub mod utils;
