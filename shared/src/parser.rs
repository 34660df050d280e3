//! Parsers for user supplied values on the command line and in the config file

pub mod duration;
