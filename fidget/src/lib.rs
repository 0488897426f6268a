//! The Fidget controller: keys in, command bytes out to the robot.

pub mod app;
pub mod config;
pub mod interrupt;
pub mod keymap;
