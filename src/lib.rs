extern crate alloc;

pub mod config;
mod constructors;
pub mod controllers;
pub mod entities;
pub mod interactors;
pub mod presenters;
pub mod repositories;
pub mod seed;
pub mod usecases;
pub(crate) mod utils;

pub use constructors::*;
