pub mod api;
pub mod calendar;
pub mod cards;
pub mod config;
pub mod model;
pub mod roster;
pub mod search;
pub mod session;
pub mod stats;
pub mod topics;
